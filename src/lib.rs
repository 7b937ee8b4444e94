// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod config;
pub mod dedup;
pub mod engine;
pub mod error;
pub mod extract;
pub mod ingest;
pub mod metrics;
pub mod output;
pub mod papers;
pub mod posting;
pub mod rank;
pub mod relevance;
pub mod scoring;
pub mod state;

// ---- Re-exports for stable public API ----
pub use crate::config::{Profile, RunConfig};
pub use crate::engine::{Pipeline, PipelineStats};
pub use crate::error::OutputError;
pub use crate::output::Snapshot;
pub use crate::posting::{FundingStatus, Posting};

use ::metrics::gauge;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use tracing::info;

use crate::ingest::providers::{build_providers, http_client};
use crate::ingest::registry::{default_registry, resolve_all};
use crate::ingest::types::SourceProvider;
use crate::papers::{DisabledLookup, PaperLookup, SemanticScholar};

/// What one pass did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub stats: PipelineStats,
    /// Unique postings published.
    pub kept: usize,
    pub new: usize,
    pub window: usize,
    /// True when nothing was new and the window shows the top of the full list.
    pub window_fallback: bool,
    pub by_source: BTreeMap<String, usize>,
    pub snapshot_path: PathBuf,
}

/// HTTP providers for the built-in registry, mirrors taken from `cfg`.
pub fn default_providers(cfg: &RunConfig, profile: &Profile) -> Vec<Box<dyn SourceProvider>> {
    let sources = resolve_all(&default_registry(), &cfg.mirrors);
    let client = http_client(cfg.fetch_timeout);
    build_providers(&sources, &client, &profile.listing_terms)
}

/// Paper lookup selected by `cfg`.
pub fn paper_lookup(cfg: &RunConfig) -> Box<dyn PaperLookup> {
    if cfg.papers_enabled {
        Box::new(SemanticScholar::new(&cfg.papers_api, cfg.enrich_timeout))
    } else {
        Box::new(DisabledLookup)
    }
}

/// Execute one aggregation pass and replace the snapshot.
///
/// Fetch, prior-state and enrichment failures are absorbed; only a failure to
/// persist the new snapshot is returned.
pub async fn run_pass(
    cfg: &RunConfig,
    pipeline: &Pipeline<'_>,
    providers: &[Box<dyn SourceProvider>],
    lookup: &dyn PaperLookup,
    now: DateTime<Utc>,
) -> Result<RunReport, OutputError> {
    let outcomes = ingest::run_once(providers, cfg.fetch_concurrency).await;
    let (mut postings, stats) = pipeline.build_postings(&outcomes, now.date_naive());

    let prior = state::prior_ids_or_empty(&cfg.snapshot_path);
    state::mark_novelty(&mut postings, &prior);
    rank::rank(&mut postings);

    let mut window = rank::top_window(&postings, cfg.top_n);
    let new = postings.iter().filter(|p| p.is_new).count();
    let window_fallback = new == 0 && !window.is_empty();

    papers::enrich(&mut window, lookup).await;
    let found: HashMap<&str, &Vec<posting::Paper>> = window
        .iter()
        .filter(|p| !p.papers.is_empty())
        .map(|p| (p.id.as_str(), &p.papers))
        .collect();
    for p in postings.iter_mut() {
        if let Some(papers) = found.get(p.id.as_str()) {
            p.papers = (*papers).clone();
        }
    }

    let snapshot = output::assemble(&postings, window, cfg.max_items, now);
    output::persist(&cfg.snapshot_path, &snapshot)?;
    gauge!("radar_last_run_ts").set(now.timestamp() as f64);

    let report = RunReport {
        stats,
        kept: postings.len(),
        new,
        window: snapshot.top10_new_or_updated.len(),
        window_fallback,
        by_source: snapshot.by_source.clone(),
        snapshot_path: cfg.snapshot_path.clone(),
    };
    info!(
        kept = report.kept,
        new = report.new,
        window = report.window,
        fallback = report.window_fallback,
        path = %report.snapshot_path.display(),
        "snapshot written"
    );
    Ok(report)
}
