//! phd-radar: one aggregation pass, then exit.
//!
//! Fetches every registered source, keeps health-HCI postings, writes the
//! snapshot (and a Prometheus exposition dump next to it). Exits non-zero
//! only when the profile is unusable or the snapshot cannot be written.

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use phd_radar::config::{load_profile_default, RunConfig};
use phd_radar::metrics::Metrics;
use phd_radar::{default_providers, paper_lookup, run_pass, Pipeline};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = RunConfig::from_env();
    let profile = load_profile_default().context("loading interest profile")?;
    let pipeline = Pipeline::new(&profile).context("compiling profile terms")?;
    let metrics = Metrics::init();

    let providers = default_providers(&cfg, &profile);
    let lookup = paper_lookup(&cfg);
    tracing::info!(
        fetches = providers.len(),
        papers = lookup.name(),
        snapshot = %cfg.snapshot_path.display(),
        "starting pass"
    );

    let report = run_pass(&cfg, &pipeline, &providers, lookup.as_ref(), chrono::Utc::now())
        .await
        .context("writing snapshot")?;

    if let Some(m) = metrics {
        match m.write_next_to(&cfg.snapshot_path) {
            Ok(path) => tracing::debug!(path = %path.display(), "metrics exposition written"),
            Err(error) => tracing::warn!(%error, "metrics exposition not written"),
        }
    }

    for (source, count) in &report.by_source {
        tracing::info!(%source, count, "postings by source");
    }
    tracing::info!(
        sources_failed = report.stats.sources_failed,
        kept = report.kept,
        new = report.new,
        "pass complete"
    );
    Ok(())
}
