// src/engine.rs
//! # Posting Pipeline
//! Pure, testable core of a pass: fetch outcomes → gated, extracted, scored
//! and deduplicated postings. No I/O, so the same outcomes always yield the
//! same postings in the same order.
//!
//! Order: relevance gate on the raw record, then field extraction, scoring,
//! and finally first-seen deduplication in provider/record order.

use anyhow::Result;
use chrono::NaiveDate;
use metrics::counter;

use crate::config::Profile;
use crate::dedup::dedup_first_seen;
use crate::extract::Extractor;
use crate::ingest::types::FetchOutcome;
use crate::posting::Posting;
use crate::relevance::RelevanceGate;
use crate::scoring::score;

/// Counters of one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub sources_ok: usize,
    pub sources_failed: usize,
    pub records: usize,
    pub gated_out: usize,
    pub duplicates: usize,
}

/// Compiled gate + extractor for one profile.
#[derive(Debug)]
pub struct Pipeline<'p> {
    profile: &'p Profile,
    gate: RelevanceGate,
    extractor: Extractor<'p>,
}

impl<'p> Pipeline<'p> {
    pub fn new(profile: &'p Profile) -> Result<Self> {
        Ok(Self {
            profile,
            gate: RelevanceGate::from_profile(profile)?,
            extractor: Extractor::new(profile)?,
        })
    }

    /// Turn fetch outcomes into unique, scored postings (not yet ranked).
    pub fn build_postings(
        &self,
        outcomes: &[FetchOutcome],
        today: NaiveDate,
    ) -> (Vec<Posting>, PipelineStats) {
        let mut stats = PipelineStats::default();
        let mut postings = Vec::new();

        for outcome in outcomes {
            if outcome.is_failure() {
                stats.sources_failed += 1;
                continue;
            }
            stats.sources_ok += 1;
            let meta = outcome.source();
            for raw in outcome.records() {
                stats.records += 1;
                if !self.gate.admits(&raw.title, &raw.description) {
                    stats.gated_out += 1;
                    continue;
                }
                let mut p = self.extractor.extract(raw, meta);
                p.score = score(&p, self.profile, today);
                postings.push(p);
            }
        }
        counter!("radar_gate_dropped_total").increment(stats.gated_out as u64);

        let before = postings.len();
        let postings = dedup_first_seen(postings);
        stats.duplicates = before - postings.len();

        tracing::info!(
            sources_ok = stats.sources_ok,
            sources_failed = stats.sources_failed,
            records = stats.records,
            gated_out = stats.gated_out,
            duplicates = stats.duplicates,
            kept = postings.len(),
            "pipeline finished"
        );
        (postings, stats)
    }
}
