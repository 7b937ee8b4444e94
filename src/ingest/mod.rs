// src/ingest/mod.rs
pub mod providers;
pub mod registry;
pub mod types;

use crate::ingest::types::{FetchOutcome, SourceProvider};
use futures::stream::{self, StreamExt};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::OnceCell;
use regex::Regex;

/// Descriptions longer than this are cut (chars).
pub const MAX_TEXT_CHARS: usize = 4000;

/// One-time metrics registration (so series show up in the exposition).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("radar_fetch_attempts_total", "Fetch attempts, one per resolved URL.");
        describe_counter!(
            "radar_fetch_errors_total",
            "Fetch attempts that failed (network, status, parse, timeout)."
        );
        describe_counter!("radar_records_total", "Raw records produced by providers.");
        describe_counter!(
            "radar_gate_dropped_total",
            "Records dropped by the two-family relevance gate."
        );
        describe_counter!(
            "radar_dedup_dropped_total",
            "Postings dropped as duplicates within a run."
        );
        describe_counter!("radar_enrich_errors_total", "Failed paper lookups.");
        describe_histogram!("radar_parse_ms", "Feed parse time in milliseconds.");
        describe_gauge!("radar_last_run_ts", "Unix ts when the last pass finished.");
    });
}

/// Normalize text: decode entities, strip tags, fold quotes, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags (a space keeps words of adjacent blocks apart)
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[a-z!][^>]*>").unwrap());
    out = re_tags.replace_all(&out, " ").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();
    out = out.trim().to_string();

    // 5) Length cap
    if out.chars().count() > MAX_TEXT_CHARS {
        out = out.chars().take(MAX_TEXT_CHARS).collect();
    }

    out
}

/// Fetch every provider once, at most `concurrency` at a time.
///
/// Outcomes come back in provider order regardless of completion order, and
/// a failing provider never affects the others.
pub async fn run_once(
    providers: &[Box<dyn SourceProvider>],
    concurrency: usize,
) -> Vec<FetchOutcome> {
    ensure_metrics_described();

    stream::iter(providers.iter())
        .map(|p| async move {
            counter!("radar_fetch_attempts_total").increment(1);
            let source = p.meta().clone();
            let url = p.url().to_string();
            match p.fetch_latest().await {
                Ok(records) => {
                    tracing::debug!(source = %source.name, %url, count = records.len(), "fetched");
                    FetchOutcome::Fetched {
                        source,
                        url,
                        records,
                    }
                }
                Err(error) => {
                    tracing::warn!(source = %source.name, %url, %error, "source fetch failed");
                    counter!("radar_fetch_errors_total").increment(1);
                    FetchOutcome::Failed { source, url, error }
                }
            }
        })
        .buffered(concurrency.max(1))
        .collect()
        .await
}
