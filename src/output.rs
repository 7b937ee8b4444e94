// src/output.rs
//! Snapshot assembly: the single document a pass publishes and the next pass
//! reads back as its prior state.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::OutputError;
use crate::posting::Posting;
use crate::state::write_atomic;

pub const CSV_HEADER: [&str; 10] = [
    "University",
    "Lab/School",
    "Supervisor(s)",
    "Topic keywords",
    "Location",
    "Funding/Stipend",
    "Eligibility",
    "Deadline",
    "Link",
    "Source",
];

/// Keywords listed per CSV row.
const CSV_MAX_KEYWORDS: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// RFC 3339, UTC offset included.
    pub generated_at: String,
    /// Ranked postings before the `items` cap.
    pub total_items: usize,
    pub by_source: BTreeMap<String, usize>,
    pub top10_new_or_updated: Vec<Posting>,
    pub csv_block: String,
    pub items: Vec<Posting>,
    /// Every published id, including those cut by the cap.
    pub all_ids: Vec<String>,
}

fn quote(cell: &str) -> String {
    format!("\"{}\"", cell.replace('"', "\"\""))
}

fn csv_line<S: AsRef<str>>(cells: &[S]) -> String {
    cells
        .iter()
        .map(|c| quote(c.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Header row plus one row per posting; every cell quoted.
pub fn csv_block(rows: &[Posting]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(csv_line(&CSV_HEADER));
    for p in rows {
        let keywords = p
            .keywords
            .iter()
            .take(CSV_MAX_KEYWORDS)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("; ");
        lines.push(csv_line(&[
            p.university.as_str(),
            p.lab.as_str(),
            p.supervisor.as_str(),
            keywords.as_str(),
            p.location.as_str(),
            p.funding.label(),
            p.eligibility.as_str(),
            p.deadline.as_str(),
            p.link.as_str(),
            p.source.as_str(),
        ]));
    }
    lines.join("\n")
}

pub fn source_histogram(postings: &[Posting]) -> BTreeMap<String, usize> {
    let mut out = BTreeMap::new();
    for p in postings {
        *out.entry(p.source.clone()).or_insert(0) += 1;
    }
    out
}

/// Build the snapshot from the ranked collection and its top window.
/// `max_items` caps `items` only; counts and the id ledger cover everything.
pub fn assemble(
    ranked: &[Posting],
    window: Vec<Posting>,
    max_items: Option<usize>,
    generated_at: DateTime<Utc>,
) -> Snapshot {
    let mut all_ids: Vec<String> = ranked.iter().map(|p| p.id.clone()).collect();
    all_ids.sort();
    all_ids.dedup();

    let cap = max_items.unwrap_or(ranked.len()).min(ranked.len());
    Snapshot {
        generated_at: generated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        total_items: ranked.len(),
        by_source: source_histogram(ranked),
        csv_block: csv_block(&window),
        top10_new_or_updated: window,
        items: ranked[..cap].to_vec(),
        all_ids,
    }
}

/// Serialize and atomically replace the snapshot at `path`.
pub fn persist(path: &Path, snapshot: &Snapshot) -> Result<(), OutputError> {
    let body = serde_json::to_vec_pretty(snapshot)?;
    write_atomic(path, &body)
}
