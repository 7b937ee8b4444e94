// src/dedup.rs
//! Stable posting identity and in-run deduplication.

use metrics::counter;
use sha2::{Digest, Sha256};
use std::collections::HashSet;

use crate::posting::Posting;

/// Hex chars kept from the sha256 digest.
pub const ID_HEX_LEN: usize = 32;

/// Identity key: the link when present, else the title.
pub fn canonical_key<'a>(link: &'a str, title: &'a str) -> &'a str {
    let link = link.trim();
    if link.is_empty() {
        title.trim()
    } else {
        link
    }
}

/// Deterministic id of a posting: truncated sha256 hex of its canonical key.
pub fn posting_id(link: &str, title: &str) -> String {
    let digest = Sha256::digest(canonical_key(link, title).as_bytes());
    let mut out = String::with_capacity(ID_HEX_LEN);
    for b in digest.iter().take(ID_HEX_LEN / 2) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{b:02x}");
    }
    out
}

/// Keep the first posting of every id, in input order.
pub fn dedup_first_seen(postings: Vec<Posting>) -> Vec<Posting> {
    let mut seen = HashSet::with_capacity(postings.len());
    let before = postings.len();
    let out: Vec<Posting> = postings
        .into_iter()
        .filter(|p| seen.insert(p.id.clone()))
        .collect();
    let dropped = before - out.len();
    if dropped > 0 {
        counter!("radar_dedup_dropped_total").increment(dropped as u64);
        tracing::debug!(dropped, "duplicate postings removed");
    }
    out
}
