// src/rank.rs
use crate::posting::Posting;

/// Window size of the "new or updated" view.
pub const TOP_N: usize = 10;

/// Stable sort: funded postings first, then by score (both descending).
/// Remaining ties keep ingestion order.
pub fn rank(postings: &mut [Posting]) {
    postings.sort_by(|a, b| {
        b.funding
            .funded_rank()
            .cmp(&a.funding.funded_rank())
            .then_with(|| b.score.cmp(&a.score))
    });
}

/// First `n` new postings of an already ranked list; when nothing is new,
/// the first `n` of the full list instead.
pub fn top_window(ranked: &[Posting], n: usize) -> Vec<Posting> {
    let fresh: Vec<Posting> = ranked.iter().filter(|p| p.is_new).take(n).cloned().collect();
    if fresh.is_empty() {
        ranked.iter().take(n).cloned().collect()
    } else {
        fresh
    }
}
