// src/scoring.rs
//! Additive, deterministic posting score. Every term is non-negative.

use chrono::NaiveDate;

use crate::config::Profile;
use crate::posting::{FundingStatus, Posting};

fn count_keywords(profile: &Profile, text: &str) -> u32 {
    let lower = text.to_lowercase();
    profile
        .profile_keywords
        .iter()
        .filter(|k| lower.contains(&k.to_lowercase()))
        .count() as u32
}

/// Preferred-region entries named in the location field.
fn count_regions(profile: &Profile, location: &str) -> u32 {
    location
        .split(',')
        .map(str::trim)
        .filter(|part| {
            profile
                .preferred_regions
                .iter()
                .any(|r| r.eq_ignore_ascii_case(part))
        })
        .count() as u32
}

fn deadline_within(deadline: &str, today: NaiveDate, days: i64) -> bool {
    NaiveDate::parse_from_str(deadline, "%Y-%m-%d")
        .map(|d| (0..=days).contains(&(d - today).num_days()))
        .unwrap_or(false)
}

/// Score `p` under `profile`. `today` only matters when the deadline bonus
/// is enabled.
pub fn score(p: &Posting, profile: &Profile, today: NaiveDate) -> u32 {
    let w = &profile.weights;
    let mut total = if p.social {
        w.base_social
    } else {
        w.base_academic
    };

    total = total
        .saturating_add(w.title_keyword.saturating_mul(count_keywords(profile, &p.title)))
        .saturating_add(
            w.description_keyword
                .saturating_mul(count_keywords(profile, &p.description)),
        )
        .saturating_add(w.region.saturating_mul(count_regions(profile, &p.location)));

    if p.funding == FundingStatus::Funded {
        total = total.saturating_add(w.funded);
    }
    if profile.is_top_tier(&p.university) {
        total = total.saturating_add(w.top_tier);
    }
    if w.deadline_soon > 0 && deadline_within(&p.deadline, today, w.deadline_window_days) {
        total = total.saturating_add(w.deadline_soon);
    }
    total
}
