// src/config/profile.rs
//! Interest profile: every keyword list, allow-list, region table and score
//! weight the extractor, relevance gate and scorer read.
//!
//! Loaded once per run and passed around by reference. File formats are TOML
//! or JSON; fields missing from a file keep their built-in value.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_PROFILE_PATH: &str = "RADAR_PROFILE_PATH";

/// Additive score weights. All values are non-negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub base_academic: u32,
    pub base_social: u32,
    pub title_keyword: u32,
    pub description_keyword: u32,
    pub region: u32,
    pub funded: u32,
    pub top_tier: u32,
    /// Bonus when the deadline falls within `deadline_window_days` of today.
    /// Zero disables the rule.
    pub deadline_soon: u32,
    pub deadline_window_days: i64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            base_academic: 20,
            base_social: 10,
            title_keyword: 10,
            description_keyword: 8,
            region: 5,
            funded: 15,
            top_tier: 5,
            deadline_soon: 0,
            deadline_window_days: 30,
        }
    }
}

/// Eligibility hint: `label` applies when any of `terms` occurs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityRule {
    pub label: String,
    pub terms: Vec<String>,
}

impl EligibilityRule {
    fn new(label: &str, terms: &[&str]) -> Self {
        Self {
            label: label.to_string(),
            terms: strings(terms),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    /// Interest topics matched against postings and counted by the scorer.
    pub profile_keywords: Vec<String>,
    /// Health/medical family of the relevance gate.
    pub health_terms: Vec<String>,
    /// HCI/interaction/UX family of the relevance gate.
    pub hci_terms: Vec<String>,
    /// An html-list anchor must contain one of these to become a record.
    pub listing_terms: Vec<String>,
    pub funded_terms: Vec<String>,
    pub self_funded_terms: Vec<String>,
    /// Source names whose listings are mostly funded.
    pub funded_portals: Vec<String>,
    pub collab_terms: Vec<String>,
    /// Ordered institution allow-list, first match wins.
    pub universities: Vec<String>,
    pub top_tier_universities: Vec<String>,
    pub preferred_regions: Vec<String>,
    pub deadline_labels: Vec<String>,
    pub eligibility_rules: Vec<EligibilityRule>,
    pub weights: ScoreWeights,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Profile {
    /// Built-in health-HCI profile.
    pub fn default_seed() -> Self {
        Self {
            profile_keywords: strings(&[
                "health hci",
                "digital health",
                "medical ux",
                "clinical ux",
                "patient experience",
                "patient engagement",
                "health communication",
                "doctor patient communication",
                "health informatics",
                "behavioral health",
                "self management",
                "care pathway",
                "information design",
                "communication design",
                "information visualization",
                "data storytelling",
                "assistive",
                "human-centered ai",
                "human ai collaboration",
                "explainable ai",
                "ai chatbot",
                "conversational agent",
                "ai for health",
                "clinical",
                "hospital",
            ]),
            health_terms: strings(&[
                "health",
                "digital health",
                "medical",
                "medicine",
                "patient",
                "patients",
                "clinical",
                "clinic",
                "care",
                "healthcare",
                "assistive",
                "hospital",
                "wellbeing",
            ]),
            hci_terms: strings(&[
                "hci",
                "human-computer interaction",
                "human computer interaction",
                "ux",
                "user experience",
                "usability",
                "human-centred",
                "human-centered",
                "interaction design",
                "human-ai",
                "chatbot",
                "conversational agent",
                "user interface",
            ]),
            listing_terms: strings(&["phd", "studentship", "doctoral"]),
            funded_terms: strings(&[
                "funded",
                "fully funded",
                "full funding",
                "studentship",
                "stipend",
                "scholarship",
                "tuition waiver",
                "tuition fee offset",
            ]),
            self_funded_terms: strings(&["self-funded", "self funded"]),
            funded_portals: strings(&[
                "FindAPhD",
                "jobs.ac.uk",
                "PhDpositions.dk",
                "Academic Transfer",
                "Jobbnorge",
            ]),
            collab_terms: strings(&[
                "hospital",
                "clinic",
                "nhs",
                "health service",
                "medical center",
                "clinical partner",
                "industry partner",
                "industry collaboration",
                "industry",
                "company",
                "partner",
                "collaboration",
                "institute",
            ]),
            universities: strings(&[
                "ETH Zurich",
                "ETH Zürich",
                "EPFL",
                "University of Zurich",
                "UZH",
                "University of Melbourne",
                "Monash University",
                "UNSW",
                "TU Delft",
                "KTH",
                "Aalto University",
                "DTU",
                "UCL",
                "University College Dublin",
                "UCD",
                "Cardiff University",
                "TUM",
                "RWTH Aachen",
            ]),
            top_tier_universities: strings(&[
                "ETH Zurich",
                "ETH Zürich",
                "EPFL",
                "University of Melbourne",
                "UCL",
                "TU Delft",
                "KTH",
            ]),
            preferred_regions: strings(&[
                "Australia",
                "Switzerland",
                "Netherlands",
                "Finland",
                "Sweden",
                "Norway",
                "Denmark",
                "Austria",
                "Germany",
                "UK",
                "Ireland",
                "France",
                "Italy",
                "Spain",
            ]),
            deadline_labels: strings(&[
                "application deadline",
                "deadline",
                "apply by",
                "closing date",
                "applications close",
            ]),
            eligibility_rules: vec![
                EligibilityRule::new(
                    "International OK",
                    &[
                        "international students",
                        "international applicants",
                        "all nationalities",
                        "open to international",
                    ],
                ),
                EligibilityRule::new(
                    "EU/EEA",
                    &["eu/eea", "eu and eea", "eu applicants", "eu nationals"],
                ),
                EligibilityRule::new(
                    "Home students only",
                    &["home students only", "uk students only", "uk nationals only"],
                ),
            ],
            weights: ScoreWeights::default(),
        }
    }

    pub fn is_funded_portal(&self, source: &str) -> bool {
        self.funded_portals
            .iter()
            .any(|p| p.eq_ignore_ascii_case(source))
    }

    pub fn is_top_tier(&self, university: &str) -> bool {
        !university.is_empty()
            && self
                .top_tier_universities
                .iter()
                .any(|u| u.eq_ignore_ascii_case(university))
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self::default_seed()
    }
}

/// Load a profile from an explicit path. Supports TOML or JSON.
pub fn load_profile_from(path: &Path) -> Result<Profile> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading profile from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_profile(&content, ext.as_str())
}

/// Load the profile using env var + fallbacks:
/// 1) $RADAR_PROFILE_PATH
/// 2) config/profile.toml
/// 3) config/profile.json
/// 4) built-in seed
pub fn load_profile_default() -> Result<Profile> {
    if let Ok(p) = std::env::var(ENV_PROFILE_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_profile_from(&pb);
        }
        return Err(anyhow!("{ENV_PROFILE_PATH} points to non-existent path"));
    }
    let toml_p = PathBuf::from("config/profile.toml");
    if toml_p.exists() {
        return load_profile_from(&toml_p);
    }
    let json_p = PathBuf::from("config/profile.json");
    if json_p.exists() {
        return load_profile_from(&json_p);
    }
    Ok(Profile::default_seed())
}

fn parse_profile(s: &str, hint_ext: &str) -> Result<Profile> {
    match hint_ext {
        "json" => parse_json(s),
        "toml" => parse_toml(s),
        _ => parse_toml(s)
            .or_else(|_| parse_json(s))
            .map_err(|_| anyhow!("unsupported profile format")),
    }
}

fn parse_toml(s: &str) -> Result<Profile> {
    let p: Profile = toml::from_str(s)?;
    Ok(clean(p))
}

fn parse_json(s: &str) -> Result<Profile> {
    let p: Profile = serde_json::from_str(s)?;
    Ok(clean(p))
}

/// Trim entries and drop blanks and repeats, keeping first-seen order
/// (the university allow-list is order sensitive).
fn clean(mut p: Profile) -> Profile {
    for list in [
        &mut p.profile_keywords,
        &mut p.health_terms,
        &mut p.hci_terms,
        &mut p.listing_terms,
        &mut p.funded_terms,
        &mut p.self_funded_terms,
        &mut p.funded_portals,
        &mut p.collab_terms,
        &mut p.universities,
        &mut p.top_tier_universities,
        &mut p.preferred_regions,
        &mut p.deadline_labels,
    ] {
        let mut seen = std::collections::HashSet::new();
        let items = std::mem::take(list);
        for it in items {
            let t = it.trim().to_string();
            if !t.is_empty() && seen.insert(t.clone()) {
                list.push(t);
            }
        }
    }
    p
}
