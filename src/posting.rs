// src/posting.rs
//! The central record flowing through a pass.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Deadline sentinel when no date could be found.
pub const ROLLING: &str = "Rolling";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FundingStatus {
    Funded,
    SelfFunded,
    OftenFundedOnPortal,
    #[default]
    Unknown,
}

impl FundingStatus {
    /// Human label used in the tabular extract and the summary line.
    pub fn label(self) -> &'static str {
        match self {
            FundingStatus::Funded => "Funded/Studentship/Stipend",
            FundingStatus::SelfFunded => "Self-funded",
            FundingStatus::OftenFundedOnPortal => "Often funded (portal)",
            FundingStatus::Unknown => "TBD",
        }
    }

    /// Primary sort key: 1 for an explicit funding signal, else 0.
    pub fn funded_rank(self) -> u8 {
        u8::from(self == FundingStatus::Funded)
    }
}

impl fmt::Display for FundingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paper {
    pub title: String,
    pub year: Option<i32>,
    pub citations: u32,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Posting {
    pub id: String,
    pub title: String,
    pub link: String,
    pub description: String,
    pub source: String,
    pub social: bool,
    pub university: String,
    pub lab: String,
    pub supervisor: String,
    pub keywords: BTreeSet<String>,
    pub location: String,
    pub funding: FundingStatus,
    pub eligibility: String,
    /// ISO `YYYY-MM-DD` or [`ROLLING`].
    pub deadline: String,
    pub collab: BTreeSet<String>,
    pub score: u32,
    pub summary: String,
    pub is_new: bool,
    #[serde(default)]
    pub papers: Vec<Paper>,
}

impl Posting {
    /// Pipe-joined digest of the extracted fields.
    pub fn make_summary(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if !self.university.is_empty() {
            parts.push(self.university.clone());
        }
        if !self.lab.is_empty() {
            parts.push(self.lab.clone());
        }
        if !self.supervisor.is_empty() {
            parts.push(format!("Supervisor: {}", self.supervisor));
        }
        if !self.keywords.is_empty() {
            let kws: Vec<&str> = self.keywords.iter().take(6).map(String::as_str).collect();
            parts.push(format!("Keywords: {}", kws.join(", ")));
        }
        parts.push(format!("Funding: {}", self.funding.label()));
        if !self.eligibility.is_empty() {
            parts.push(format!("Eligibility: {}", self.eligibility));
        }
        if !self.collab.is_empty() {
            let c: Vec<&str> = self.collab.iter().map(String::as_str).collect();
            parts.push(format!("Collab: {}", c.join(", ")));
        }
        if !self.deadline.is_empty() {
            parts.push(format!("Deadline: {}", self.deadline));
        }
        parts.join(" | ")
    }
}
