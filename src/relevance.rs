// src/relevance.rs
//! Relevance gate: a posting is kept only when its title+description mentions
//! at least one term of EACH family (health/medical AND hci/interaction/ux).
//!
//! Terms match case-insensitively at word boundaries, so "care" does not fire
//! inside "career" and "ux" does not fire inside "deluxe".

use anyhow::{anyhow, Result};
use regex::{Regex, RegexBuilder};
use tracing::debug;

use crate::config::Profile;

/// Outcome of evaluating one text against both families.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relevance {
    /// Health-family terms found (profile order).
    pub health: Vec<String>,
    /// HCI-family terms found (profile order).
    pub hci: Vec<String>,
}

impl Relevance {
    pub fn passes(&self) -> bool {
        !self.health.is_empty() && !self.hci.is_empty()
    }

    /// Short reason string for drop logs.
    pub fn reason(&self) -> &'static str {
        match (self.health.is_empty(), self.hci.is_empty()) {
            (false, false) => "both families matched",
            (true, false) => "no health term",
            (false, true) => "no hci term",
            (true, true) => "no term of either family",
        }
    }
}

/// Compile `term` into a case-insensitive whole-word matcher.
///
/// Boundaries are only asserted on sides where the term starts/ends with a
/// word character; `\b` next to punctuation would never match.
pub(crate) fn term_regex(term: &str) -> Result<Regex> {
    let t = term.trim();
    if t.is_empty() {
        return Err(anyhow!("empty term"));
    }
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let lead = if t.chars().next().is_some_and(is_word) { r"\b" } else { "" };
    let tail = if t.chars().last().is_some_and(is_word) { r"\b" } else { "" };
    // Inner whitespace of multi-word terms matches any run of whitespace.
    let body = t
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+");
    RegexBuilder::new(&format!("{lead}{body}{tail}"))
        .case_insensitive(true)
        .build()
        .map_err(|e| anyhow!("term `{term}` regex error: {e}"))
}

/// Compile a whole list, skipping blanks.
pub(crate) fn compile_terms(terms: &[String]) -> Result<Vec<(String, Regex)>> {
    terms
        .iter()
        .filter(|t| !t.trim().is_empty())
        .map(|t| Ok((t.clone(), term_regex(t)?)))
        .collect()
}

fn matched(family: &[(String, Regex)], text: &str) -> Vec<String> {
    family
        .iter()
        .filter(|(_, re)| re.is_match(text))
        .map(|(t, _)| t.clone())
        .collect()
}

/// Compiled two-family gate.
#[derive(Debug)]
pub struct RelevanceGate {
    health: Vec<(String, Regex)>,
    hci: Vec<(String, Regex)>,
}

impl RelevanceGate {
    pub fn from_profile(profile: &Profile) -> Result<Self> {
        Ok(Self {
            health: compile_terms(&profile.health_terms)?,
            hci: compile_terms(&profile.hci_terms)?,
        })
    }

    pub fn evaluate(&self, text: &str) -> Relevance {
        Relevance {
            health: matched(&self.health, text),
            hci: matched(&self.hci, text),
        }
    }

    /// Gate on `title + " " + description`.
    pub fn admits(&self, title: &str, description: &str) -> bool {
        let text = format!("{title} {description}");
        let rel = self.evaluate(&text);
        if !rel.passes() {
            debug!(target: "relevance", title, reason = rel.reason(), "gate drop");
        }
        rel.passes()
    }
}
