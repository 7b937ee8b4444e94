// src/extract.rs
//! Field extraction: turns a normalized raw record into a [`Posting`].
//!
//! All recognizers are pattern-driven and total: a field that cannot be found
//! stays empty (deadline falls back to [`ROLLING`]). The keyword, funding,
//! region and institution vocabularies come from the injected [`Profile`].

use anyhow::Result;
use chrono::NaiveDate;
use once_cell::sync::OnceCell;
use regex::Regex;
use std::collections::BTreeSet;

use crate::config::Profile;
use crate::dedup::posting_id;
use crate::ingest::types::{RawRecord, SourceMeta};
use crate::posting::{FundingStatus, Posting, ROLLING};
use crate::relevance::compile_terms;

const MONTHS: &str = "jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?";

/// Trailing words a generic "University of ..." capture must not end with.
const UNIVERSITY_STOP: &[&str] = &[
    "PhD", "Studentship", "Studentships", "Scholarship", "Position", "Positions", "Project",
    "Programme", "Program", "Doctoral", "Research", "Fully", "Funded", "Call", "Deadline",
];

const CONNECTORS: &[&str] = &["and", "&", "of", "for", "the"];

/* ---- Static recognizers ---- */

fn re_university_generic() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| {
        Regex::new(r"\bUniversity\s+of\s+\p{Lu}[\p{L}'\-]*(?:\s+\p{Lu}[\p{L}'\-]*){0,3}")
            .expect("university regex")
    })
}

fn re_supervisor() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(?:Prof|Dr)\.?(?:\s+(?:Prof|Dr)\.?)?\s+\p{Lu}[\p{L}'\-]+")
            .expect("supervisor regex")
    })
}

fn re_lab_unit() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\b(?:School|Department|Faculty|Institute|Centre|Center|Division)\s+(?:of|for)\s+\p{Lu}[\p{L}\-]*(?:\s+(?:and|&|of|for|the|\p{Lu}[\p{L}\-]*)){0,5}",
        )
        .expect("lab unit regex")
    })
}

fn re_lab_named() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(?:\p{Lu}[\p{L}\-]*\s+){1,3}(?:Lab|Laboratory|Research Group)\b")
            .expect("lab name regex")
    })
}

fn date_patterns() -> &'static [(Regex, DateShape)] {
    static RES: OnceCell<Vec<(Regex, DateShape)>> = OnceCell::new();
    RES.get_or_init(|| {
        let build = |p: String| Regex::new(&p).expect("date regex");
        vec![
            (
                build(format!(
                    r"(?i)\b(\d{{1,2}})(?:st|nd|rd|th)?\s+({MONTHS})\.?,?\s+(\d{{4}})\b"
                )),
                DateShape::DayMonthName,
            ),
            (
                build(format!(
                    r"(?i)\b({MONTHS})\.?\s+(\d{{1,2}})(?:st|nd|rd|th)?,?\s+(\d{{4}})\b"
                )),
                DateShape::MonthNameDay,
            ),
            (
                build(r"\b(\d{4})[-/.](\d{1,2})[-/.](\d{1,2})\b".to_string()),
                DateShape::YearFirst,
            ),
            (
                build(r"\b(\d{1,2})[/.\-](\d{1,2})[/.\-](\d{4})\b".to_string()),
                DateShape::DayFirstNumeric,
            ),
        ]
    })
}

#[derive(Debug, Clone, Copy)]
enum DateShape {
    DayMonthName,
    MonthNameDay,
    YearFirst,
    DayFirstNumeric,
}

fn month_from_name(name: &str) -> Option<u32> {
    let key: String = name.chars().take(3).collect::<String>().to_ascii_lowercase();
    let m = match key.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(m)
}

fn date_from_caps(caps: &regex::Captures<'_>, shape: DateShape) -> Option<NaiveDate> {
    let num = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
    let (y, m, d) = match shape {
        DateShape::DayMonthName => (num(3)?, month_from_name(caps.get(2)?.as_str())?, num(1)?),
        DateShape::MonthNameDay => (num(3)?, month_from_name(caps.get(1)?.as_str())?, num(2)?),
        DateShape::YearFirst => (num(1)?, num(2)?, num(3)?),
        DateShape::DayFirstNumeric => (num(3)?, num(2)?, num(1)?),
    };
    NaiveDate::from_ymd_opt(i32::try_from(y).ok()?, m, d)
}

/// Every valid date in `text` as `(start, end, date)`, ordered by position.
/// Calendar-invalid candidates (e.g. 31 February) are skipped.
pub fn find_dates(text: &str) -> Vec<(usize, usize, NaiveDate)> {
    let mut out = Vec::new();
    for (re, shape) in date_patterns() {
        for caps in re.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            if let Some(date) = date_from_caps(&caps, *shape) {
                out.push((whole.start(), whole.end(), date));
            }
        }
    }
    out.sort_by_key(|(start, end, _)| (*start, std::cmp::Reverse(*end)));
    out
}

fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Drop trailing words in `stop` (and connectors) from a phrase.
fn trim_trailing<'a>(phrase: &'a str, stop: &[&str]) -> &'a str {
    let mut s = phrase.trim_end();
    loop {
        let Some((head, last)) = s.rsplit_once(char::is_whitespace) else {
            return s;
        };
        if stop.iter().any(|w| w.eq_ignore_ascii_case(last)) || CONNECTORS.contains(&last) {
            s = head.trim_end();
        } else {
            return s;
        }
    }
}

/* ---- Extractor ---- */

/// Recognizers compiled once from a profile.
#[derive(Debug)]
pub struct Extractor<'p> {
    profile: &'p Profile,
    universities: Vec<(String, Regex)>,
    regions: Vec<(String, Regex)>,
    funded: Vec<(String, Regex)>,
    self_funded: Vec<(String, Regex)>,
    deadline_labels: Vec<(String, Regex)>,
}

impl<'p> Extractor<'p> {
    pub fn new(profile: &'p Profile) -> Result<Self> {
        Ok(Self {
            profile,
            universities: compile_terms(&profile.universities)?,
            regions: compile_terms(&profile.preferred_regions)?,
            funded: compile_terms(&profile.funded_terms)?,
            self_funded: compile_terms(&profile.self_funded_terms)?,
            deadline_labels: compile_terms(&profile.deadline_labels)?,
        })
    }

    /// Build a posting from `raw`. Score and novelty are left at their defaults.
    pub fn extract(&self, raw: &RawRecord, meta: &SourceMeta) -> Posting {
        let text = format!("{} {}", raw.title, raw.description);
        let lower = text.to_lowercase();
        let mut p = Posting {
            id: posting_id(&raw.link, &raw.title),
            title: raw.title.clone(),
            link: raw.link.clone(),
            description: raw.description.clone(),
            source: meta.name.clone(),
            social: meta.social,
            university: self.university(&text),
            lab: self.lab(&text),
            supervisor: self.supervisor(&raw.description),
            keywords: self.keywords(&lower),
            location: self.location(&text, meta),
            funding: self.funding(&text, &meta.name),
            eligibility: self.eligibility(&lower),
            deadline: self.deadline(&text),
            collab: self.collab(&lower),
            ..Default::default()
        };
        p.summary = p.make_summary();
        p
    }

    /// First allow-list entry found (canonical spelling), else a generic
    /// "University of X" phrase, else empty.
    pub fn university(&self, text: &str) -> String {
        if let Some((name, _)) = self.universities.iter().find(|(_, re)| re.is_match(text)) {
            return name.clone();
        }
        re_university_generic()
            .find(text)
            .map(|m| trim_trailing(m.as_str(), UNIVERSITY_STOP))
            .filter(|s| s.split_whitespace().count() > 2)
            .map(str::to_string)
            .unwrap_or_default()
    }

    pub fn lab(&self, text: &str) -> String {
        re_lab_unit()
            .find(text)
            .or_else(|| re_lab_named().find(text))
            .map(|m| trim_trailing(m.as_str(), &[]).to_string())
            .unwrap_or_default()
    }

    /// Title-prefixed surname ("Prof. Smith", "Dr Jane"), first occurrence.
    pub fn supervisor(&self, description: &str) -> String {
        re_supervisor()
            .find(description)
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default()
    }

    pub fn keywords(&self, lower: &str) -> BTreeSet<String> {
        self.profile
            .profile_keywords
            .iter()
            .filter(|k| lower.contains(&k.to_lowercase()))
            .cloned()
            .collect()
    }

    /// Preferred regions named in the text, else the source's region label.
    pub fn location(&self, text: &str, meta: &SourceMeta) -> String {
        let found: Vec<&str> = self
            .regions
            .iter()
            .filter(|(_, re)| re.is_match(text))
            .map(|(r, _)| r.as_str())
            .collect();
        if found.is_empty() {
            meta.region.clone()
        } else {
            found.join(", ")
        }
    }

    /// Explicit funding wins; a self-funded mention only counts when no other
    /// funding phrase remains once the self-funded phrases are removed.
    pub fn funding(&self, text: &str, source: &str) -> FundingStatus {
        let mut rest = text.to_string();
        let mut self_funded = false;
        for (_, re) in &self.self_funded {
            if re.is_match(&rest) {
                self_funded = true;
                rest = re.replace_all(&rest, " ").into_owned();
            }
        }
        if self.funded.iter().any(|(_, re)| re.is_match(&rest)) {
            FundingStatus::Funded
        } else if self_funded {
            FundingStatus::SelfFunded
        } else if self.profile.is_funded_portal(source) {
            FundingStatus::OftenFundedOnPortal
        } else {
            FundingStatus::Unknown
        }
    }

    pub fn eligibility(&self, lower: &str) -> String {
        self.profile
            .eligibility_rules
            .iter()
            .filter(|r| r.terms.iter().any(|t| lower.contains(&t.to_lowercase())))
            .map(|r| r.label.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// ISO date following a deadline label, else the first date anywhere,
    /// else [`ROLLING`].
    pub fn deadline(&self, text: &str) -> String {
        let dates = find_dates(text);
        if dates.is_empty() {
            return ROLLING.to_string();
        }

        let mut labels: Vec<(usize, usize)> = self
            .deadline_labels
            .iter()
            .flat_map(|(_, re)| re.find_iter(text).map(|m| (m.start(), m.end())))
            .collect();
        labels.sort_unstable();

        for (_, label_end) in labels {
            let next = dates.iter().find(|(start, _, _)| *start >= label_end);
            if let Some((start, _, date)) = next {
                // Any number in between means the label belongs to something else.
                if !text[label_end..*start].chars().any(|c| c.is_ascii_digit()) {
                    return iso(*date);
                }
            }
        }
        iso(dates[0].2)
    }

    pub fn collab(&self, lower: &str) -> BTreeSet<String> {
        self.profile
            .collab_terms
            .iter()
            .filter(|t| lower.contains(&t.to_lowercase()))
            .cloned()
            .collect()
    }
}
