// src/papers.rs
//! Best-effort "representative papers" for the top postings.
//!
//! One lookup per posting, no retries. Any failure leaves the posting's paper
//! list empty and is only counted and logged.

use async_trait::async_trait;
use metrics::counter;
use serde::Deserialize;
use std::time::Duration;

use crate::error::EnrichError;
use crate::posting::{Paper, Posting};

/// Papers kept per posting.
pub const PAPERS_PER_POSTING: usize = 2;
/// Results requested from the search endpoint.
const SEARCH_LIMIT: usize = 5;

#[async_trait]
pub trait PaperLookup: Send + Sync {
    /// Up to a handful of papers for a free-text query.
    async fn search(&self, query: &str) -> Result<Vec<Paper>, EnrichError>;
    fn name(&self) -> &str;
}

/// Lookup that never finds anything (enrichment switched off).
pub struct DisabledLookup;

#[async_trait]
impl PaperLookup for DisabledLookup {
    async fn search(&self, _query: &str) -> Result<Vec<Paper>, EnrichError> {
        Ok(Vec::new())
    }

    fn name(&self) -> &str {
        "disabled"
    }
}

/* ---- Semantic Scholar ---- */

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    year: Option<i32>,
    #[serde(default, rename = "citationCount")]
    citation_count: Option<u32>,
    #[serde(default)]
    url: Option<String>,
}

impl From<SearchHit> for Paper {
    fn from(h: SearchHit) -> Self {
        Paper {
            title: h.title.unwrap_or_default(),
            year: h.year,
            citations: h.citation_count.unwrap_or(0),
            url: h.url.unwrap_or_default(),
        }
    }
}

pub struct SemanticScholar {
    endpoint: String,
    client: reqwest::Client,
}

impl SemanticScholar {
    pub fn new(endpoint: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("phd-radar/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            endpoint: endpoint.to_string(),
            client,
        }
    }
}

#[async_trait]
impl PaperLookup for SemanticScholar {
    async fn search(&self, query: &str) -> Result<Vec<Paper>, EnrichError> {
        let limit = SEARCH_LIMIT.to_string();
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("query", query),
                ("limit", limit.as_str()),
                ("fields", "title,year,citationCount,url"),
            ])
            .send()
            .await?;
        let status = resp.status();
        if status.as_u16() == 429 {
            return Err(EnrichError::RateLimited);
        }
        if !status.is_success() {
            return Err(EnrichError::Status(status.as_u16()));
        }
        let body: SearchResponse = resp.json().await?;
        Ok(body.data.into_iter().map(Paper::from).collect())
    }

    fn name(&self) -> &str {
        "semantic-scholar"
    }
}

/* ---- Selection ---- */

/// Newest first, then most cited; keep [`PAPERS_PER_POSTING`].
pub fn select_papers(mut papers: Vec<Paper>) -> Vec<Paper> {
    papers.retain(|p| !p.title.trim().is_empty());
    papers.sort_by(|a, b| {
        b.year
            .unwrap_or(0)
            .cmp(&a.year.unwrap_or(0))
            .then_with(|| b.citations.cmp(&a.citations))
    });
    papers.truncate(PAPERS_PER_POSTING);
    papers
}

fn query_for(p: &Posting) -> String {
    format!("{} {}", p.university, p.title)
}

/// Attach papers to every posting that names a university. Lookups run one
/// after another; failures are logged and skipped.
pub async fn enrich(postings: &mut [Posting], lookup: &dyn PaperLookup) {
    for p in postings.iter_mut().filter(|p| !p.university.is_empty()) {
        match lookup.search(&query_for(p)).await {
            Ok(found) => p.papers = select_papers(found),
            Err(error) => {
                counter!("radar_enrich_errors_total").increment(1);
                tracing::warn!(lookup = lookup.name(), id = %p.id, %error, "paper lookup failed");
                p.papers.clear();
            }
        }
    }
}
