// src/ingest/providers/html_list.rs
//! Listing pages without a feed: every anchor is a candidate posting.
//!
//! Anchors go through a cheap listing-token check (e.g. "phd", "studentship")
//! before they become records, so the navigation chrome of the page never
//! reaches extraction.

use async_trait::async_trait;
use metrics::counter;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

use crate::error::FetchError;
use crate::ingest::normalize_text;
use crate::ingest::types::{RawRecord, SourceMeta, SourceProvider};

/// Extract anchor entries from `html`. Relative links resolve against `base_url`.
pub fn parse_listing(
    source: &str,
    html: &str,
    base_url: &str,
    listing_terms: &[String],
) -> Vec<RawRecord> {
    let document = Html::parse_document(html);
    let Ok(anchor_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };
    let base = Url::parse(base_url).ok();
    let terms: Vec<String> = listing_terms.iter().map(|t| t.to_lowercase()).collect();

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for element in document.select(&anchor_selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let title = normalize_text(&element.text().collect::<Vec<_>>().join(" "));
        if title.is_empty() {
            continue;
        }
        let lower = title.to_lowercase();
        if !terms.iter().any(|t| lower.contains(t.as_str())) {
            continue;
        }
        let link = match &base {
            Some(b) => match b.join(href) {
                Ok(u) => u.to_string(),
                Err(_) => continue,
            },
            None => href.to_string(),
        };
        // Listing pages repeat the same anchor in teasers and sidebars.
        if !seen.insert(link.clone()) {
            continue;
        }
        out.push(RawRecord {
            source: source.to_string(),
            title,
            description: String::new(),
            link,
        });
    }

    counter!("radar_records_total").increment(out.len() as u64);
    out
}

pub struct HtmlListProvider {
    meta: SourceMeta,
    url: String,
    listing_terms: Vec<String>,
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http(reqwest::Client),
}

impl HtmlListProvider {
    /// `url` still acts as the base for relative links.
    pub fn from_fixture(meta: SourceMeta, url: &str, html: &str, listing_terms: &[String]) -> Self {
        Self {
            meta,
            url: url.to_string(),
            listing_terms: listing_terms.to_vec(),
            mode: Mode::Fixture(html.to_string()),
        }
    }

    pub fn from_url(
        meta: SourceMeta,
        url: &str,
        client: reqwest::Client,
        listing_terms: &[String],
    ) -> Self {
        Self {
            meta,
            url: url.to_string(),
            listing_terms: listing_terms.to_vec(),
            mode: Mode::Http(client),
        }
    }
}

#[async_trait]
impl SourceProvider for HtmlListProvider {
    async fn fetch_latest(&self) -> Result<Vec<RawRecord>, FetchError> {
        let body = match &self.mode {
            Mode::Fixture(s) => s.clone(),
            Mode::Http(client) => super::get_text(client, &self.url).await?,
        };
        Ok(parse_listing(
            &self.meta.name,
            &body,
            &self.url,
            &self.listing_terms,
        ))
    }

    fn meta(&self) -> &SourceMeta {
        &self.meta
    }

    fn url(&self) -> &str {
        &self.url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms() -> Vec<String> {
        vec!["phd".to_string(), "studentship".to_string()]
    }

    #[test]
    fn keeps_only_listing_anchors_and_resolves_links() {
        let html = r#"<html><body>
            <a href="/about">About us</a>
            <a href="/p/1">Fully funded PhD in Digital Health UX</a>
            <a href="https://other.test/s">EPSRC Studentship: clinical HCI</a>
            <a href="/p/1">Fully funded PhD in Digital Health UX</a>
            <a href="/p/2"> </a>
        </body></html>"#;
        let recs = parse_listing("Cafe", html, "https://cafe.test/search/label/PhD", &terms());
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].link, "https://cafe.test/p/1");
        assert_eq!(recs[1].link, "https://other.test/s");
        assert!(recs.iter().all(|r| r.description.is_empty()));
    }

    #[test]
    fn page_without_anchors_is_empty_not_an_error() {
        let recs = parse_listing("Cafe", "<p>maintenance</p>", "https://cafe.test/", &terms());
        assert!(recs.is_empty());
    }
}
