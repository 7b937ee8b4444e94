// tests/common/mod.rs
// Shared fixtures for integration tests: offline providers and a temp run config.
#![allow(dead_code)]

use async_trait::async_trait;
use phd_radar::config::{Profile, RunConfig};
use phd_radar::error::FetchError;
use phd_radar::ingest::providers::{HtmlListProvider, RssProvider};
use phd_radar::ingest::types::{RawRecord, SourceMeta, SourceProvider};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const FINDAPHD_XML: &str = include_str!("../fixtures/findaphd_rss.xml");
pub const EURAXESS_ATOM: &str = include_str!("../fixtures/euraxess_atom.xml");
pub const CAFE_HTML: &str = include_str!("../fixtures/cafe_listing.html");
pub const CAFE_URL: &str = "https://www.scholarshipscafe.com/search/label/PhD";

/// Provider that returns a fixed record list.
pub struct StaticProvider {
    pub meta: SourceMeta,
    pub records: Vec<RawRecord>,
}

impl StaticProvider {
    pub fn new(name: &str, records: Vec<RawRecord>) -> Self {
        Self {
            meta: SourceMeta::new(name, "Europe", false),
            records,
        }
    }
}

#[async_trait]
impl SourceProvider for StaticProvider {
    async fn fetch_latest(&self) -> Result<Vec<RawRecord>, FetchError> {
        Ok(self.records.clone())
    }

    fn meta(&self) -> &SourceMeta {
        &self.meta
    }

    fn url(&self) -> &str {
        "static"
    }
}

/// Provider that waits before answering and notes when it finished.
pub struct SlowProvider {
    pub meta: SourceMeta,
    pub delay: Duration,
    pub records: Vec<RawRecord>,
    pub finished: Arc<Mutex<Vec<String>>>,
}

impl SlowProvider {
    pub fn new(
        name: &str,
        delay: Duration,
        records: Vec<RawRecord>,
        finished: Arc<Mutex<Vec<String>>>,
    ) -> Self {
        Self {
            meta: SourceMeta::new(name, "Europe", false),
            delay,
            records,
            finished,
        }
    }
}

#[async_trait]
impl SourceProvider for SlowProvider {
    async fn fetch_latest(&self) -> Result<Vec<RawRecord>, FetchError> {
        tokio::time::sleep(self.delay).await;
        self.finished.lock().unwrap().push(self.meta.name.clone());
        Ok(self.records.clone())
    }

    fn meta(&self) -> &SourceMeta {
        &self.meta
    }

    fn url(&self) -> &str {
        "slow"
    }
}

/// Provider that always errors, as an unreachable source would.
pub struct FailingProvider {
    pub meta: SourceMeta,
    pub timeout: bool,
}

impl FailingProvider {
    pub fn new(name: &str) -> Self {
        Self {
            meta: SourceMeta::new(name, "Global", false),
            timeout: false,
        }
    }

    /// Fails the way a request past its deadline does.
    pub fn timing_out(name: &str) -> Self {
        Self {
            timeout: true,
            ..Self::new(name)
        }
    }
}

#[async_trait]
impl SourceProvider for FailingProvider {
    async fn fetch_latest(&self) -> Result<Vec<RawRecord>, FetchError> {
        if self.timeout {
            Err(FetchError::Timeout)
        } else {
            Err(FetchError::Status(503))
        }
    }

    fn meta(&self) -> &SourceMeta {
        &self.meta
    }

    fn url(&self) -> &str {
        "https://down.test/rss"
    }
}

pub fn record(source: &str, title: &str, description: &str, link: &str) -> RawRecord {
    RawRecord {
        source: source.into(),
        title: title.into(),
        description: description.into(),
        link: link.into(),
    }
}

/// The three fixture feeds plus one dead source, in registry-like order.
pub fn fixture_providers(profile: &Profile) -> Vec<Box<dyn SourceProvider>> {
    vec![
        Box::new(RssProvider::from_fixture(
            SourceMeta::new("FindAPhD", "UK/Europe", false),
            FINDAPHD_XML,
        )),
        Box::new(FailingProvider::new("OeAD Jobs")),
        Box::new(RssProvider::from_fixture(
            SourceMeta::new("EURAXESS", "Europe", false),
            EURAXESS_ATOM,
        )),
        Box::new(HtmlListProvider::from_fixture(
            SourceMeta::new("Scholarship Cafe", "Global", false),
            CAFE_URL,
            CAFE_HTML,
            &profile.listing_terms,
        )),
    ]
}

/// Offline run config writing into `dir`.
pub fn run_config(dir: &Path) -> RunConfig {
    RunConfig {
        snapshot_path: dir.join("data/latest.json"),
        papers_enabled: false,
        ..Default::default()
    }
}
