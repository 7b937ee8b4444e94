// src/ingest/types.rs
use crate::error::FetchError;

/// Descriptor fields every record of a source inherits.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceMeta {
    pub name: String,   // e.g. "FindAPhD", "Twitter"
    pub region: String, // e.g. "Switzerland", "Global"
    pub social: bool,
}

impl SourceMeta {
    pub fn new(name: &str, region: &str, social: bool) -> Self {
        Self {
            name: name.to_string(),
            region: region.to_string(),
            social,
        }
    }
}

/// One entry as retrieved from a feed or listing page, before extraction.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct RawRecord {
    pub source: String,
    pub title: String,
    pub description: String, // normalized text, may be empty
    pub link: String,        // may be empty
}

/// Result of one fetch attempt. A source that legitimately had nothing is
/// `Fetched` with no records; a source that errored is `Failed`.
#[derive(Debug)]
pub enum FetchOutcome {
    Fetched {
        source: SourceMeta,
        url: String,
        records: Vec<RawRecord>,
    },
    Failed {
        source: SourceMeta,
        url: String,
        error: FetchError,
    },
}

impl FetchOutcome {
    pub fn source(&self) -> &SourceMeta {
        match self {
            FetchOutcome::Fetched { source, .. } | FetchOutcome::Failed { source, .. } => source,
        }
    }

    pub fn records(&self) -> &[RawRecord] {
        match self {
            FetchOutcome::Fetched { records, .. } => records,
            FetchOutcome::Failed { .. } => &[],
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, FetchOutcome::Failed { .. })
    }
}

#[async_trait::async_trait]
pub trait SourceProvider: Send + Sync {
    async fn fetch_latest(&self) -> Result<Vec<RawRecord>, FetchError>;
    fn meta(&self) -> &SourceMeta;
    /// Resolved URL (or a fixture label) for diagnostics.
    fn url(&self) -> &str;

    fn name(&self) -> &str {
        &self.meta().name
    }
}
