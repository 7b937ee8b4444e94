// src/error.rs
//! Failure taxonomy for one aggregation pass.
//!
//! Only [`OutputError`] ever escapes a pass. Fetch, state and enrichment
//! failures are recovered where they happen: the source contributes nothing,
//! the prior id set is empty, or the posting keeps an empty paper list.

use thiserror::Error;

/// One source (or one fanned-out query of a source) could not be retrieved.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Built only through [`FetchError::from_reqwest`] so timeouts stay distinct.
    #[error("http request failed: {0}")]
    Http(#[source] reqwest::Error),
    #[error("request timed out")]
    Timeout,
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("malformed feed: {0}")]
    Parse(String),
}

impl FetchError {
    /// Classify a reqwest error, keeping timeouts distinct.
    pub fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Http(e)
        }
    }
}

/// The previous snapshot is missing or unreadable.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("no previous snapshot at {0}")]
    Missing(String),
    #[error("reading previous snapshot: {0}")]
    Io(#[from] std::io::Error),
    #[error("previous snapshot is not valid json: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Paper lookup failed, timed out or was rate-limited.
#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("paper lookup request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("paper lookup rate-limited")]
    RateLimited,
    #[error("paper lookup returned status {0}")]
    Status(u16),
}

/// The new snapshot could not be persisted. Fatal to the pass.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("serializing snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("writing snapshot to {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_error_names_the_path() {
        let e = OutputError::Write {
            path: "/ro/latest.json".into(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = e.to_string();
        assert!(msg.contains("/ro/latest.json"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn status_errors_render_code() {
        assert_eq!(FetchError::Status(503).to_string(), "unexpected status 503");
        assert_eq!(EnrichError::Status(500).to_string(), "paper lookup returned status 500");
    }
}
