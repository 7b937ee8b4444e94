// src/config/run.rs
//! Process settings for one aggregation pass, read from the environment.

use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

pub const ENV_SNAPSHOT_PATH: &str = "RADAR_SNAPSHOT_PATH";
pub const ENV_NITTER_BASE: &str = "NITTER_BASE";
pub const ENV_RSSHUB_BASE: &str = "RSSHUB_BASE";
pub const ENV_SEMANTIC_SCHOLAR_API: &str = "SEMANTIC_SCHOLAR_API";
pub const ENV_FETCH_TIMEOUT_SECS: &str = "RADAR_FETCH_TIMEOUT_SECS";
pub const ENV_ENRICH_TIMEOUT_SECS: &str = "RADAR_ENRICH_TIMEOUT_SECS";
pub const ENV_FETCH_CONCURRENCY: &str = "RADAR_FETCH_CONCURRENCY";
pub const ENV_PAPERS: &str = "RADAR_PAPERS";
pub const ENV_TOP_N: &str = "RADAR_TOP_N";
pub const ENV_MAX_ITEMS: &str = "RADAR_MAX_ITEMS";

pub const DEFAULT_SNAPSHOT_PATH: &str = "public/data/latest.json";
pub const DEFAULT_NITTER_BASE: &str = "https://nitter.net";
pub const DEFAULT_RSSHUB_BASE: &str = "https://rsshub.app";
pub const DEFAULT_SEMANTIC_SCHOLAR_API: &str =
    "https://api.semanticscholar.org/graph/v1/paper/search";

/// Base URLs of mirrored services; substituted into registry templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mirrors {
    pub nitter_base: String,
    pub rsshub_base: String,
}

impl Default for Mirrors {
    fn default() -> Self {
        Self {
            nitter_base: DEFAULT_NITTER_BASE.to_string(),
            rsshub_base: DEFAULT_RSSHUB_BASE.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub snapshot_path: PathBuf,
    pub mirrors: Mirrors,
    pub papers_api: String,
    pub papers_enabled: bool,
    pub fetch_timeout: Duration,
    pub enrich_timeout: Duration,
    pub fetch_concurrency: usize,
    pub top_n: usize,
    /// Cap on the full collection written to the snapshot. `None` keeps all.
    pub max_items: Option<usize>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            snapshot_path: PathBuf::from(DEFAULT_SNAPSHOT_PATH),
            mirrors: Mirrors::default(),
            papers_api: DEFAULT_SEMANTIC_SCHOLAR_API.to_string(),
            papers_enabled: true,
            fetch_timeout: Duration::from_secs(15),
            enrich_timeout: Duration::from_secs(12),
            fetch_concurrency: 4,
            top_n: 10,
            max_items: Some(200),
        }
    }
}

impl RunConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from an arbitrary key lookup so tests need not touch the process env.
    pub fn from_lookup<F>(get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        let text = |key: &str, default: String| -> String {
            get(key)
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
        };

        let max_items = match parse_num::<usize>(&get, ENV_MAX_ITEMS) {
            Some(0) => None,
            Some(n) => Some(n),
            None => d.max_items,
        };

        Self {
            snapshot_path: get(ENV_SNAPSHOT_PATH)
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(d.snapshot_path),
            mirrors: Mirrors {
                nitter_base: text(ENV_NITTER_BASE, d.mirrors.nitter_base),
                rsshub_base: text(ENV_RSSHUB_BASE, d.mirrors.rsshub_base),
            },
            papers_api: text(ENV_SEMANTIC_SCHOLAR_API, d.papers_api),
            papers_enabled: get(ENV_PAPERS)
                .map(|v| !matches!(v.trim(), "0" | "false" | "off"))
                .unwrap_or(d.papers_enabled),
            fetch_timeout: parse_num::<u64>(&get, ENV_FETCH_TIMEOUT_SECS)
                .filter(|s| *s > 0)
                .map(Duration::from_secs)
                .unwrap_or(d.fetch_timeout),
            enrich_timeout: parse_num::<u64>(&get, ENV_ENRICH_TIMEOUT_SECS)
                .filter(|s| *s > 0)
                .map(Duration::from_secs)
                .unwrap_or(d.enrich_timeout),
            fetch_concurrency: parse_num::<usize>(&get, ENV_FETCH_CONCURRENCY)
                .filter(|n| *n > 0)
                .unwrap_or(d.fetch_concurrency),
            top_n: parse_num::<usize>(&get, ENV_TOP_N)
                .filter(|n| *n > 0)
                .unwrap_or(d.top_n),
            max_items,
        }
    }
}

fn parse_num<T: std::str::FromStr>(get: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = get(key)?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unparseable setting");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn cfg(pairs: &[(&str, &str)]) -> RunConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RunConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn empty_env_yields_defaults() {
        let c = cfg(&[]);
        assert_eq!(c.snapshot_path, PathBuf::from(DEFAULT_SNAPSHOT_PATH));
        assert_eq!(c.mirrors, Mirrors::default());
        assert_eq!(c.top_n, 10);
        assert_eq!(c.max_items, Some(200));
        assert!(c.papers_enabled);
    }

    #[test]
    fn mirrors_are_overridable_and_trimmed() {
        let c = cfg(&[
            (ENV_NITTER_BASE, "https://nitter.example/ "),
            (ENV_RSSHUB_BASE, "https://hub.example"),
        ]);
        assert_eq!(c.mirrors.nitter_base, "https://nitter.example");
        assert_eq!(c.mirrors.rsshub_base, "https://hub.example");
    }

    #[test]
    fn bad_numbers_fall_back_and_zero_cap_disables() {
        let c = cfg(&[
            (ENV_FETCH_TIMEOUT_SECS, "soon"),
            (ENV_MAX_ITEMS, "0"),
            (ENV_PAPERS, "off"),
        ]);
        assert_eq!(c.fetch_timeout, Duration::from_secs(15));
        assert_eq!(c.max_items, None);
        assert!(!c.papers_enabled);
    }
}
