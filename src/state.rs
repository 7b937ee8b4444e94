// src/state.rs
//! Prior-snapshot state: which ids the previous pass already published.
//!
//! The differ is identity-only. A posting whose id was published before is
//! never flagged again, even if its text changed in the meantime.

use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::dedup::posting_id;
use crate::error::{OutputError, StateError};
use crate::posting::Posting;

/// Ids found in the snapshot at `path`.
///
/// Parsing is lenient: only `items[].id` (or, when absent, the id recomputed
/// from `link`/`title`) and the `all_ids` ledger are read, so older snapshot
/// shapes keep working.
pub fn load_prior_ids(path: &Path) -> Result<HashSet<String>, StateError> {
    if !path.exists() {
        return Err(StateError::Missing(path.display().to_string()));
    }
    let raw = fs::read_to_string(path)?;
    let doc: Value = serde_json::from_str(&raw)?;

    let mut ids = HashSet::new();
    if let Some(items) = doc.get("items").and_then(Value::as_array) {
        for it in items {
            let field = |k: &str| it.get(k).and_then(Value::as_str).unwrap_or_default();
            let id = field("id");
            if !id.is_empty() {
                ids.insert(id.to_string());
            } else if !(field("link").is_empty() && field("title").is_empty()) {
                ids.insert(posting_id(field("link"), field("title")));
            }
        }
    }
    if let Some(all) = doc.get("all_ids").and_then(Value::as_array) {
        ids.extend(all.iter().filter_map(Value::as_str).map(str::to_string));
    }
    Ok(ids)
}

/// [`load_prior_ids`], degrading a missing or unreadable snapshot to an empty set.
pub fn prior_ids_or_empty(path: &Path) -> HashSet<String> {
    match load_prior_ids(path) {
        Ok(ids) => {
            tracing::debug!(path = %path.display(), count = ids.len(), "prior snapshot loaded");
            ids
        }
        Err(StateError::Missing(p)) => {
            tracing::info!(path = %p, "no prior snapshot; every posting is new");
            HashSet::new()
        }
        Err(error) => {
            tracing::warn!(path = %path.display(), %error, "prior snapshot unreadable; treating as empty");
            HashSet::new()
        }
    }
}

/// Flag every posting whose id the prior snapshot did not contain.
pub fn mark_novelty(postings: &mut [Posting], prior: &HashSet<String>) {
    for p in postings.iter_mut() {
        p.is_new = !prior.contains(&p.id);
    }
}

/// Write `bytes` to `path` atomically: a sibling temp file is fully written
/// and synced, then renamed over the target. On failure the previous file
/// stays untouched and the temp file is removed.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), OutputError> {
    let wrap = |source: std::io::Error| OutputError::Write {
        path: path.display().to_string(),
        source,
    };

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(wrap)?;
    }
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "snapshot".to_string());
    let tmp = path.with_file_name(format!(".{file_name}.tmp"));

    let result = (|| {
        let mut f = fs::File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
        fs::rename(&tmp, path)
    })();

    if let Err(e) = result {
        let _ = fs::remove_file(&tmp);
        return Err(wrap(e));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_a_distinct_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = load_prior_ids(&tmp.path().join("none.json")).unwrap_err();
        assert!(matches!(err, StateError::Missing(_)));
        assert!(prior_ids_or_empty(&tmp.path().join("none.json")).is_empty());
    }

    #[test]
    fn corrupt_file_degrades_to_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path().join("latest.json");
        fs::write(&p, "{ not json").unwrap();
        assert!(matches!(load_prior_ids(&p), Err(StateError::Corrupt(_))));
        assert!(prior_ids_or_empty(&p).is_empty());
    }

    #[test]
    fn reads_item_ids_recomputes_missing_ones_and_ledger() {
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path().join("latest.json");
        fs::write(
            &p,
            r#"{"items":[{"id":"abc"},{"link":"https://x.test/1","title":"T"},{}],
                "all_ids":["zzz"]}"#,
        )
        .unwrap();
        let ids = load_prior_ids(&p).unwrap();
        assert_eq!(ids.len(), 3);
        assert!(ids.contains("abc"));
        assert!(ids.contains("zzz"));
        assert!(ids.contains(&posting_id("https://x.test/1", "T")));
    }

    #[test]
    fn novelty_is_identity_membership() {
        let prior: HashSet<String> = ["old".to_string()].into_iter().collect();
        let mut ps = vec![
            Posting {
                id: "old".into(),
                description: "rewritten text".into(),
                ..Default::default()
            },
            Posting {
                id: "fresh".into(),
                ..Default::default()
            },
        ];
        mark_novelty(&mut ps, &prior);
        assert!(!ps[0].is_new);
        assert!(ps[1].is_new);
    }

    #[test]
    fn atomic_write_replaces_whole_file_and_leaves_no_temp() {
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path().join("nested/latest.json");
        write_atomic(&p, b"first version, longer").unwrap();
        write_atomic(&p, b"second").unwrap();
        assert_eq!(fs::read_to_string(&p).unwrap(), "second");
        let names: Vec<_> = fs::read_dir(p.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names.len(), 1);
    }

    #[test]
    fn unwritable_target_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        // target is an existing directory: rename over it fails
        let dir = tmp.path().join("taken");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("keep"), "x").unwrap();
        let err = write_atomic(&dir, b"data").unwrap_err();
        assert!(matches!(err, OutputError::Write { .. }));
        assert!(dir.join("keep").exists());
    }
}
