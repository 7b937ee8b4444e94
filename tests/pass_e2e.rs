// tests/pass_e2e.rs
// Full passes over offline providers: novelty across runs, window fallback,
// ranking, snapshot shape and failure handling.

mod common;

use chrono::{DateTime, TimeZone, Utc};
use common::*;
use phd_radar::config::Profile;
use phd_radar::dedup::posting_id;
use phd_radar::ingest::types::SourceProvider;
use phd_radar::output::CSV_HEADER;
use phd_radar::papers::DisabledLookup;
use phd_radar::{run_pass, FundingStatus, OutputError, Pipeline, Snapshot};
use std::fs;
use std::path::Path;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 6, 0, 0).unwrap()
}

fn read_snapshot(path: &Path) -> Snapshot {
    serde_json::from_str(&fs::read_to_string(path).expect("snapshot exists")).expect("valid json")
}

fn csv_header_line() -> String {
    CSV_HEADER
        .iter()
        .map(|h| format!("\"{h}\""))
        .collect::<Vec<_>>()
        .join(",")
}

#[tokio::test]
async fn first_pass_marks_everything_new_and_second_pass_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = run_config(tmp.path());
    let profile = Profile::default_seed();
    let pipeline = Pipeline::new(&profile).unwrap();
    let providers = fixture_providers(&profile);

    let first = run_pass(&cfg, &pipeline, &providers, &DisabledLookup, now())
        .await
        .expect("first pass");
    assert_eq!(first.stats.sources_failed, 1);
    assert_eq!(first.kept, 7);
    assert_eq!(first.new, 7);
    assert!(!first.window_fallback);

    let snap1 = read_snapshot(&cfg.snapshot_path);
    assert_eq!(snap1.generated_at, "2026-01-15T06:00:00Z");
    assert_eq!(snap1.total_items, 7);
    assert!(snap1.items.iter().all(|p| p.is_new));
    assert_eq!(snap1.by_source.get("FindAPhD"), Some(&3));
    assert_eq!(snap1.by_source.get("EURAXESS"), Some(&2));
    assert_eq!(snap1.by_source.get("Scholarship Cafe"), Some(&2));
    assert!(!snap1.by_source.contains_key("OeAD Jobs"));

    let second = run_pass(&cfg, &pipeline, &providers, &DisabledLookup, now())
        .await
        .expect("second pass");
    assert_eq!(second.new, 0);
    assert!(second.window_fallback);

    let snap2 = read_snapshot(&cfg.snapshot_path);
    assert!(snap2.items.iter().all(|p| !p.is_new));
    // nothing new: the window is the head of the full ranked list
    let head: Vec<_> = snap2.items.iter().take(10).cloned().collect();
    assert_eq!(snap2.top10_new_or_updated, head);
    // ids are stable across runs
    let ids1: Vec<_> = snap1.items.iter().map(|p| p.id.clone()).collect();
    let ids2: Vec<_> = snap2.items.iter().map(|p| p.id.clone()).collect();
    assert_eq!(ids1, ids2);
}

#[tokio::test]
async fn funded_postings_rank_above_all_others() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = run_config(tmp.path());
    let profile = Profile::default_seed();
    let pipeline = Pipeline::new(&profile).unwrap();
    run_pass(&cfg, &pipeline, &fixture_providers(&profile), &DisabledLookup, now())
        .await
        .unwrap();

    let snap = read_snapshot(&cfg.snapshot_path);
    let first_unfunded = snap
        .items
        .iter()
        .position(|p| p.funding != FundingStatus::Funded)
        .expect("fixtures include unfunded postings");
    assert!(snap.items[first_unfunded..]
        .iter()
        .all(|p| p.funding != FundingStatus::Funded));
    assert_eq!(first_unfunded, 5);
    for pair in snap.items[..first_unfunded].windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[tokio::test]
async fn extracted_fields_survive_into_the_snapshot() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = run_config(tmp.path());
    let profile = Profile::default_seed();
    let pipeline = Pipeline::new(&profile).unwrap();
    run_pass(&cfg, &pipeline, &fixture_providers(&profile), &DisabledLookup, now())
        .await
        .unwrap();
    let snap = read_snapshot(&cfg.snapshot_path);

    let delft = snap
        .items
        .iter()
        .find(|p| p.university == "TU Delft")
        .expect("TU Delft posting");
    assert_eq!(delft.supervisor, "Prof. Jansen");
    assert_eq!(delft.lab, "Department of Industrial Design");
    assert_eq!(delft.deadline, "2026-03-15");
    assert_eq!(delft.funding, FundingStatus::Funded);
    assert_eq!(delft.eligibility, "International OK");

    let kth = snap.items.iter().find(|p| p.university == "KTH").expect("KTH posting");
    assert_eq!(kth.funding, FundingStatus::OftenFundedOnPortal);
    assert_eq!(kth.deadline, "Rolling");
    assert_eq!(kth.location, "Sweden");

    let leeds = snap
        .items
        .iter()
        .find(|p| p.university == "University of Leeds")
        .expect("generic university fallback");
    assert_eq!(leeds.deadline, "2026-01-31");

    let csv = &snap.csv_block;
    assert!(csv.starts_with(&csv_header_line()));
    assert_eq!(csv.lines().count(), 1 + snap.top10_new_or_updated.len());
}

#[tokio::test]
async fn corrupt_prior_snapshot_means_everything_is_new() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = run_config(tmp.path());
    fs::create_dir_all(cfg.snapshot_path.parent().unwrap()).unwrap();
    fs::write(&cfg.snapshot_path, "{\"items\": [truncated").unwrap();

    let profile = Profile::default_seed();
    let pipeline = Pipeline::new(&profile).unwrap();
    let report = run_pass(&cfg, &pipeline, &fixture_providers(&profile), &DisabledLookup, now())
        .await
        .expect("pass completes despite corrupt prior");
    assert_eq!(report.new, report.kept);
    assert!(read_snapshot(&cfg.snapshot_path).items.iter().all(|p| p.is_new));
}

#[tokio::test]
async fn text_change_on_a_known_link_is_not_flagged() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = run_config(tmp.path());
    let profile = Profile::default_seed();
    let pipeline = Pipeline::new(&profile).unwrap();
    let link = "https://portal.test/phd/42";

    let before: Vec<Box<dyn SourceProvider>> = vec![Box::new(StaticProvider::new(
        "Portal",
        vec![record("Portal", "Patient UX PhD position", "Deadline 1 May 2026", link)],
    ))];
    run_pass(&cfg, &pipeline, &before, &DisabledLookup, now())
        .await
        .unwrap();

    let after: Vec<Box<dyn SourceProvider>> = vec![Box::new(StaticProvider::new(
        "Portal",
        vec![record(
            "Portal",
            "Patient UX PhD position (extended)",
            "Now fully funded. Deadline 1 June 2026",
            link,
        )],
    ))];
    let report = run_pass(&cfg, &pipeline, &after, &DisabledLookup, now())
        .await
        .unwrap();

    // Identity-only novelty: same link, same id, never re-flagged.
    assert_eq!(report.new, 0);
    let snap = read_snapshot(&cfg.snapshot_path);
    assert_eq!(snap.items.len(), 1);
    assert_eq!(snap.items[0].id, posting_id(link, ""));
    assert!(!snap.items[0].is_new);
    assert_eq!(snap.items[0].deadline, "2026-06-01");
}

#[tokio::test]
async fn duplicate_links_keep_the_first_record() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = run_config(tmp.path());
    let profile = Profile::default_seed();
    let pipeline = Pipeline::new(&profile).unwrap();
    let link = "https://portal.test/phd/7";

    let providers: Vec<Box<dyn SourceProvider>> = vec![
        Box::new(StaticProvider::new(
            "First",
            vec![record("First", "Patient UX PhD position", "", link)],
        )),
        Box::new(StaticProvider::new(
            "Second",
            vec![record("Second", "Fully funded patient UX PhD", "", link)],
        )),
    ];
    let report = run_pass(&cfg, &pipeline, &providers, &DisabledLookup, now())
        .await
        .unwrap();
    assert_eq!(report.stats.duplicates, 1);

    let snap = read_snapshot(&cfg.snapshot_path);
    assert_eq!(snap.items.len(), 1);
    assert_eq!(snap.items[0].source, "First");
}

#[tokio::test]
async fn empty_run_still_writes_header_only_csv() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = run_config(tmp.path());
    let profile = Profile::default_seed();
    let pipeline = Pipeline::new(&profile).unwrap();
    let providers: Vec<Box<dyn SourceProvider>> = vec![Box::new(FailingProvider::new("Down"))];

    let report = run_pass(&cfg, &pipeline, &providers, &DisabledLookup, now())
        .await
        .unwrap();
    assert_eq!(report.kept, 0);
    assert_eq!(report.window, 0);

    let snap = read_snapshot(&cfg.snapshot_path);
    assert_eq!(snap.csv_block, csv_header_line());
    assert!(snap.items.is_empty());
    assert!(snap.by_source.is_empty());
}

#[tokio::test]
async fn unwritable_snapshot_is_fatal_and_keeps_the_old_one() {
    let tmp = tempfile::tempdir().unwrap();
    let profile = Profile::default_seed();
    let pipeline = Pipeline::new(&profile).unwrap();

    // A non-empty directory where the snapshot file should go.
    let blocked = tmp.path().join("latest.json");
    fs::create_dir(&blocked).unwrap();
    fs::write(blocked.join("previous"), "kept").unwrap();
    let cfg = phd_radar::RunConfig {
        snapshot_path: blocked.clone(),
        papers_enabled: false,
        ..Default::default()
    };

    let err = run_pass(&cfg, &pipeline, &fixture_providers(&profile), &DisabledLookup, now())
        .await
        .unwrap_err();
    assert!(matches!(err, OutputError::Write { .. }));
    assert_eq!(fs::read_to_string(blocked.join("previous")).unwrap(), "kept");
}

#[tokio::test]
async fn cap_limits_items_but_ledger_keeps_all_ids() {
    let tmp = tempfile::tempdir().unwrap();
    let mut cfg = run_config(tmp.path());
    cfg.max_items = Some(3);
    let profile = Profile::default_seed();
    let pipeline = Pipeline::new(&profile).unwrap();
    let providers = fixture_providers(&profile);

    run_pass(&cfg, &pipeline, &providers, &DisabledLookup, now())
        .await
        .unwrap();
    let snap = read_snapshot(&cfg.snapshot_path);
    assert_eq!(snap.items.len(), 3);
    assert_eq!(snap.total_items, 7);
    assert_eq!(snap.all_ids.len(), 7);

    // Capped-off postings are still known next time.
    let report = run_pass(&cfg, &pipeline, &providers, &DisabledLookup, now())
        .await
        .unwrap();
    assert_eq!(report.new, 0);
}
