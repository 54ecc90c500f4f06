//! Integration tests for the normalize → analytics pipeline
//!
//! These tests load fixture documents from `tests/fixtures/projects/`
//! through [`JsonDirSource`] and check the records and derived views.

use chrono::{Local, TimeZone};
use clipscope_core::analytics::{build_report, AnalyticsOptions};
use clipscope_core::chat::build_system_prompt;
use clipscope_core::ingest::{normalize_project, NormalizeOptions, ReferenceClock};
use clipscope_core::source::{DocumentSource, JsonDirSource};
use clipscope_core::{Error, VideoRecord, UNKNOWN_PUBLISH_TIME};
use std::path::PathBuf;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/projects")
}

fn clock() -> ReferenceClock {
    ReferenceClock::fixed(Local.with_ymd_and_hms(2024, 5, 20, 12, 0, 0).unwrap())
}

fn load(project_id: &str) -> Vec<VideoRecord> {
    clipscope_core::logging::init_test();
    let source = JsonDirSource::new(fixtures_dir());
    let doc = source.require(project_id).expect("fixture should load");
    normalize_project(&doc, &NormalizeOptions::default(), &clock())
}

fn keys(records: &[VideoRecord]) -> Vec<&str> {
    records.iter().map(|r| r.key.as_str()).collect()
}

// ============================================
// Source
// ============================================

#[test]
fn test_lists_fixture_projects() {
    let source = JsonDirSource::new(fixtures_dir());
    assert_eq!(
        source.list_projects().unwrap(),
        vec!["empty", "food", "games"]
    );
}

#[test]
fn test_missing_project_is_not_found() {
    let source = JsonDirSource::new(fixtures_dir());
    assert!(matches!(
        source.require("nope"),
        Err(Error::DocumentNotFound(_))
    ));
}

// ============================================
// Normalization
// ============================================

#[test]
fn test_food_records_sorted_and_keyed() {
    let records = load("food");

    // Non-object entries are dropped; play count descending
    assert_eq!(keys(&records), vec!["BV1xx1-3", "BV1xx1", "BV1xx2", "food-2"]);
    let plays: Vec<u64> = records.iter().map(|r| r.play_count).collect();
    assert_eq!(plays, vec![1_500_000, 125_000, 8_800, 0]);
}

#[test]
fn test_food_field_aliases() {
    let records = load("food");

    let tutorial = &records[1];
    assert_eq!(tutorial.title, "懒人必看美食教程");
    assert_eq!(tutorial.uploader, "小厨");
    assert_eq!(tutorial.danmaku_count, 340);
    assert_eq!(tutorial.duration, "05:12");
    assert_eq!(tutorial.publish_time, "2024-03-01 08:00:00");
    assert_eq!(
        tutorial.cover_url.as_deref(),
        Some("https://i0.hdslb.com/bfs/archive/a.jpg")
    );
    assert_eq!(
        tutorial.video_url.as_deref(),
        Some("https://www.bilibili.com/video/BV1xx1")
    );

    let vlog = &records[2];
    assert_eq!(vlog.uploader, "探店王");
    assert_eq!(vlog.danmaku_count, 56);
    assert_eq!(vlog.duration, "01:35");
    assert_eq!(
        vlog.cover_url.as_deref(),
        Some("https://i0.hdslb.com/bfs/archive/b.jpg")
    );
}

#[test]
fn test_food_placeholders_and_fallbacks() {
    let records = load("food");

    let blank = &records[3];
    assert_eq!(blank.title, "未命名稿件");
    assert_eq!(blank.uploader, "未知投稿者");
    assert_eq!(blank.play_count, 0);
    assert_eq!(blank.duration, "00:00");
    assert_eq!(blank.publish_time, "去年夏天");
    assert!(blank.cover_url.is_none());

    let millis = &records[0];
    let expected = Local
        .timestamp_millis_opt(1_704_067_200_000)
        .unwrap()
        .format("%Y-%m-%d %H:%M:%S")
        .to_string();
    assert_eq!(millis.publish_time, expected);
}

#[test]
fn test_games_keyed_map() {
    let records = load("games");
    assert_eq!(keys(&records), vec!["BV9", "games-1"]);

    let guide = &records[0];
    assert_eq!(guide.play_count, 3_000);
    assert_eq!(guide.duration, "1:02:03");
    assert_eq!(guide.duration_secs(), 3_723);
    let expected = Local
        .timestamp_opt(1_700_000_000, 0)
        .unwrap()
        .format("%Y-%m-%d %H:%M:%S")
        .to_string();
    assert_eq!(guide.publish_time, expected);

    let speedrun = &records[1];
    assert_eq!(speedrun.play_count, 1);
    assert_eq!(speedrun.publish_time, "2024-05-17 12:00:00");
}

#[test]
fn test_unsupported_data_shape_is_empty() {
    assert!(load("empty").is_empty());
}

#[test]
fn test_normalization_is_idempotent() {
    assert_eq!(load("food"), load("food"));
}

// ============================================
// Analytics
// ============================================

#[test]
fn test_food_report() {
    let records = load("food");
    let report = build_report(&records, &AnalyticsOptions::default(), &clock());

    assert_eq!(report.totals.records, 4);
    assert_eq!(report.totals.total_plays, 1_633_800);
    assert_eq!(report.totals.total_danmaku, 396);
    assert_eq!(report.totals.dated_records, 4);

    let play: Vec<u64> = report.play_histogram.iter().map(|b| b.count).collect();
    assert_eq!(play, vec![1, 0, 1, 0, 0, 1, 0, 1]);

    let duration: Vec<u64> = report.duration_histogram.iter().map(|b| b.count).collect();
    assert_eq!(duration, vec![2, 1, 0, 1, 0, 0]);

    assert_eq!(keys(&report.top_by_plays), keys(&records));
    assert_eq!(
        keys(&report.top_by_recency),
        vec!["BV1xx2", "BV1xx1", "BV1xx1-3"]
    );

    assert_eq!(report.keywords.len(), 1);
    assert_eq!(report.keywords[0].word, "美食");
    assert_eq!(report.keywords[0].count, 2);

    let days: Vec<&str> = report.timeline.iter().map(|p| p.day.as_str()).collect();
    assert_eq!(days.len(), 3);
    assert_eq!(&days[1..], &["2024-03-01", "2024-03-02"]);
    assert!(report
        .timeline
        .windows(2)
        .all(|w| w[0].day_start <= w[1].day_start));
}

#[test]
fn test_histograms_cover_every_record() {
    for project in ["food", "games"] {
        let records = load(project);
        let report = build_report(&records, &AnalyticsOptions::default(), &clock());
        let play_sum: u64 = report.play_histogram.iter().map(|b| b.count).sum();
        let duration_sum: u64 = report.duration_histogram.iter().map(|b| b.count).sum();
        assert_eq!(play_sum, records.len() as u64);
        assert_eq!(duration_sum, records.len() as u64);
    }
}

#[test]
fn test_top_n_truncates() {
    let records = load("food");
    let options = AnalyticsOptions {
        top_n: 2,
        ..AnalyticsOptions::default()
    };
    let report = build_report(&records, &options, &clock());
    assert_eq!(keys(&report.top_by_plays), vec!["BV1xx1-3", "BV1xx1"]);
    assert_eq!(keys(&report.top_by_recency), vec!["BV1xx2", "BV1xx1"]);
}

#[test]
fn test_games_keywords_lowercased() {
    let records = load("games");
    let report = build_report(&records, &AnalyticsOptions::default(), &clock());
    assert_eq!(report.keywords.len(), 1);
    assert_eq!(report.keywords[0].word, "guide");
    assert_eq!(report.keywords[0].count, 2);
}

#[test]
fn test_report_serializes_camel_case() {
    let records = load("food");
    let report = build_report(&records, &AnalyticsOptions::default(), &clock());
    let value = serde_json::to_value(&report).unwrap();

    assert!(value["playHistogram"].is_array());
    assert_eq!(value["totals"]["totalPlays"], 1_633_800);
    assert_eq!(value["topByPlays"][0]["playCount"], 1_500_000);
    assert_eq!(value["topByPlays"][3]["publishTime"], "去年夏天");
    assert!(value["timeline"][0]["dayStartMs"].is_i64());
}

// ============================================
// Chat prompt
// ============================================

#[test]
fn test_prompt_from_fixture() {
    let source = JsonDirSource::new(fixtures_dir());
    let doc = source.require("food").unwrap();
    let records = normalize_project(&doc, &NormalizeOptions::default(), &clock());

    let prompt = build_system_prompt(&doc.id, doc.name.as_deref(), &records, 2);
    assert!(prompt.contains("Project name: 美食探索"));
    assert!(prompt.contains("Total plays: 1633800"));
    assert!(prompt.contains("重复的键"));
    assert!(prompt.contains("懒人必看美食教程"));
    assert!(!prompt.contains("美食探店vlog"));
    assert!(!prompt.contains(UNKNOWN_PUBLISH_TIME));
}
