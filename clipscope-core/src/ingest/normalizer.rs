//! Record normalizer
//!
//! Converts one [`RawProjectDocument`] into canonical [`VideoRecord`]s.
//!
//! # Error Handling
//!
//! Normalization never fails:
//!
//! - **Unsupported `data` shape** (missing, scalar): yields no records.
//! - **Non-object entries**: skipped, logged at debug level.
//! - **Unresolvable fields**: degrade to the defaults documented on
//!   [`VideoRecord`]; sibling fields and records are unaffected.
//! - **Duplicate natural keys**: the later entry gets a positional suffix.

use std::collections::HashSet;

use serde_json::Value;

use super::fields::{self, RawEntry};
use super::timestamp::{resolve_publish_time, ReferenceClock};
use crate::config::NormalizeConfig;
use crate::types::{RawProjectDocument, VideoRecord};

/// Default duration when an entry has none.
pub const DEFAULT_DURATION: &str = "00:00";

/// Settings that shape normalization output.
#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    /// Prefix for covers given as a bare filename
    pub cover_base_url: String,
    /// Title for entries without one
    pub placeholder_title: String,
    /// Uploader for entries without one
    pub placeholder_uploader: String,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self::from_config(&NormalizeConfig::default())
    }
}

impl NormalizeOptions {
    /// Build options from the `[normalize]` config section.
    pub fn from_config(config: &NormalizeConfig) -> Self {
        Self {
            cover_base_url: config.cover_base_url.clone(),
            placeholder_title: config.placeholder_title.clone(),
            placeholder_uploader: config.placeholder_uploader.clone(),
        }
    }
}

/// Normalize a project document, sorted by play count descending.
///
/// The sort is stable, so equal play counts keep their input order.
pub fn normalize_project(
    doc: &RawProjectDocument,
    options: &NormalizeOptions,
    clock: &ReferenceClock,
) -> Vec<VideoRecord> {
    let entries = extract_entries(&doc.data);
    let mut seen_keys: HashSet<String> = HashSet::with_capacity(entries.len());

    let mut records: Vec<VideoRecord> = entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let mut record = normalize_entry(entry, index, &doc.id, options, clock);
            record.key = claim_unique_key(&mut seen_keys, record.key, index);
            record
        })
        .collect();

    records.sort_by(|a, b| b.play_count.cmp(&a.play_count));

    tracing::debug!(
        project_id = %doc.id,
        records = records.len(),
        "Normalized project document"
    );

    records
}

/// Pull the object entries out of a document's `data` payload.
///
/// Arrays are used as-is and keyed maps contribute their values, both
/// filtered to objects. Any other shape yields nothing.
pub fn extract_entries(data: &Value) -> Vec<&RawEntry> {
    let candidates: Vec<&Value> = match data {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => map.values().collect(),
        Value::Null => return Vec::new(),
        other => {
            tracing::warn!(
                kind = json_kind(other),
                "Project data is neither an array nor a map, treating as empty"
            );
            return Vec::new();
        }
    };

    let total = candidates.len();
    let entries: Vec<&RawEntry> = candidates.into_iter().filter_map(Value::as_object).collect();
    if entries.len() < total {
        tracing::debug!(
            skipped = total - entries.len(),
            "Skipped non-object entries in project data"
        );
    }
    entries
}

/// Normalize a single entry at position `index`.
///
/// The key is the natural id when present, else `"<document_id>-<index>"`.
/// Uniqueness across a project is enforced by [`normalize_project`].
pub fn normalize_entry(
    entry: &RawEntry,
    index: usize,
    document_id: &str,
    options: &NormalizeOptions,
    clock: &ReferenceClock,
) -> VideoRecord {
    let key = fields::first_id(entry, fields::KEY_FIELDS)
        .unwrap_or_else(|| format!("{}-{}", document_id, index));

    VideoRecord {
        key,
        title: fields::first_string(entry, fields::TITLE_FIELDS)
            .unwrap_or_else(|| options.placeholder_title.clone()),
        uploader: fields::first_string(entry, fields::UPLOADER_FIELDS)
            .unwrap_or_else(|| options.placeholder_uploader.clone()),
        play_count: fields::resolve_count(entry, fields::PLAY_COUNT_FIELDS),
        danmaku_count: fields::resolve_count(entry, fields::DANMAKU_COUNT_FIELDS),
        duration: fields::resolve_duration(entry, fields::DURATION_FIELDS)
            .unwrap_or_else(|| DEFAULT_DURATION.to_string()),
        publish_time: resolve_publish_time(entry, clock),
        cover_url: fields::first_string(entry, fields::COVER_FIELDS)
            .map(|cover| normalize_cover_url(&cover, &options.cover_base_url)),
        video_url: fields::first_string(entry, fields::VIDEO_URL_FIELDS),
    }
}

/// Make a cover reference absolute.
///
/// Protocol-relative URLs get `https:`, absolute URLs pass through, and
/// anything else is a filename under `base`.
pub fn normalize_cover_url(cover: &str, base: &str) -> String {
    if cover.starts_with("//") {
        format!("https:{}", cover)
    } else if cover.starts_with("http://") || cover.starts_with("https://") {
        cover.to_string()
    } else {
        format!("{}{}", base, cover)
    }
}

fn claim_unique_key(seen: &mut HashSet<String>, key: String, index: usize) -> String {
    if seen.insert(key.clone()) {
        return key;
    }

    let mut candidate = format!("{}-{}", key, index);
    let mut attempt = 1;
    while !seen.insert(candidate.clone()) {
        candidate = format!("{}-{}-{}", key, index, attempt);
        attempt += 1;
    }
    tracing::debug!(key = %key, replacement = %candidate, "Duplicate record key");
    candidate
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UNKNOWN_PUBLISH_TIME;
    use chrono::{Local, TimeZone};
    use serde_json::json;

    fn clock() -> ReferenceClock {
        ReferenceClock::fixed(Local.with_ymd_and_hms(2024, 5, 20, 12, 0, 0).unwrap())
    }

    fn normalize(data: Value) -> Vec<VideoRecord> {
        let doc = RawProjectDocument::new("proj", data);
        normalize_project(&doc, &NormalizeOptions::default(), &clock())
    }

    #[test]
    fn test_scenario_numeric_strings_and_epoch() {
        let records = normalize(json!([
            {"playCount": "12345", "duration": "3:45", "publishTime": 1700000000}
        ]));
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.play_count, 12345);
        assert_eq!(r.duration, "3:45");
        let expected = Local
            .timestamp_opt(1700000000, 0)
            .unwrap()
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();
        assert_eq!(r.publish_time, expected);
    }

    #[test]
    fn test_scenario_all_defaults() {
        let records = normalize(json!([{"irrelevant": true}]));
        let r = &records[0];
        assert_eq!(r.key, "proj-0");
        assert_eq!(r.title, "未命名稿件");
        assert_eq!(r.uploader, "未知投稿者");
        assert_eq!(r.play_count, 0);
        assert_eq!(r.danmaku_count, 0);
        assert_eq!(r.duration, "00:00");
        assert_eq!(r.publish_time, UNKNOWN_PUBLISH_TIME);
        assert_eq!(r.cover_url, None);
        assert_eq!(r.video_url, None);
    }

    #[test]
    fn test_scenario_cover_urls() {
        let records = normalize(json!([
            {"id": "a", "cover": "//example.com/a.jpg", "playCount": 3},
            {"id": "b", "cover": "abc.jpg", "playCount": 2},
            {"id": "c", "pic": "http://example.com/c.jpg", "playCount": 1}
        ]));
        assert_eq!(records[0].cover_url.as_deref(), Some("https://example.com/a.jpg"));
        assert_eq!(
            records[1].cover_url.as_deref(),
            Some("https://i0.hdslb.com/bfs/archive/abc.jpg")
        );
        assert_eq!(records[2].cover_url.as_deref(), Some("http://example.com/c.jpg"));
    }

    #[test]
    fn test_cover_uses_configured_base() {
        let options = NormalizeOptions {
            cover_base_url: "https://cdn.test/covers/".to_string(),
            ..NormalizeOptions::default()
        };
        let doc = RawProjectDocument::new("p", json!([{"cover": "abc.jpg"}]));
        let records = normalize_project(&doc, &options, &clock());
        assert_eq!(
            records[0].cover_url.as_deref(),
            Some("https://cdn.test/covers/abc.jpg")
        );
    }

    #[test]
    fn test_aliases() {
        let records = normalize(json!([{
            "bvid": "BV1xx411c7mD",
            "author": "某UP主",
            "name": "fallback title",
            "view": 10,
            "danmuCount": "4",
            "length": "10:00",
            "url": "https://www.bilibili.com/video/BV1xx411c7mD"
        }]));
        let r = &records[0];
        assert_eq!(r.key, "BV1xx411c7mD");
        assert_eq!(r.uploader, "某UP主");
        assert_eq!(r.title, "fallback title");
        assert_eq!(r.play_count, 10);
        assert_eq!(r.danmaku_count, 4);
        assert_eq!(r.duration, "10:00");
        assert_eq!(
            r.video_url.as_deref(),
            Some("https://www.bilibili.com/video/BV1xx411c7mD")
        );
    }

    #[test]
    fn test_keyed_map_and_non_objects() {
        let records = normalize(json!({
            "x": {"title": "first", "playCount": 1},
            "y": "not an entry",
            "z": {"title": "second", "playCount": 5}
        }));
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "second");
        assert_eq!(records[1].title, "first");
    }

    #[test]
    fn test_unsupported_shapes_yield_empty() {
        assert!(normalize(Value::Null).is_empty());
        assert!(normalize(json!("data")).is_empty());
        assert!(normalize(json!(42)).is_empty());
        assert!(normalize(json!([1, "two", null])).is_empty());
    }

    #[test]
    fn test_sorted_descending_and_stable() {
        let records = normalize(json!([
            {"title": "a", "playCount": 5},
            {"title": "b", "playCount": 50},
            {"title": "c", "playCount": 5},
            {"title": "d", "playCount": 500}
        ]));
        let titles: Vec<_> = records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["d", "b", "a", "c"]);
        assert!(records.windows(2).all(|w| w[0].play_count >= w[1].play_count));
    }

    #[test]
    fn test_keys_are_unique() {
        let records = normalize(json!([
            {"id": "dup"},
            {"id": "dup"},
            {"id": "dup-1"},
            {"bvid": "proj-3"},
            {}
        ]));
        let mut keys: Vec<_> = records.iter().map(|r| r.key.clone()).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), records.len());
        assert!(records.iter().any(|r| r.key == "dup"));
    }

    #[test]
    fn test_idempotent() {
        let data = json!([
            {"id": 1, "title": "x", "playCount": "7", "publishTime": "3天前"},
            {"title": "y", "view": 9, "cover": "c.jpg"}
        ]);
        assert_eq!(normalize(data.clone()), normalize(data));
    }

    #[test]
    fn test_normalize_cover_url() {
        assert_eq!(normalize_cover_url("//a/b.jpg", "B/"), "https://a/b.jpg");
        assert_eq!(normalize_cover_url("https://a/b.jpg", "B/"), "https://a/b.jpg");
        assert_eq!(normalize_cover_url("b.jpg", "B/"), "B/b.jpg");
    }
}
