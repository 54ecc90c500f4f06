//! Field alias tables and value coercion for raw entries
//!
//! Upstream crawlers disagree on field names, so every canonical field is
//! resolved through an ordered alias list. The lists live here as named
//! constants; the normalizer only ever refers to them by name.

use serde_json::{Map, Value};

/// A raw upstream entry viewed as a generic key-value bag.
pub type RawEntry = Map<String, Value>;

/// Natural id first, then bvid-like ids.
pub const KEY_FIELDS: &[&str] = &["id", "bvid", "bvId", "BV"];

pub const TITLE_FIELDS: &[&str] = &["title", "videoTitle", "video_title", "name"];

pub const UPLOADER_FIELDS: &[&str] = &["uploader", "author", "up", "upName", "up_name", "owner"];

pub const PLAY_COUNT_FIELDS: &[&str] = &["playCount", "play_count", "view"];

pub const DANMAKU_COUNT_FIELDS: &[&str] = &["danmakuCount", "danmaku_count", "danmuCount", "reply"];

pub const DURATION_FIELDS: &[&str] = &["duration", "length"];

pub const COVER_FIELDS: &[&str] = &["cover", "pic", "coverUrl", "cover_url"];

pub const VIDEO_URL_FIELDS: &[&str] = &["videourl", "videoUrl", "url"];

/// Timestamp-bearing fields, tried in priority order.
pub const PUBLISH_TIME_FIELDS: &[&str] = &[
    "publishTime",
    "publishTimestamp",
    "publishTimeMs",
    "publish_time",
    "pubdate",
    "pub_time",
    "pubDate",
    "ctime",
    "createTime",
    "created_at",
    "createdAt",
];

/// Pre-formatted publish-time text, used verbatim when nothing parses.
pub const PUBLISH_TEXT_FIELDS: &[&str] = &[
    "publishTimeFormatted",
    "publishTimeRaw",
    "pubdateText",
    "pub_time_text",
    "time",
];

/// First alias whose value is present and not `null`.
pub fn first_defined<'a>(entry: &'a RawEntry, aliases: &[&str]) -> Option<&'a Value> {
    aliases
        .iter()
        .find_map(|alias| entry.get(*alias).filter(|v| !v.is_null()))
}

/// First alias holding a non-empty string after trimming.
pub fn first_string(entry: &RawEntry, aliases: &[&str]) -> Option<String> {
    aliases.iter().find_map(|alias| match entry.get(*alias) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    })
}

/// Like [`first_string`], but numeric ids count as text too.
pub fn first_id(entry: &RawEntry, aliases: &[&str]) -> Option<String> {
    aliases.iter().find_map(|alias| match entry.get(*alias) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Coerce a loosely-typed count into a non-negative integer.
///
/// Numbers and numeric strings are truncated toward zero; negatives clamp
/// to 0. Anything that does not parse to a finite number yields 0.
pub fn coerce_count(value: &Value) -> u64 {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Some(0.0)
            } else {
                trimmed.parse::<f64>().ok()
            }
        }
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };

    match number {
        Some(n) if n.is_finite() && n > 0.0 => n.trunc() as u64,
        _ => 0,
    }
}

/// Resolve a count field: coerce the first defined alias, else 0.
pub fn resolve_count(entry: &RawEntry, aliases: &[&str]) -> u64 {
    first_defined(entry, aliases).map(coerce_count).unwrap_or(0)
}

/// Resolve a duration as display text.
///
/// Strings are kept as given; a number is read as seconds and rendered
/// as `MM:SS`, or `HH:MM:SS` from one hour up.
pub fn resolve_duration(entry: &RawEntry, aliases: &[&str]) -> Option<String> {
    aliases.iter().find_map(|alias| match entry.get(*alias) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => n
            .as_f64()
            .filter(|secs| secs.is_finite() && *secs >= 0.0)
            .map(|secs| format_clock_secs(secs.trunc() as u64)),
        _ => None,
    })
}

/// Render seconds as `MM:SS` or `HH:MM:SS`.
pub fn format_clock_secs(total: u64) -> String {
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}
