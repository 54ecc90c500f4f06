//! Core domain types for clipscope
//!
//! These types represent the raw project document (Layer 0) and the
//! canonical video record (Layer 1) that every derived view is built from.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Project** | A named collection of crawled video entries, stored as one document |
//! | **Raw entry** | One upstream video record with inconsistent field naming |
//! | **Canonical record** | A normalized [`VideoRecord`] with a stable schema |
//! | **Danmaku** | Overlay comments shown on top of a playing video |
//! | **Uploader** | The account that published the video |

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ingest::{fields, timestamp, ReferenceClock};

/// Sentinel stored in [`VideoRecord::publish_time`] when no timestamp could be resolved.
pub const UNKNOWN_PUBLISH_TIME: &str = "unknown";

// ============================================
// Raw project document
// ============================================

/// A project document as returned by the document store.
///
/// Only `id` is trusted. `data` may be absent, malformed or hold
/// non-object entries; the normalizer tolerates all of these.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawProjectDocument {
    /// Document identifier (the project id)
    pub id: String,
    /// Display name, if the document carries one
    pub name: Option<String>,
    /// Creation timestamp in whatever encoding the store used
    pub created_at: Option<Value>,
    /// Nested entry collection (array or keyed map)
    pub data: Value,
}

impl RawProjectDocument {
    /// Create a document from an id and a `data` payload.
    pub fn new(id: impl Into<String>, data: Value) -> Self {
        Self {
            id: id.into(),
            name: None,
            created_at: None,
            data,
        }
    }

    /// Build a document from an arbitrary JSON value without rejecting it.
    ///
    /// An object contributes `id`, `name`, `createdAt` and `data`; a bare
    /// array is taken as the `data` payload itself. `fallback_id` is used
    /// when the value carries no usable id.
    pub fn from_value(fallback_id: &str, value: Value) -> Self {
        match value {
            Value::Object(mut map) => {
                let id = fields::first_string(&map, &["id", "projectId", "_id"])
                    .unwrap_or_else(|| fallback_id.to_string());
                let name = fields::first_string(&map, &["name", "projectName", "title"]);
                let created_at = ["createdAt", "created_at", "createTime"]
                    .iter()
                    .find_map(|k| map.get(*k).filter(|v| !v.is_null()).cloned());
                let data = map.remove("data").unwrap_or(Value::Null);
                Self {
                    id,
                    name,
                    created_at,
                    data,
                }
            }
            Value::Array(_) => Self::new(fallback_id, value),
            _ => Self::new(fallback_id, Value::Null),
        }
    }

    /// Name for display, falling back to the id.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

// ============================================
// Canonical video record
// ============================================

/// A normalized video entry.
///
/// Constructed fresh on every normalization pass and never mutated
/// afterwards. Serializes with camelCase field names for the presentation
/// layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecord {
    /// Unique within one normalized project
    pub key: String,
    /// Never empty; placeholder when the entry had no title
    pub title: String,
    /// Never empty; placeholder when the entry had no uploader
    pub uploader: String,
    pub play_count: u64,
    pub danmaku_count: u64,
    /// `HH:MM:SS` or `MM:SS`
    pub duration: String,
    /// `YYYY-MM-DD HH:MM:SS` in local time, verbatim upstream text, or [`UNKNOWN_PUBLISH_TIME`]
    pub publish_time: String,
    pub cover_url: Option<String>,
    pub video_url: Option<String>,
}

impl VideoRecord {
    /// Whether a publish time was resolved at all.
    pub fn has_publish_time(&self) -> bool {
        self.publish_time != UNKNOWN_PUBLISH_TIME
    }

    /// Parse the stored publish time back into an instant.
    ///
    /// Uses the same text rules as normalization, so verbatim relative
    /// phrases resolve against `clock`.
    pub fn publish_instant(&self, clock: &ReferenceClock) -> Option<DateTime<Local>> {
        if !self.has_publish_time() {
            return None;
        }
        timestamp::parse_time_text(&self.publish_time, clock)
    }

    /// Duration in whole seconds; 0 when the text is not `HH:MM:SS` or `MM:SS`.
    pub fn duration_secs(&self) -> u64 {
        parse_duration_secs(&self.duration)
    }
}

/// Parse `HH:MM:SS` or `MM:SS` into seconds. Anything else is 0.
///
/// Values too large to represent in seconds also yield 0.
pub fn parse_duration_secs(text: &str) -> u64 {
    let parts: Option<Vec<u64>> = text
        .trim()
        .split(':')
        .map(|p| p.trim().parse::<u64>().ok())
        .collect();

    let secs = match parts.as_deref() {
        Some([h, m, s]) => h
            .checked_mul(3600)
            .and_then(|h| m.checked_mul(60).and_then(|m| h.checked_add(m)))
            .and_then(|hm| hm.checked_add(*s)),
        Some([m, s]) => m.checked_mul(60).and_then(|m| m.checked_add(*s)),
        _ => None,
    };
    secs.unwrap_or(0)
}
