//! Ingestion layer for raw project documents
//!
//! This module turns a raw project document (Layer 0) into canonical
//! video records (Layer 1).
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────────┐     ┌─────────────────┐
//! │ RawProjectDoc   │ ──► │ normalize_project│ ──► │  VideoRecord[]  │
//! │ (data: any)     │     │                  │     │ (play desc)     │
//! └─────────────────┘     └──────────────────┘     └─────────────────┘
//!                               │
//!                               ▼
//!                    ┌──────────────────────┐
//!                    │  fields (aliases)    │
//!                    │  timestamp (publish) │
//!                    └──────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use clipscope_core::ingest::{normalize_project, NormalizeOptions, ReferenceClock};
//! use clipscope_core::RawProjectDocument;
//! use serde_json::json;
//!
//! let doc = RawProjectDocument::new("demo", json!([{"title": "hello", "view": "42"}]));
//! let records = normalize_project(&doc, &NormalizeOptions::default(), &ReferenceClock::now());
//! assert_eq!(records[0].play_count, 42);
//! ```

pub mod fields;
mod normalizer;
pub mod timestamp;

pub use normalizer::{
    extract_entries, normalize_cover_url, normalize_entry, normalize_project, NormalizeOptions,
    DEFAULT_DURATION,
};
pub use timestamp::{resolve_publish_time, ReferenceClock};
