//! # clipscope-core
//!
//! Core library for clipscope - a dashboard over crawled video metadata.
//!
//! This library provides:
//! - Record normalization from loosely-typed project documents
//! - Derived analytics (histograms, rankings, keyword table, timeline)
//! - A pluggable document source with a JSON directory backend
//! - Chat prompt building and a streaming chat-completion client
//! - Configuration management and logging infrastructure
//!
//! ## Architecture
//!
//! Data flows through three layers:
//! - **Layer 0 (Raw):** Project documents with arbitrarily shaped `data`
//! - **Layer 1 (Canonical):** [`VideoRecord`]s, rebuilt on every normalization pass
//! - **Layer 2 (Derived):** [`analytics::AnalyticsReport`] views (regenerable)
//!
//! ## Example
//!
//! ```rust,no_run
//! use clipscope_core::analytics::{build_report, AnalyticsOptions};
//! use clipscope_core::ingest::{normalize_project, NormalizeOptions, ReferenceClock};
//! use clipscope_core::source::{DocumentSource, JsonDirSource};
//! use clipscope_core::Config;
//!
//! let config = Config::load().expect("failed to load config");
//! let source = JsonDirSource::new(config.documents_dir());
//! let doc = source.fetch("demo").expect("read failed").expect("no such project");
//!
//! let clock = ReferenceClock::now();
//! let options = NormalizeOptions::from_config(&config.normalize);
//! let records = normalize_project(&doc, &options, &clock);
//! let report = build_report(&records, &AnalyticsOptions::from_config(&config.analytics), &clock);
//! println!("{} records, {} keywords", records.len(), report.keywords.len());
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use error::{Error, Result};
pub use types::*;

// Public modules
pub mod analytics;
pub mod chat;
pub mod config;
pub mod error;
pub mod format;
pub mod ingest;
pub mod logging;
pub mod source;
pub mod types;
