//! Analytics module for clipscope
//!
//! Pure, derived views over one snapshot of canonical records:
//! - Play-count and duration histograms ([`histogram`])
//! - Top-N by play count and by recency ([`ranking`])
//! - Title keyword frequency ([`keywords`])
//! - Publish-date scatter series ([`timeline`])
//! - Project totals
//!
//! Every view is recomputed wholesale from its input. No view reorders
//! records with equal scores, so the normalizer's play-count order is
//! the tie-breaker throughout.

pub mod histogram;
pub mod keywords;
pub mod ranking;
pub mod timeline;

pub use histogram::{duration_histogram, play_count_histogram, HistogramBucket};
pub use keywords::{keyword_frequencies, tokenize_title, KeywordCount};
pub use ranking::{top_by_play_count, top_by_recency};
pub use timeline::{publish_timeline, TimelinePoint};

use serde::Serialize;

use crate::config::AnalyticsConfig;
use crate::format::format_compact;
use crate::ingest::ReferenceClock;
use crate::types::VideoRecord;

/// Knobs for the derived views.
#[derive(Debug, Clone)]
pub struct AnalyticsOptions {
    /// Length of both rankings
    pub top_n: usize,
    /// Maximum keyword table size
    pub keyword_limit: usize,
    /// Minimum keyword frequency
    pub keyword_min_count: usize,
}

impl Default for AnalyticsOptions {
    fn default() -> Self {
        Self::from_config(&AnalyticsConfig::default())
    }
}

impl AnalyticsOptions {
    /// Build options from the `[analytics]` config section.
    pub fn from_config(config: &AnalyticsConfig) -> Self {
        Self {
            top_n: config.top_n,
            keyword_limit: config.keyword_limit,
            keyword_min_count: config.keyword_min_count,
        }
    }
}

/// Aggregate totals for a project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectTotals {
    /// Number of records
    pub records: u64,
    /// Sum of play counts
    pub total_plays: u64,
    /// Sum of danmaku counts
    pub total_danmaku: u64,
    /// Records with a resolved publish time
    pub dated_records: u64,
}

impl ProjectTotals {
    /// Compute totals over a record set.
    pub fn from_records(records: &[VideoRecord]) -> Self {
        records.iter().fold(Self::default(), |mut acc, r| {
            acc.records += 1;
            acc.total_plays = acc.total_plays.saturating_add(r.play_count);
            acc.total_danmaku = acc.total_danmaku.saturating_add(r.danmaku_count);
            if r.has_publish_time() {
                acc.dated_records += 1;
            }
            acc
        })
    }

    /// Mean play count, 0 for an empty project.
    pub fn average_plays(&self) -> u64 {
        if self.records == 0 {
            0
        } else {
            self.total_plays / self.records
        }
    }

    /// Format total plays for display (e.g., "14.2M").
    pub fn plays_display(&self) -> String {
        format_compact(self.total_plays)
    }

    /// Format total danmaku for display.
    pub fn danmaku_display(&self) -> String {
        format_compact(self.total_danmaku)
    }
}

/// Every derived view for one record snapshot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub totals: ProjectTotals,
    pub play_histogram: Vec<HistogramBucket>,
    pub duration_histogram: Vec<HistogramBucket>,
    pub top_by_plays: Vec<VideoRecord>,
    pub top_by_recency: Vec<VideoRecord>,
    pub keywords: Vec<KeywordCount>,
    pub timeline: Vec<TimelinePoint>,
}

/// Compute all views from one snapshot.
pub fn build_report(
    records: &[VideoRecord],
    options: &AnalyticsOptions,
    clock: &ReferenceClock,
) -> AnalyticsReport {
    let report = AnalyticsReport {
        totals: ProjectTotals::from_records(records),
        play_histogram: play_count_histogram(records),
        duration_histogram: duration_histogram(records),
        top_by_plays: top_by_play_count(records, options.top_n),
        top_by_recency: top_by_recency(records, options.top_n, clock),
        keywords: keyword_frequencies(records, options.keyword_min_count, options.keyword_limit),
        timeline: publish_timeline(records, clock),
    };

    tracing::debug!(
        records = records.len(),
        keywords = report.keywords.len(),
        timeline_points = report.timeline.len(),
        "Built analytics report"
    );

    report
}
