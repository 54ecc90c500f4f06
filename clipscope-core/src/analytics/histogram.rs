//! Fixed-bucket histograms over play counts and durations.
//!
//! Buckets are half-open `[lower, upper)` ranges; the last bucket has no
//! upper bound, so every record lands in exactly one bucket.

use serde::Serialize;

use crate::types::VideoRecord;

/// Lower bounds of the play-count buckets. The next bound is the exclusive upper edge.
pub const PLAY_COUNT_BOUNDS: [u64; 8] = [
    0, 1_000, 5_000, 10_000, 50_000, 100_000, 500_000, 1_000_000,
];

const PLAY_COUNT_LABELS: [&str; 8] = [
    "<1K", "1K-5K", "5K-10K", "10K-50K", "50K-100K", "100K-500K", "500K-1M", "1M+",
];

/// Lower bounds of the duration buckets, in seconds.
pub const DURATION_BOUNDS: [u64; 6] = [0, 60, 180, 300, 600, 1_800];

const DURATION_LABELS: [&str; 6] = [
    "<1min", "1-3min", "3-5min", "5-10min", "10-30min", "30min+",
];

/// One histogram bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistogramBucket {
    /// Display label (e.g., "1K-5K")
    pub label: &'static str,
    /// Inclusive lower bound
    pub lower: u64,
    /// Exclusive upper bound; `None` for the catch-all bucket
    pub upper: Option<u64>,
    /// Records in this bucket
    pub count: u64,
}

/// Count records per play-count bucket.
pub fn play_count_histogram(records: &[VideoRecord]) -> Vec<HistogramBucket> {
    bucketize(
        &PLAY_COUNT_BOUNDS,
        &PLAY_COUNT_LABELS,
        records.iter().map(|r| r.play_count),
    )
}

/// Count records per duration bucket. Unparseable durations count as 0 seconds.
pub fn duration_histogram(records: &[VideoRecord]) -> Vec<HistogramBucket> {
    bucketize(
        &DURATION_BOUNDS,
        &DURATION_LABELS,
        records.iter().map(VideoRecord::duration_secs),
    )
}

fn bucketize(
    bounds: &[u64],
    labels: &[&'static str],
    values: impl Iterator<Item = u64>,
) -> Vec<HistogramBucket> {
    let mut buckets: Vec<HistogramBucket> = bounds
        .iter()
        .zip(labels)
        .enumerate()
        .map(|(i, (&lower, &label))| HistogramBucket {
            label,
            lower,
            upper: bounds.get(i + 1).copied(),
            count: 0,
        })
        .collect();

    for value in values {
        // Bounds start at 0, so there is always a match
        if let Some(bucket) = buckets
            .iter_mut()
            .find(|b| value >= b.lower && b.upper.map_or(true, |upper| value < upper))
        {
            bucket.count += 1;
        }
    }

    buckets
}
