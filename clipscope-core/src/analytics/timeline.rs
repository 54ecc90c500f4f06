//! Publish-date scatter series.
//!
//! One point per dated record, placed at the start of its local calendar
//! day with the record's play count as the y value.

use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone};
use serde::Serialize;

use crate::ingest::ReferenceClock;
use crate::types::VideoRecord;

/// A single scatter point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelinePoint {
    /// Start of the publish day (local midnight)
    pub day_start: DateTime<Local>,
    /// Same instant as epoch milliseconds, for chart axes
    pub day_start_ms: i64,
    /// Day label, `YYYY-MM-DD`
    pub day: String,
    pub play_count: u64,
    /// Tooltip title
    pub title: String,
    pub key: String,
}

/// Build the scatter series, days ascending.
///
/// Records without a parseable publish time are left out. Points on the
/// same day keep their input order.
pub fn publish_timeline(records: &[VideoRecord], clock: &ReferenceClock) -> Vec<TimelinePoint> {
    let mut points: Vec<TimelinePoint> = records
        .iter()
        .filter_map(|record| {
            let published = record.publish_instant(clock)?;
            let date = published.date_naive();
            let day_start = day_start(date).unwrap_or(published);
            Some(TimelinePoint {
                day_start,
                day_start_ms: day_start.timestamp_millis(),
                day: date.format("%Y-%m-%d").to_string(),
                play_count: record.play_count,
                title: record.title.clone(),
                key: record.key.clone(),
            })
        })
        .collect();

    points.sort_by(|a, b| a.day_start.cmp(&b.day_start));
    points
}

fn day_start(date: NaiveDate) -> Option<DateTime<Local>> {
    Local
        .from_local_datetime(&date.and_time(NaiveTime::MIN))
        .earliest()
}
