//! Formatting helpers shared across front ends.

use chrono::{DateTime, Local};

use crate::ingest::ReferenceClock;

/// Format a count compactly (e.g., "950", "12.3K", "1.2M").
pub fn format_compact(count: u64) -> String {
    if count >= 1_000_000 {
        format!("{:.1}M", count as f64 / 1_000_000.0)
    } else if count >= 1_000 {
        format!("{:.1}K", count as f64 / 1_000.0)
    } else {
        count.to_string()
    }
}

/// Format a timestamp relative to the reference clock (e.g., "2h ago").
pub fn format_relative_time(ts: DateTime<Local>, clock: &ReferenceClock) -> String {
    let duration = clock.at().signed_duration_since(ts);

    if duration.num_seconds() < 0 {
        "just now".to_string()
    } else if duration.num_seconds() < 60 {
        format!("{}s ago", duration.num_seconds())
    } else if duration.num_minutes() < 60 {
        format!("{}m ago", duration.num_minutes())
    } else if duration.num_hours() < 24 {
        format!("{}h ago", duration.num_hours())
    } else if duration.num_days() < 7 {
        format!("{}d ago", duration.num_days())
    } else {
        ts.format("%b %d").to_string()
    }
}
