//! Top-N rankings by play count and by recency.

use chrono::{DateTime, Local};

use crate::ingest::ReferenceClock;
use crate::types::VideoRecord;

/// Highest play counts first. Ties keep their input order.
pub fn top_by_play_count(records: &[VideoRecord], n: usize) -> Vec<VideoRecord> {
    let mut ranked: Vec<&VideoRecord> = records.iter().collect();
    ranked.sort_by(|a, b| b.play_count.cmp(&a.play_count));
    ranked.into_iter().take(n).cloned().collect()
}

/// Most recently published first.
///
/// Records whose publish time does not parse (including the unknown
/// sentinel) are left out. Ties keep their input order.
pub fn top_by_recency(
    records: &[VideoRecord],
    n: usize,
    clock: &ReferenceClock,
) -> Vec<VideoRecord> {
    let mut dated: Vec<(DateTime<Local>, &VideoRecord)> = records
        .iter()
        .filter_map(|r| r.publish_instant(clock).map(|at| (at, r)))
        .collect();
    dated.sort_by(|a, b| b.0.cmp(&a.0));
    dated.into_iter().take(n).map(|(_, r)| r.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UNKNOWN_PUBLISH_TIME;
    use chrono::TimeZone;

    fn record(key: &str, play_count: u64, publish_time: &str) -> VideoRecord {
        VideoRecord {
            key: key.to_string(),
            title: key.to_string(),
            uploader: "u".to_string(),
            play_count,
            danmaku_count: 0,
            duration: "00:00".to_string(),
            publish_time: publish_time.to_string(),
            cover_url: None,
            video_url: None,
        }
    }

    fn keys(records: &[VideoRecord]) -> Vec<&str> {
        records.iter().map(|r| r.key.as_str()).collect()
    }

    fn clock() -> ReferenceClock {
        ReferenceClock::fixed(Local.with_ymd_and_hms(2024, 5, 20, 12, 0, 0).unwrap())
    }

    #[test]
    fn test_top_by_play_count_is_stable() {
        let records = vec![
            record("a", 10, UNKNOWN_PUBLISH_TIME),
            record("b", 30, UNKNOWN_PUBLISH_TIME),
            record("c", 10, UNKNOWN_PUBLISH_TIME),
            record("d", 20, UNKNOWN_PUBLISH_TIME),
        ];
        assert_eq!(keys(&top_by_play_count(&records, 3)), vec!["b", "d", "a"]);
        assert_eq!(keys(&top_by_play_count(&records, 10)), vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn test_top_by_play_count_truncates() {
        let records: Vec<_> = (0..30)
            .map(|i| record(&format!("k{}", i), i, UNKNOWN_PUBLISH_TIME))
            .collect();
        let top = top_by_play_count(&records, 20);
        assert_eq!(top.len(), 20);
        assert_eq!(top[0].play_count, 29);
        assert_eq!(top[19].play_count, 10);
    }

    #[test]
    fn test_top_by_recency_drops_unknown() {
        let records = vec![
            record("old", 1, "2023-01-01 00:00:00"),
            record("unknown", 2, UNKNOWN_PUBLISH_TIME),
            record("new", 3, "2024-05-01 08:00:00"),
            record("text", 4, "not a time"),
            record("mid", 5, "2023-06-01 00:00:00"),
        ];
        let top = top_by_recency(&records, 20, &clock());
        assert_eq!(keys(&top), vec!["new", "mid", "old"]);
    }

    #[test]
    fn test_top_by_recency_relative_text_and_ties() {
        let records = vec![
            record("first", 1, "2024-05-20 09:00:00"),
            record("relative", 2, "1小时前"),
            record("second", 3, "2024-05-20 09:00:00"),
        ];
        let top = top_by_recency(&records, 2, &clock());
        assert_eq!(keys(&top), vec!["relative", "first"]);
    }
}
