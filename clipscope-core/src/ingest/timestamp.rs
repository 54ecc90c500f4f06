//! Publish-time resolution
//!
//! Turns whatever timestamp encoding an entry carries into the canonical
//! `YYYY-MM-DD HH:MM:SS` local-time string.
//!
//! Accepted encodings, per field value:
//! - document-store timestamp objects (`{seconds, nanoseconds}` or `{_seconds, _nanoseconds}`)
//! - numbers and all-digit strings: epoch milliseconds above 10^12, epoch seconds otherwise
//! - calendar strings (RFC 3339, `YYYY-MM-DD HH:MM[:SS]`, `YYYY/MM/DD`, `YYYY年MM月DD日`, `MM-DD`)
//! - relative phrases (`3小时前`, `昨天 12:30`, `2 days ago`, ...)
//!
//! Relative phrases and year-less dates need a "now". That comes from an
//! explicit [`ReferenceClock`] so the same input and clock always give the
//! same output.

use std::sync::OnceLock;

use chrono::{
    DateTime, Datelike, Duration, Local, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeZone,
};
use regex::Regex;
use serde_json::Value;

use super::fields::{first_defined, RawEntry, PUBLISH_TEXT_FIELDS, PUBLISH_TIME_FIELDS};
use crate::types::UNKNOWN_PUBLISH_TIME;

/// Numbers above this are epoch milliseconds; at or below, epoch seconds.
pub const MILLIS_THRESHOLD: f64 = 1e12;

/// Canonical publish-time layout.
pub const PUBLISH_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y.%m.%d %H:%M:%S",
    "%Y年%m月%d日 %H:%M:%S",
    "%Y年%m月%d日 %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%Y年%m月%d日"];

/// The "now" that relative phrases are resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceClock {
    now: DateTime<Local>,
}

impl ReferenceClock {
    /// Snapshot the system clock. Call once per request at the edge.
    pub fn now() -> Self {
        Self { now: Local::now() }
    }

    /// Pin the clock to a fixed instant.
    pub fn fixed(now: DateTime<Local>) -> Self {
        Self { now }
    }

    /// The reference instant.
    pub fn at(&self) -> DateTime<Local> {
        self.now
    }
}

/// Resolve an entry's publish time to its canonical string.
///
/// Timestamp fields are tried in priority order and the first one that
/// yields a valid instant wins. Failing that, the first non-empty
/// pre-formatted text field is returned verbatim. Otherwise the result is
/// [`UNKNOWN_PUBLISH_TIME`].
pub fn resolve_publish_time(entry: &RawEntry, clock: &ReferenceClock) -> String {
    for field in PUBLISH_TIME_FIELDS {
        let Some(value) = first_defined(entry, &[*field]) else {
            continue;
        };
        match coerce_instant(value, clock) {
            Some(instant) => return format_publish_time(&instant),
            None => {
                tracing::debug!(field = *field, value = %value, "Unparseable publish timestamp");
            }
        }
    }

    for field in PUBLISH_TEXT_FIELDS {
        if let Some(Value::String(text)) = entry.get(*field) {
            if !text.trim().is_empty() {
                return text.clone();
            }
        }
    }

    UNKNOWN_PUBLISH_TIME.to_string()
}

/// Format an instant in the canonical zero-padded local-time layout.
pub fn format_publish_time(instant: &DateTime<Local>) -> String {
    instant.format(PUBLISH_TIME_FORMAT).to_string()
}

/// Coerce one raw field value into an instant.
pub fn coerce_instant(value: &Value, clock: &ReferenceClock) -> Option<DateTime<Local>> {
    match value {
        Value::Number(n) => n.as_f64().and_then(from_epoch_number),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else if trimmed.bytes().all(|b| b.is_ascii_digit()) {
                trimmed.parse::<f64>().ok().and_then(from_epoch_number)
            } else {
                parse_time_text(trimmed, clock)
            }
        }
        Value::Object(map) => {
            if let Some(inner) = map.get("$date") {
                return coerce_instant(inner, clock);
            }
            let secs = map
                .get("seconds")
                .or_else(|| map.get("_seconds"))
                .and_then(Value::as_i64)?;
            let nanos = map
                .get("nanoseconds")
                .or_else(|| map.get("_nanoseconds"))
                .and_then(Value::as_u64)
                .unwrap_or(0);
            Local.timestamp_opt(secs, u32::try_from(nanos).ok()?).single()
        }
        _ => None,
    }
}

/// Epoch number to instant, milliseconds above [`MILLIS_THRESHOLD`].
fn from_epoch_number(n: f64) -> Option<DateTime<Local>> {
    if !n.is_finite() {
        return None;
    }
    let millis = if n > MILLIS_THRESHOLD { n } else { n * 1000.0 };
    if millis.abs() > i64::MAX as f64 {
        return None;
    }
    Local.timestamp_millis_opt(millis.trunc() as i64).single()
}

/// Parse free-form time text: relative phrases, then calendar layouts.
///
/// Canonical strings produced by [`format_publish_time`] round-trip to the
/// same instant (to the second).
pub fn parse_time_text(text: &str, clock: &ReferenceClock) -> Option<DateTime<Local>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Some(instant) = parse_relative(text, clock) {
        return Some(instant);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Local));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.with_timezone(&Local));
    }

    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return local_from_naive(naive);
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return local_from_naive(date.and_time(NaiveTime::MIN));
        }
    }

    parse_month_day(text, clock)
}

fn local_from_naive(naive: NaiveDateTime) -> Option<DateTime<Local>> {
    // Wall-clock times skipped by a DST jump have no local instant
    Local.from_local_datetime(&naive).earliest()
}

fn relative_ago_re() -> &'static Regex {
    static RELATIVE_AGO_RE: OnceLock<Regex> = OnceLock::new();
    RELATIVE_AGO_RE.get_or_init(|| {
        Regex::new(
            r"(?i)^(\d+)\s*(秒|分钟|分|小时|天|周|个月|月|年|seconds?|secs?|minutes?|mins?|hours?|hrs?|days?|weeks?|months?|years?)\s*(?:前|ago)$",
        )
        .expect("valid relative time regex")
    })
}

fn day_word_re() -> &'static Regex {
    static DAY_WORD_RE: OnceLock<Regex> = OnceLock::new();
    DAY_WORD_RE.get_or_init(|| {
        Regex::new(r"(?i)^(刚刚|just now|今天|today|昨天|yesterday|前天)\s*(?:(\d{1,2}):(\d{2}))?$")
            .expect("valid day word regex")
    })
}

fn month_day_re() -> &'static Regex {
    static MONTH_DAY_RE: OnceLock<Regex> = OnceLock::new();
    MONTH_DAY_RE.get_or_init(|| {
        Regex::new(r"^(\d{1,2})(?:-|/|月)(\d{1,2})日?(?:\s+(\d{1,2}):(\d{2}))?$")
            .expect("valid month-day regex")
    })
}

fn parse_relative(text: &str, clock: &ReferenceClock) -> Option<DateTime<Local>> {
    let now = clock.at();

    if let Some(caps) = relative_ago_re().captures(text) {
        let amount: i64 = caps[1].parse().ok()?;
        let unit = caps[2].to_lowercase();
        let months = |n: i64| u32::try_from(n).ok().map(Months::new);
        return match unit.as_str() {
            "秒" | "second" | "seconds" | "sec" | "secs" => {
                now.checked_sub_signed(Duration::try_seconds(amount)?)
            }
            "分钟" | "分" | "minute" | "minutes" | "min" | "mins" => {
                now.checked_sub_signed(Duration::try_minutes(amount)?)
            }
            "小时" | "hour" | "hours" | "hr" | "hrs" => {
                now.checked_sub_signed(Duration::try_hours(amount)?)
            }
            "天" | "day" | "days" => now.checked_sub_signed(Duration::try_days(amount)?),
            "周" | "week" | "weeks" => now.checked_sub_signed(Duration::try_weeks(amount)?),
            "个月" | "月" | "month" | "months" => now.checked_sub_months(months(amount)?),
            "年" | "year" | "years" => now.checked_sub_months(months(amount.checked_mul(12)?)?),
            _ => None,
        };
    }

    let caps = day_word_re().captures(text)?;
    let word = caps[1].to_lowercase();
    let days_back = match word.as_str() {
        "刚刚" | "just now" => return Some(now),
        "今天" | "today" => 0,
        "昨天" | "yesterday" => 1,
        "前天" => 2,
        _ => return None,
    };

    let shifted = now.checked_sub_signed(Duration::try_days(days_back)?)?;
    match (caps.get(2), caps.get(3)) {
        (Some(h), Some(m)) => {
            let time = NaiveTime::from_hms_opt(h.as_str().parse().ok()?, m.as_str().parse().ok()?, 0)?;
            local_from_naive(shifted.date_naive().and_time(time))
        }
        _ => Some(shifted),
    }
}

/// `MM-DD`, `MM/DD`, `M月D日`, optionally with `HH:MM`, in the clock's year.
fn parse_month_day(text: &str, clock: &ReferenceClock) -> Option<DateTime<Local>> {
    let caps = month_day_re().captures(text)?;
    let month: u32 = caps[1].parse().ok()?;
    let day: u32 = caps[2].parse().ok()?;
    let date = NaiveDate::from_ymd_opt(clock.at().year(), month, day)?;

    let time = match (caps.get(3), caps.get(4)) {
        (Some(h), Some(m)) => NaiveTime::from_hms_opt(h.as_str().parse().ok()?, m.as_str().parse().ok()?, 0)?,
        _ => NaiveTime::MIN,
    };
    local_from_naive(date.and_time(time))
}
