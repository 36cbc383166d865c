//! Slot label resolution.
//!
//! Doctors publish slots as display strings such as `"Today, 09:00 AM"`,
//! `"Tomorrow, 02:30 PM"` or `"Mon, Oct 28, 09:00 AM"`. Everything that
//! orders or compares slots goes through [`resolve`], which turns a label into
//! a local date-time relative to a caller-supplied "now".

use std::cmp::Ordering;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{Datelike, Month, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use regex::Regex;
use thiserror::Error;
use tracing::debug;

/// The label could not be fully resolved. `fallback` is the best-effort
/// instant: the recognised day at midnight.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Malformed slot label '{label}': {reason}")]
pub struct MalformedSlotLabel {
    pub label: String,
    pub reason: String,
    pub fallback: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DayToken {
    Today,
    Tomorrow,
    Weekday(Weekday),
    MonthDay { month: u32, day: u32 },
}

fn time_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^(\d{1,2}):(\d{2})\s*(am|pm)$").expect("time pattern is valid")
    })
}

fn month_day_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([A-Za-z]+)\.?\s+(\d{1,2})$").expect("month/day pattern is valid")
    })
}

/// Resolve a label, reporting degraded resolutions as errors.
pub fn try_resolve(label: &str, now: NaiveDateTime) -> Result<NaiveDateTime, MalformedSlotLabel> {
    let segments: Vec<&str> = label
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    let (day_segments, time_segment) = match segments.split_last() {
        Some((last, rest)) if looks_like_time(last) => (rest, Some(*last)),
        _ => (segments.as_slice(), None),
    };

    let date = match resolve_date(day_segments, now.date()) {
        Ok(date) => date,
        Err(reason) => {
            return Err(MalformedSlotLabel {
                label: label.to_string(),
                reason,
                fallback: NaiveDateTime::new(now.date(), NaiveTime::default()),
            })
        }
    };
    let midnight = NaiveDateTime::new(date, NaiveTime::default());

    let Some(segment) = time_segment else {
        return Err(MalformedSlotLabel {
            label: label.to_string(),
            reason: "no time segment".to_string(),
            fallback: midnight,
        });
    };

    match parse_clock_time(segment) {
        Some(time) => Ok(NaiveDateTime::new(date, time)),
        None => Err(MalformedSlotLabel {
            label: label.to_string(),
            reason: format!("unreadable time '{}'", segment),
            fallback: midnight,
        }),
    }
}

/// Resolve a label to a local instant, degrading to the recognised day at
/// midnight when the time segment is missing or malformed.
pub fn resolve(label: &str, now: NaiveDateTime) -> NaiveDateTime {
    try_resolve(label, now).unwrap_or_else(|e| {
        debug!("{}; using {}", e, e.fallback);
        e.fallback
    })
}

/// Chronological ordering of two labels as of `now`.
pub fn compare(a: &str, b: &str, now: NaiveDateTime) -> Ordering {
    resolve(a, now).cmp(&resolve(b, now))
}

/// True when the slot resolves strictly after `now`.
pub fn is_future(label: &str, now: NaiveDateTime) -> bool {
    resolve(label, now) > now
}

fn looks_like_time(segment: &str) -> bool {
    let lower = segment.to_ascii_lowercase();
    segment.contains(':') || lower.ends_with("am") || lower.ends_with("pm")
}

fn parse_clock_time(segment: &str) -> Option<NaiveTime> {
    let caps = time_pattern().captures(segment)?;
    let hours: u32 = caps[1].parse().ok()?;
    let minutes: u32 = caps[2].parse().ok()?;

    if !(1..=12).contains(&hours) || minutes > 59 {
        return None;
    }

    let pm = caps[3].eq_ignore_ascii_case("pm");
    let hours = match (hours, pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, true) => h + 12,
        (h, false) => h,
    };

    NaiveTime::from_hms_opt(hours, minutes, 0)
}

/// The calendar day named by the label. An explicit month/day that does not
/// exist in the current year is an error.
fn resolve_date(day_segments: &[&str], today: NaiveDate) -> Result<NaiveDate, String> {
    match parse_day_token(day_segments) {
        Some(DayToken::Today) | None => Ok(today),
        Some(DayToken::Tomorrow) => Ok(today.succ_opt().unwrap_or(today)),
        Some(DayToken::Weekday(target)) => {
            let ahead = (target.num_days_from_monday() + 7
                - today.weekday().num_days_from_monday())
                % 7;
            Ok(today
                .checked_add_days(chrono::Days::new(u64::from(ahead)))
                .unwrap_or(today))
        }
        Some(DayToken::MonthDay { month, day }) => {
            NaiveDate::from_ymd_opt(today.year(), month, day).ok_or_else(|| {
                format!("no such date {:02}-{:02} in {}", month, day, today.year())
            })
        }
    }
}

fn parse_day_token(day_segments: &[&str]) -> Option<DayToken> {
    let first = day_segments.first()?;

    if first.eq_ignore_ascii_case("today") {
        return Some(DayToken::Today);
    }
    if first.eq_ignore_ascii_case("tomorrow") {
        return Some(DayToken::Tomorrow);
    }

    // An explicit date wins over a weekday: "Mon, Oct 28" means Oct 28.
    let month_day = day_segments.iter().find_map(|segment| {
        let caps = month_day_pattern().captures(segment)?;
        let month = Month::from_str(&caps[1]).ok()?;
        let day: u32 = caps[2].parse().ok()?;
        Some(DayToken::MonthDay {
            month: month.number_from_month(),
            day,
        })
    });
    if month_day.is_some() {
        return month_day;
    }

    Weekday::from_str(first).ok().map(DayToken::Weekday)
}
