//! Timestamp and duration parsing for upstream payloads.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Activity timestamps, fractional seconds first.
const EVENT_TIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.fZ", "%Y-%m-%dT%H:%M:%SZ"];

/// Issue-tracker instants look like `2024-03-01T10:15:30.000+0000`.
const TRACKER_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%z";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse an activity event time (UTC, with or without fractional seconds).
#[must_use]
pub fn parse_event_time(raw: &str) -> Option<DateTime<Utc>> {
    EVENT_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Calendar date of an issue-tracker instant, in UTC.
#[must_use]
pub fn parse_tracker_date(raw: &str) -> Option<NaiveDate> {
    DateTime::parse_from_str(raw, TRACKER_TIME_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
        .map(|dt| dt.with_timezone(&Utc).date_naive())
        .or_else(|| parse_plain_date(raw))
}

#[must_use]
pub fn parse_plain_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

#[must_use]
pub fn format_plain_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// `H:M:S` to seconds. Anything that is not exactly three integer fields, or
/// that overflows, is 0.
#[must_use]
pub fn parse_hms_seconds(raw: &str) -> u64 {
    let mut parts = raw.trim().split(':');
    let (Some(h), Some(m), Some(s), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return 0;
    };
    match (
        h.trim().parse::<u64>(),
        m.trim().parse::<u64>(),
        s.trim().parse::<u64>(),
    ) {
        (Ok(h), Ok(m), Ok(s)) => h
            .checked_mul(3600)
            .zip(m.checked_mul(60))
            .and_then(|(h, m)| h.checked_add(m))
            .and_then(|hm| hm.checked_add(s))
            .unwrap_or(0),
        _ => 0,
    }
}
