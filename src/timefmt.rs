//! Timestamp and duration helpers.
//!
//! Kick is inconsistent about how it renders times: the VOD list uses
//! `2025-11-07 12:00:00` while chat messages carry `2025-11-07T12:00:00Z` or an
//! explicit offset. Everything is normalized to UTC here.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

/// Parses any of the timestamp shapes Kick emits. Naive times are UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let candidate = trimmed.replace(' ', "T");

    if let Ok(datetime) = DateTime::parse_from_rfc3339(&candidate) {
        return Some(datetime.with_timezone(&Utc));
    }
    if let Ok(datetime) = DateTime::parse_from_str(&candidate, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(datetime.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&candidate, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Renders a UTC timestamp as RFC 3339 with an explicit `+00:00` offset.
pub fn format_timestamp(datetime: DateTime<Utc>) -> String {
    datetime.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

/// `parse_timestamp` followed by `format_timestamp`; `None` when unparseable.
pub fn normalize_timestamp(raw: &str) -> Option<String> {
    parse_timestamp(raw).map(format_timestamp)
}

/// Renders milliseconds as `HH:MM:SS`. Hours keep counting past 24.
pub fn format_duration_ms(millis: i64) -> String {
    if millis < 0 {
        return "00:00:00".to_string();
    }
    let total = millis / 1000;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}
