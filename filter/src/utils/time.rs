//! Time utility functions

use chrono::{DateTime, NaiveDate, Utc};

/// Parse an RFC 3339 timestamp or a `YYYY-MM-DD` date to a UTC datetime.
///
/// Date-only input is taken at 00:00:00 UTC.
pub fn parse_date(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Unix seconds of a date string, as the object store expects date values
pub fn parse_date_to_unix(input: &str) -> Option<f64> {
    parse_date(input).map(|dt| {
        dt.timestamp() as f64 + f64::from(dt.timestamp_subsec_millis()) / 1000.0
    })
}
