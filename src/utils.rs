//! Utility functions for the rating pipeline

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Date formats tried after the configured one
const FALLBACK_DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];
const FALLBACK_DATETIME_FORMATS: [&str; 3] =
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];

/// Parse a tournament date, trying the preferred format first
pub fn parse_date(value: &str, preferred_format: &str) -> Option<NaiveDate> {
    let value = value.trim();

    if let Ok(date) = NaiveDate::parse_from_str(value, preferred_format) {
        return Some(date);
    }

    if let Some(date) = FALLBACK_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
    {
        return Some(date);
    }

    if let Some(datetime) = FALLBACK_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
    {
        return Some(datetime.date());
    }

    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|datetime| datetime.date_naive())
}

/// Days since the Unix epoch, the time unit the drift is expressed in
pub fn days_since_epoch(date: NaiveDate) -> f64 {
    date.signed_duration_since(NaiveDate::default()).num_days() as f64
}

/// Stable key for a gamma value, used to name scenarios
pub fn gamma_key(gamma: f64) -> String {
    format!("{}", gamma)
}
