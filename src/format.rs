// =============================================================================
// FORMAT MODULE
// =============================================================================
// Display formatting for dates, expiration dates and numbers.
//
// Formatters never fail: a value that can't be parsed is shown as received.
// =============================================================================

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::models::NO_EXPIRATION_SENTINEL;

/// Shown instead of an expiration date for items that don't expire.
pub const NO_EXPIRATION_LABEL: &str = "СГ отсутствует";

pub const DATE_FORMAT: &str = "%d.%m.%Y";
pub const DATE_TIME_FORMAT: &str = "%d.%m.%Y %H:%M";

/// Parse an ISO 8601 date or datetime, with or without offset.
fn parse_iso(value: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, pattern) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Format an ISO date string with a chrono pattern.
///
/// Empty input gives "", unparsable input is returned unchanged.
pub fn format_date(value: &str, pattern: &str) -> String {
    if value.is_empty() {
        return String::new();
    }
    match parse_iso(value) {
        Some(dt) => dt.format(pattern).to_string(),
        None => value.to_string(),
    }
}

pub fn format_date_time(value: &str) -> String {
    format_date(value, DATE_TIME_FORMAT)
}

/// Expiration date for display: absent, empty and the sentinel all mean
/// "no expiration".
pub fn format_expiration_date(value: Option<&str>) -> String {
    match value {
        None | Some("") | Some(NO_EXPIRATION_SENTINEL) => NO_EXPIRATION_LABEL.to_string(),
        Some(date) => format_date(date, DATE_FORMAT),
    }
}

/// Group thousands with a space: 1234567 -> "1 234 567".
pub fn format_number(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        grouped.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(c);
    }
    grouped
}
