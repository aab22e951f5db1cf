use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;

use crate::import::ImportError;

/// Tried in order. Fractional-second variants come first since exchange
/// exports commonly include them.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%Y.%m.%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M",
    "%Y.%m.%d %H:%M",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%m/%d/%Y"];

static DATE_SHAPED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\d{4}[-/.]\d{1,2}[-/.]\d{1,2}(?:[ T]\d{1,2}:\d{2}(?::\d{2}(?:\.\d{1,9})?)?)?|\d{1,2}/\d{1,2}/\d{4}(?: \d{1,2}:\d{2}(?::\d{2})?)?",
    )
    .expect("date pattern is valid")
});

/// Parse a whole cell or token. Naive values are taken as UTC.
pub fn parse_datetime(value: &str) -> Result<DateTime<Utc>, ImportError> {
    let value = value.trim().trim_start_matches('\u{feff}');
    if value.is_empty() || value == "--" {
        return Err(ImportError::DateParseFailure(value.to_string()));
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(dt.and_utc());
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, fmt) {
            if let Some(dt) = date.and_hms_opt(0, 0, 0) {
                return Ok(dt.and_utc());
            }
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    parse_epoch(value).ok_or_else(|| ImportError::DateParseFailure(value.to_string()))
}

/// Parse a timestamp at the start of free text, ignoring whatever follows it
pub fn parse_datetime_prefix(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim_start_matches(|c: char| c.is_whitespace() || c == ':' || c == '=');

    for fmt in DATETIME_FORMATS {
        if let Ok((dt, _)) = NaiveDateTime::parse_and_remainder(text, fmt) {
            return Some(dt.and_utc());
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok((date, _)) = NaiveDate::parse_and_remainder(text, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }

    None
}

/// First date-shaped token anywhere in the text
pub fn find_datetime(text: &str) -> Option<DateTime<Utc>> {
    find_all_datetimes(text).into_iter().next()
}

pub fn find_all_datetimes(text: &str) -> Vec<DateTime<Utc>> {
    DATE_SHAPED
        .find_iter(text)
        .filter_map(|m| parse_datetime(m.as_str()).ok())
        .collect()
}

fn parse_epoch(value: &str) -> Option<DateTime<Utc>> {
    if !value.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let n = value.parse::<i64>().ok()?;
    match value.len() {
        13 => DateTime::from_timestamp_millis(n),
        10 => DateTime::from_timestamp(n, 0),
        _ => None,
    }
}
