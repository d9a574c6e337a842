//! Tabular file conventions: timestamp column names, timestamp formats, and
//! null tokens.

use chrono::{NaiveDate, NaiveDateTime};

/// Header names accepted as the timestamp column (case-insensitive).
pub const TIMESTAMP_COLUMNS: [&str; 3] = ["date", "datetime", "timestamp"];

/// Cell contents read as null (case-insensitive), besides the empty string.
const NULL_TOKENS: [&str; 5] = ["nan", "null", "na", "n/a", "none"];

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"];

/// Whether a header names the timestamp column.
pub fn is_timestamp_column(name: &str) -> bool {
    let name = name.trim();
    TIMESTAMP_COLUMNS
        .iter()
        .any(|c| c.eq_ignore_ascii_case(name))
}

/// Parse a date or date-time cell. Dates map to midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    for fmt in DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(ts);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// A cell that is neither a number nor a null token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotANumber;

/// Parse a numeric cell. `Ok(None)` is a null.
pub fn parse_value(raw: &str) -> Result<Option<f64>, NotANumber> {
    let raw = raw.trim();
    if raw.is_empty() || NULL_TOKENS.iter().any(|t| t.eq_ignore_ascii_case(raw)) {
        return Ok(None);
    }
    raw.parse::<f64>().map(Some).map_err(|_| NotANumber)
}
