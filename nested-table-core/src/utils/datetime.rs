//! Date helpers for row fields and date inputs.
//!
//! Accepted inputs:
//! - RFC3339 strings (`2024-02-05T10:00:00Z`)
//! - plain dates (`2024-02-05`, taken as midnight UTC)
//! - Unix timestamps, seconds or milliseconds
//! - tagged objects `{"__type": "Date", "iso": "..."}`

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

/// Placeholder shown by date inputs when the value cannot be parsed.
pub const INVALID_DATE_INPUT: &str = "0000-00-00";

/// Parse a JSON field value into a UTC timestamp.
pub fn parse_date_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_date_str(s),
        Value::Number(n) => n.as_i64().and_then(parse_unix_timestamp),
        Value::Object(map) if map.get("__type").and_then(Value::as_str) == Some("Date") => {
            map.get("iso").and_then(Value::as_str).and_then(parse_date_str)
        }
        _ => None,
    }
}

fn parse_date_str(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc())
        })
}

/// Interpret a Unix timestamp; values above 10^11 are milliseconds.
fn parse_unix_timestamp(ts: i64) -> Option<DateTime<Utc>> {
    if ts > 100_000_000_000 {
        DateTime::from_timestamp_millis(ts)
    } else {
        DateTime::from_timestamp(ts, 0)
    }
}

/// `YYYY-MM-DD` value for a date input, or [`INVALID_DATE_INPUT`].
pub fn format_date_input(value: &Value) -> String {
    match parse_date_value(value) {
        Some(dt) => dt.format("%Y-%m-%d").to_string(),
        None => {
            log::warn!("Invalid date: {value}");
            INVALID_DATE_INPUT.to_string()
        }
    }
}

/// Rewrite a date-like string field of a row projection as RFC3339.
///
/// Missing, empty and non-string fields are left alone. Returns `true` if the
/// field was rewritten.
pub fn convert_string_to_date(row: &mut Value, field: &str) -> bool {
    let Some(slot) = row.get_mut(field) else {
        return false;
    };
    let Some(raw) = slot.as_str().filter(|s| !s.trim().is_empty()) else {
        return false;
    };
    match parse_date_str(raw) {
        Some(dt) => {
            *slot = Value::String(dt.to_rfc3339());
            true
        }
        None => {
            log::warn!("{field} is not a valid date string");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn formats_supported_inputs() {
        assert_eq!(format_date_input(&json!("2024-02-05T23:30:00Z")), "2024-02-05");
        assert_eq!(format_date_input(&json!("2024-02-05")), "2024-02-05");
        assert_eq!(format_date_input(&json!(1_707_091_200)), "2024-02-05");
        assert_eq!(format_date_input(&json!(1_707_091_200_000_i64)), "2024-02-05");
        assert_eq!(
            format_date_input(&json!({ "__type": "Date", "iso": "2024-02-05T00:00:00.000Z" })),
            "2024-02-05"
        );
    }

    #[test]
    fn invalid_input_uses_placeholder() {
        assert_eq!(format_date_input(&json!("not a date")), INVALID_DATE_INPUT);
        assert_eq!(format_date_input(&json!(null)), INVALID_DATE_INPUT);
        assert_eq!(format_date_input(&json!({ "iso": "2024-02-05" })), INVALID_DATE_INPUT);
    }

    #[test]
    fn converts_string_field_in_place() {
        let mut row = json!({ "createdAt": "2024-02-05", "name": "x", "empty": "" });
        assert!(convert_string_to_date(&mut row, "createdAt"));
        assert_eq!(row["createdAt"], "2024-02-05T00:00:00+00:00");
        assert!(!convert_string_to_date(&mut row, "name"));
        assert_eq!(row["name"], "x");
        assert!(!convert_string_to_date(&mut row, "empty"));
        assert!(!convert_string_to_date(&mut row, "missing"));
    }
}
