//! Shared HTTP utilities for the portfolio workspace.
//!
//! Provides common JSON error bodies and time conversions used by the
//! api-server and the config loader.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use std::time::SystemTime;

// ============================================================================
// JSON Response Helpers (framework-agnostic)
// ============================================================================

/// Create a structured error JSON with a default message based on the code.
///
/// Returns: `{"error": {"code": "<code>", "message": "<default message>"}}`
pub fn json_err(code: &str) -> serde_json::Value {
    let message = match code {
        "not_found" => "Resource not found",
        "bad_request" => "Bad request",
        "invalid_request" => "Invalid request",
        "upstream_unavailable" => "Testimonial storage is unavailable",
        "error" | "internal" => "Internal server error",
        _ => code, // Fallback to code as message for unknown codes
    };
    serde_json::json!({"error": {"code": code, "message": message}})
}

/// Create a structured error JSON with a custom message.
///
/// Returns: `{"error": {"code": "<code>", "message": "<message>"}}`
pub fn json_error_with_message(code: &str, message: &str) -> serde_json::Value {
    serde_json::json!({"error": {"code": code, "message": message}})
}

/// Create a structured error JSON listing per-field problems.
///
/// Returns:
/// `{"error": {"code": "<code>", "message": "<message>", "fields": [{"field": "..", "message": ".."}]}}`
pub fn json_field_errors<'a, I>(code: &str, message: &str, fields: I) -> serde_json::Value
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let fields: Vec<serde_json::Value> = fields
        .into_iter()
        .map(|(field, msg)| serde_json::json!({"field": field, "message": msg}))
        .collect();
    serde_json::json!({"error": {"code": code, "message": message, "fields": fields}})
}

// ============================================================================
// Time Utilities
// ============================================================================

/// Convert SystemTime to RFC3339 string (seconds precision, UTC).
pub fn system_time_to_rfc3339(t: SystemTime) -> String {
    let dt: DateTime<Utc> = t.into();
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse an RFC3339 string to SystemTime.
///
/// Returns an error if the string is not a valid RFC3339 timestamp.
pub fn rfc3339_to_system_time(s: &str) -> Result<SystemTime, chrono::ParseError> {
    let dt = DateTime::parse_from_rfc3339(s)?;
    Ok(dt.with_timezone(&Utc).into())
}

/// Parse either a plain `YYYY-MM-DD` date (taken as midnight UTC) or a full
/// RFC3339 timestamp.
pub fn parse_date_or_rfc3339(s: &str) -> Result<SystemTime, chrono::ParseError> {
    let s = s.trim();
    match NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        Ok(date) => {
            let midnight = date.and_time(chrono::NaiveTime::MIN).and_utc();
            Ok(midnight.into())
        }
        Err(_) => rfc3339_to_system_time(s),
    }
}
