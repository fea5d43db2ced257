//! Value parsers for command arguments.

use chrono::{DateTime, NaiveDate, Utc};
use dpdp_compliance::{ComplianceImpact, RightType};
use serde_json::Value;
use std::fmt::Display;
use strum::IntoEnumIterator;

fn names<T: IntoEnumIterator + Display>() -> String {
    T::iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ")
}

/// Parse a right type such as `erasure` or `withdraw_consent`.
pub fn parse_right(s: &str) -> Result<RightType, String> {
    s.replace('-', "_")
        .parse()
        .map_err(|_| format!("unknown right '{s}', expected one of: {}", names::<RightType>()))
}

/// Parse an audit impact level.
pub fn parse_impact(s: &str) -> Result<ComplianceImpact, String> {
    s.to_lowercase().parse().map_err(|_| {
        format!("unknown impact '{s}', expected one of: {}", names::<ComplianceImpact>())
    })
}

/// Parse a JSON object used as an event or request payload.
pub fn parse_details(s: &str) -> Result<Value, String> {
    match serde_json::from_str(s) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(_) => Err("details must be a JSON object".to_string()),
        Err(e) => Err(format!("invalid JSON: {e}")),
    }
}

/// Parse an RFC 3339 timestamp or a plain `YYYY-MM-DD` date (midnight UTC).
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(at) = DateTime::parse_from_rfc3339(s) {
        return Ok(at.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|at| at.and_utc())
        .ok_or_else(|| format!("invalid timestamp '{s}', expected RFC 3339 or YYYY-MM-DD"))
}
