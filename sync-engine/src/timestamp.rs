//! Timestamp kit (C4): safe conversion of whatever shape a timestamp arrives
//! in (ISO-8601 string, epoch-ish number, or absent) to a single comparable
//! instant, plus the staleness-comparison helper used throughout the engine.

use chrono::{DateTime, Utc};
use serde_json::Value;

/// Converts a JSON value carrying a timestamp into a comparable instant.
///
/// Accepts an RFC3339/ISO-8601 string, a `{"_seconds": .., "_nanoseconds": ..}`
/// server-timestamp shape, or a bare epoch-milliseconds number. Returns `None`
/// when the value is absent or unparseable; callers treat `None` as
/// "equal to now" for staleness purposes (§9 of the spec this implements:
/// null/unparseable `updated_at` defaults to client-wins).
pub fn to_instant(value: Option<&Value>) -> Option<DateTime<Utc>> {
    let value = value?;
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => {
            let millis = n.as_i64()?;
            DateTime::from_timestamp_millis(millis)
        }
        Value::Object(map) => {
            let secs = map.get("_seconds").and_then(Value::as_i64)?;
            let nanos = map
                .get("_nanoseconds")
                .and_then(Value::as_i64)
                .unwrap_or(0) as u32;
            DateTime::from_timestamp(secs, nanos)
        }
        _ => None,
    }
}

/// Resolves a timestamp for staleness comparison: unparseable/absent becomes
/// "now", so a record with no usable `updated_at` never appears stale on its
/// own account and the default tilts toward client-wins, per the spec's
/// public contract on this point.
pub fn to_instant_or_now(value: Option<&Value>) -> DateTime<Utc> {
    to_instant(value).unwrap_or_else(Utc::now)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ordering3 {
    Less,
    Equal,
    Greater,
}

pub fn compare(a: DateTime<Utc>, b: DateTime<Utc>) -> Ordering3 {
    if a < b {
        Ordering3::Less
    } else if a > b {
        Ordering3::Greater
    } else {
        Ordering3::Equal
    }
}
