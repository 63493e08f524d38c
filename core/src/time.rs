//! Time related utils.

use crate::Error;
use chrono::NaiveDateTime;
use chrono::Utc;

/// DateTime in UTC.
pub type DateTime = chrono::DateTime<Utc>;

/// Timestamp format used by the Query API: "2022-03-13T07:20:04Z"
const TIMESTAMP: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Create datetime of now.
pub fn now() -> DateTime {
    Utc::now()
}

/// Format time into a Query API timestamp: "2022-03-13T07:20:04Z"
///
/// Sub-second precision is dropped and the offset is always `Z`.
pub fn format_timestamp(t: DateTime) -> String {
    t.format(TIMESTAMP).to_string()
}

/// Parse a Query API timestamp like "2022-03-13T07:20:04Z".
pub fn parse_timestamp(s: &str) -> crate::Result<DateTime> {
    let t = NaiveDateTime::parse_from_str(s, TIMESTAMP).map_err(|e| {
        Error::unexpected(format!("parse '{s}' into timestamp failed")).with_source(e)
    })?;

    Ok(t.and_utc())
}
