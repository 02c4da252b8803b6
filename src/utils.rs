//! Small time helpers shared by the API layer

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::errors::Error;

/// Current wall-clock time as epoch milliseconds (the provider's
/// cache-busting `_` parameter)
#[must_use]
pub fn timestamp_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Convert the provider's `YYYY-MM-DD HH:MM:SS` datetime strings to epoch
/// milliseconds, treating them as UTC.
///
/// # Errors
///
/// Returns [`Error::Network`] (malformed response) if the string does not
/// match the provider's format.
pub fn datetime_to_timestamp_ms(datetime_str: &str) -> Result<i64, Error> {
    let parsed = NaiveDateTime::parse_from_str(datetime_str, "%Y-%m-%d %H:%M:%S")
        .map_err(|e| Error::malformed(format!("bad datetime {datetime_str:?}: {e}")))?;
    Ok(DateTime::<Utc>::from_naive_utc_and_offset(parsed, Utc).timestamp_millis())
}
