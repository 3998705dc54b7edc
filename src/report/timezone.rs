use chrono::NaiveDateTime;
use chrono_tz::Tz;

use crate::constants::report::STORED_TIMESTAMP_FORMAT;

/// Converts a stored UTC wall-clock timestamp to `tz`, keeping the same
/// `YYYY-MM-DD HH:MM:SS` format.
pub fn utc_to_local(stored: &str, tz: Tz) -> Result<String, chrono::ParseError> {
    let naive = NaiveDateTime::parse_from_str(stored.trim(), STORED_TIMESTAMP_FORMAT)?;
    let local = naive.and_utc().with_timezone(&tz);
    Ok(local.format(STORED_TIMESTAMP_FORMAT).to_string())
}
