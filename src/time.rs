// src/time.rs

use chrono::{DateTime, FixedOffset};

/// `$time_local` layout, e.g. `10/Oct/2023:13:55:36 -0700`.
pub const LOG_TIME_FORMAT: &str = "%d/%b/%Y:%H:%M:%S %z";

/// Parses the bracketed timestamp of an access-log line.
/// Returns `None` when the text doesn't follow [`LOG_TIME_FORMAT`]; the line
/// itself is still valid in that case.
pub fn parse_log_time(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_str(raw.trim(), LOG_TIME_FORMAT).ok()
}
