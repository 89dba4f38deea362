// File: src/parsers/mod.rs

pub mod nginx;

use crate::record::Record;

/// Turns one raw line into a [`Record`].
///
/// Surrounding whitespace and a trailing `\r` (CRLF logs) are ignored.
/// `None` means the line is not a well-formed access-log entry; callers drop
/// it without reporting anything.
pub fn parse_line(line: &str) -> Option<Record> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    nginx::parse_nginx_line(trimmed)
}
