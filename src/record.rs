// src/record.rs

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

/// One matched access-log line.
///
/// `$remote_addr - $remote_user [$time_local] "$request" $status $body_bytes_sent "$http_referer" "$http_user_agent"`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub ip: String,
    /// `None` when `$time_local` didn't parse.
    pub timestamp: Option<DateTime<FixedOffset>>,
    pub method: String,
    /// Raw request target, query string included.
    pub filename: String,
    pub status: String,
    pub referer: String,
    pub user_agent: String,
}

impl Record {
    /// The request path with everything from the first `?` removed.
    pub fn clean_path(&self) -> &str {
        match self.filename.find('?') {
            Some(idx) => &self.filename[..idx],
            None => &self.filename,
        }
    }

    /// Extension of [`clean_path`](Self::clean_path), dot included.
    pub fn extension(&self) -> &str {
        path_extension(self.clean_path())
    }

    pub fn is_ipv6(&self) -> bool {
        self.ip.contains(':')
    }
}

/// Everything from the last `.` of the final `/` segment, or `""`.
///
/// Unlike `Path::extension` this keeps the dot and treats dotfiles
/// (`/.env`) as having an extension.
pub fn path_extension(path: &str) -> &str {
    for (idx, b) in path.bytes().enumerate().rev() {
        match b {
            b'.' => return &path[idx..],
            b'/' => break,
            _ => {}
        }
    }
    ""
}
