// File: src/parsers/nginx.rs

use regex::Regex;
use std::sync::OnceLock;

use crate::record::Record;
use crate::time::parse_log_time;

/// `combined` log format. Status is the number right after the request's
/// closing quote, body size the one after it (`-` allowed for empty bodies).
const COMBINED_PATTERN: &str = concat!(
    r#"(?P<ip>\S+)\s[^\[]+\[(?P<time>[^\]]+)\]\s"#,
    r#""(?P<method>\w+) (?P<path>.+?)\sHTTP/(?P<version>\d(?:\.\d)?)"\s+"#,
    r#"(?P<status>\d+)\s+(?P<bytes>\d+|-)\s+"#,
    r#""(?P<referer>[^"]+)"\s+"(?P<ua>[^"]+)""#,
);

fn combined_regex() -> &'static Regex {
    static COMBINED_REGEX: OnceLock<Regex> = OnceLock::new();
    COMBINED_REGEX.get_or_init(|| Regex::new(COMBINED_PATTERN).expect("Invalid combined log regex"))
}

/// Matches one line against the combined grammar.
///
/// Best effort by contract: a line that doesn't match, or that matches more
/// than once (two entries glued together), yields `None` and is meant to be
/// dropped silently. A bad timestamp does not reject the line.
pub fn parse_nginx_line(line: &str) -> Option<Record> {
    let mut matches = combined_regex().captures_iter(line);
    let caps = matches.next()?;
    if matches.next().is_some() {
        return None;
    }

    Some(Record {
        ip: caps["ip"].to_string(),
        timestamp: parse_log_time(&caps["time"]),
        method: caps["method"].to_string(),
        filename: caps["path"].to_string(),
        status: caps["status"].to_string(),
        referer: caps["referer"].to_string(),
        user_agent: caps["ua"].to_string(),
    })
}
