use std::collections::HashSet;
use std::io::{self, Cursor, Read};
use std::sync::Arc;
use std::thread;

use loglens_stats::{Error, Parser, ParserConfig, Stat, StatType};
use pretty_assertions::assert_eq;

fn line(ip: &str, path: &str, status: u16, bytes: u64, ua: &str) -> String {
    format!(r#"{ip} - - [10/Oct/2023:13:55:36 -0700] "GET {path} HTTP/1.1" {status} {bytes} "-" "{ua}""#)
}

/// Yields `data`, then fails every later read.
struct FailingReader {
    data: Cursor<Vec<u8>>,
}

impl Read for FailingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.data.read(buf)? {
            0 => Err(io::Error::new(io::ErrorKind::BrokenPipe, "disk went away")),
            n => Ok(n),
        }
    }
}

#[test]
fn end_to_end_example() {
    let input = concat!(
        r#"10.0.0.1 - - [10/Oct/2023:13:55:36 -0700] "GET /index.html HTTP/1.1" 200 512 "-" "curl/7.68.0""#,
        "\n",
        r#"2001:db8::1 - - [10/Oct/2023:13:55:37 -0700] "GET /index.html?v=2 HTTP/1.1" 404 0 "-" "curl/7.68.0""#,
        "\n",
    );

    let parser = Parser::new();
    parser.parse(Cursor::new(input)).unwrap();

    assert_eq!(parser.count(), 2);
    assert_eq!(parser.ips_count(), (1, 1));
    assert_eq!(parser.stats(StatType::Pages, 0), vec![Stat::new("/index.html", 2)]);

    let statuses = parser.stats(StatType::StatusCodes, 0);
    assert_eq!(statuses.len(), 2);
    assert!(statuses.contains(&Stat::new("200", 1)));
    assert!(statuses.contains(&Stat::new("404", 1)));

    let hits = parser.stats(StatType::Hits, 0);
    assert!(hits.contains(&Stat::new("/index.html", 1)));
    assert!(hits.contains(&Stat::new("/index.html?v=2", 1)));
    assert_eq!(parser.stats(StatType::Extensions, 0), vec![Stat::new(".html", 2)]);
    assert_eq!(parser.stats(StatType::UserAgents, 0), vec![Stat::new("curl/7.68.0", 2)]);
}

#[test]
fn status_is_not_body_size() {
    let parser = Parser::new();
    parser.parse(Cursor::new(line("10.0.0.1", "/", 503, 777, "ua"))).unwrap();
    assert_eq!(parser.stats(StatType::StatusCodes, 0), vec![Stat::new("503", 1)]);
}

#[test]
fn count_ignores_malformed_lines() {
    let mut input = String::new();
    for i in 0..500 {
        input.push_str(&line(&format!("10.0.{}.{}", i / 250, i % 250), "/a", 200, 1, "ua"));
        input.push('\n');
        if i % 5 == 0 {
            input.push_str("completely broken line\n");
            // user agent missing its closing quote
            input.push_str(r#"10.0.0.1 - - [10/Oct/2023:13:55:36 -0700] "GET / HTTP/1.1" 200 1 "-" "curl"#);
            input.push('\n');
        }
    }

    let parser = Parser::with_config(ParserConfig::with_workers(4));
    let summary = parser.parse(Cursor::new(input)).unwrap();

    assert_eq!(parser.count(), 500);
    assert_eq!(summary.records, 500);
    assert_eq!(summary.dropped(), 200);
}

#[test]
fn ip_counts_track_distinct_addresses() {
    let addrs = ["10.0.0.1", "10.0.0.2", "::1", "fe80::1", "2001:db8::7", "192.168.0.1"];
    let mut input = String::new();
    for round in 0..20 {
        for addr in &addrs[..=(round % addrs.len())] {
            input.push_str(&line(addr, "/", 200, 10, "ua"));
            input.push('\n');
        }
    }

    let parser = Parser::new();
    parser.parse(Cursor::new(input)).unwrap();

    let (v4, v6) = parser.ips_count();
    assert_eq!((v4, v6), (3, 3));
    assert_eq!((v4 + v6) as usize, parser.distinct(StatType::Ips));

    let ipv6: HashSet<String> = parser
        .stats(StatType::Ips, 0)
        .into_iter()
        .map(|s| s.name)
        .filter(|name| name.contains(':'))
        .collect();
    assert_eq!(ipv6.len() as u64, v6);
}

#[test]
fn threshold_and_ordering() {
    let mut input = String::new();
    for (path, n) in [("/hot", 12), ("/warm", 5), ("/cold", 2)] {
        for _ in 0..n {
            input.push_str(&line("10.0.0.1", path, 200, 1, "ua"));
            input.push('\n');
        }
    }

    let parser = Parser::new();
    parser.parse(Cursor::new(input)).unwrap();

    assert_eq!(
        parser.stats(StatType::Pages, 5),
        vec![Stat::new("/hot", 12), Stat::new("/warm", 5)]
    );
    let all = parser.stats(StatType::Pages, 0);
    assert_eq!(all.len(), 3);
    assert!(all.windows(2).all(|w| w[0].value >= w[1].value));
}

#[test]
fn repeated_parses_accumulate() {
    let parser = Parser::new();
    parser.parse(Cursor::new(line("10.0.0.1", "/a", 200, 1, "ua"))).unwrap();
    parser.parse(Cursor::new(line("10.0.0.1", "/a", 200, 1, "ua"))).unwrap();

    assert_eq!(parser.count(), 2);
    assert_eq!(parser.stats(StatType::Ips, 0), vec![Stat::new("10.0.0.1", 2)]);
    assert_eq!(parser.ips_count(), (1, 0));
}

#[test]
fn concurrent_parses_share_one_store() {
    let parser = Arc::new(Parser::with_config(ParserConfig::with_workers(2)));
    let handles: Vec<_> = (0..4)
        .map(|n| {
            let parser = Arc::clone(&parser);
            thread::spawn(move || {
                let input: String = (0..250)
                    .map(|i| line(&format!("10.{n}.0.{}", i % 50), "/x.js", 200, 1, "ua") + "\n")
                    .collect();
                parser.parse(Cursor::new(input)).unwrap()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap().records, 250);
    }
    assert_eq!(parser.count(), 1000);
    assert_eq!(parser.ips_count(), (200, 0));
    assert_eq!(parser.stats(StatType::Extensions, 0), vec![Stat::new(".js", 1000)]);
}

#[test]
fn stats_can_be_read_during_ingestion() {
    let parser = Arc::new(Parser::new());
    let input: String = (0..5000)
        .map(|i| line("2001:db8::1", &format!("/p{}", i % 10), 200, 1, "ua") + "\n")
        .collect();

    let writer = {
        let parser = Arc::clone(&parser);
        thread::spawn(move || parser.parse(Cursor::new(input)).unwrap())
    };

    let mut last = 0;
    while !writer.is_finished() {
        let count = parser.count();
        assert!(count >= last);
        last = count;
        let pages = parser.stats(StatType::Pages, 0);
        assert!(pages.windows(2).all(|w| w[0].value >= w[1].value));
        let (v4, v6) = parser.ips_count();
        assert_eq!(v4, 0);
        assert!(v6 <= 1);
    }

    writer.join().unwrap();
    assert_eq!(parser.count(), 5000);
    assert_eq!(parser.ips_count(), (0, 1));
}

#[test]
fn callback_runs_before_counters_update() {
    let parser = Parser::with_config(ParserConfig::with_workers(1));
    let input = format!("{}\n{}\n", line("10.0.0.1", "/", 200, 1, "ua"), line("10.0.0.2", "/", 200, 1, "ua"));

    let mut counts_seen = Vec::new();
    parser
        .parse_with(Cursor::new(input), |_| counts_seen.push(parser.count()))
        .unwrap();

    counts_seen.sort();
    assert_eq!(counts_seen, vec![0, 1]);
}

#[test]
fn read_errors_are_returned() {
    let mut data = String::new();
    for _ in 0..10 {
        data.push_str(&line("10.0.0.1", "/", 200, 1, "ua"));
        data.push('\n');
    }

    let parser = Parser::new();
    let reader = FailingReader {
        data: Cursor::new(data.into_bytes()),
    };
    let err = parser.parse(reader).unwrap_err();

    assert!(matches!(&err, Error::Io(e) if e.kind() == io::ErrorKind::BrokenPipe));
    // Everything read before the failure was still applied.
    assert_eq!(parser.count(), 10);
}
