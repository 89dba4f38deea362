// src/pipeline.rs

use crossbeam::channel::{bounded, Receiver, Sender};
use serde::Serialize;
use std::io::{self, BufRead, BufReader, Read};
use std::panic;
use std::thread;

use crate::config::ParserConfig;
use crate::error::Result;
use crate::parsers::parse_line;
use crate::record::Record;
use crate::stats::{Stat, StatType, Stats};

/// What one [`Parser::parse`] call went through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ParseSummary {
    /// Lines pulled off the stream.
    pub lines: u64,
    /// Lines that matched and were aggregated.
    pub records: u64,
}

impl ParseSummary {
    pub fn dropped(&self) -> u64 {
        self.lines.saturating_sub(self.records)
    }
}

/// Access-log parser that keeps running stats across every stream fed to it.
///
/// `Parser` is `Sync`: share it behind an `Arc` to query stats while other
/// threads are still parsing. Separate `parse` calls accumulate into the same
/// tables.
#[derive(Debug, Default)]
pub struct Parser {
    stats: Stats,
    config: ParserConfig,
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ParserConfig) -> Self {
        Parser {
            stats: Stats::new(),
            config: config.normalized(),
        }
    }

    pub fn config(&self) -> ParserConfig {
        self.config
    }

    /// Same as [`parse_with`](Self::parse_with) without a callback.
    pub fn parse<R: Read + Send>(&self, reader: R) -> Result<ParseSummary> {
        self.parse_with(reader, |_| {})
    }

    /// Reads `reader` to the end and aggregates every line that matches.
    ///
    /// One thread splits the stream into lines, `workers` threads match them,
    /// and the calling thread drains the matches: `callback` sees each record
    /// first, then the record is folded into the stats. Records arrive in
    /// whatever order the workers finish, not in line order.
    ///
    /// Unmatched lines are dropped. The call blocks until the stream is
    /// exhausted and every match is applied; a read error stops the stream,
    /// lets in-flight lines drain, and is returned.
    pub fn parse_with<R, F>(&self, reader: R, mut callback: F) -> Result<ParseSummary>
    where
        R: Read + Send,
        F: FnMut(&Record),
    {
        let workers = self.config.workers.max(1);
        let capacity = self.config.queue_capacity.max(1);
        tracing::debug!(workers, capacity, "starting parse pipeline");

        let (read, records) = thread::scope(|s| {
            let (line_tx, line_rx) = bounded::<String>(capacity);
            let (record_tx, record_rx) = bounded::<Record>(capacity);

            let producer = s.spawn(move || read_lines(reader, line_tx));
            for _ in 0..workers {
                let line_rx = line_rx.clone();
                let record_tx = record_tx.clone();
                s.spawn(move || match_lines(line_rx, record_tx));
            }
            // The record queue closes once the last worker hangs up.
            drop(line_rx);
            drop(record_tx);

            let mut records = 0u64;
            for record in record_rx.iter() {
                callback(&record);
                self.stats.record(&record);
                records += 1;
            }

            let read = producer.join().unwrap_or_else(|err| panic::resume_unwind(err));
            (read, records)
        });

        let lines = match read {
            Ok(lines) => lines,
            Err(err) => {
                tracing::warn!(error = %err, records, "log stream failed, pipeline stopped");
                return Err(err.into());
            }
        };

        let summary = ParseSummary { lines, records };
        tracing::debug!(
            lines = summary.lines,
            records = summary.records,
            dropped = summary.dropped(),
            "parse pipeline drained"
        );
        Ok(summary)
    }

    /// Matches and aggregates one line on the calling thread.
    /// Returns whether the line was a valid entry.
    pub fn push_line(&self, line: &str) -> bool {
        match parse_line(line) {
            Some(record) => {
                self.stats.record(&record);
                true
            }
            None => {
                tracing::trace!(line, "dropping unmatched line");
                false
            }
        }
    }

    /// See [`Stats::stats`].
    pub fn stats(&self, stat: StatType, min: u64) -> Vec<Stat> {
        self.stats.stats(stat, min)
    }

    pub fn count(&self) -> u64 {
        self.stats.count()
    }

    /// Distinct client addresses as `(ipv4, ipv6)`.
    pub fn ips_count(&self) -> (u64, u64) {
        self.stats.ips_count()
    }

    pub fn distinct(&self, stat: StatType) -> usize {
        self.stats.distinct(stat)
    }
}

/// Producer: newline-delimited lines, trailing `\r` removed, invalid UTF-8
/// replaced. Stops early without error if every worker is gone.
fn read_lines<R: Read>(reader: R, lines: Sender<String>) -> io::Result<u64> {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    let mut read = 0u64;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(read);
        }
        if buf.last() == Some(&b'\n') {
            buf.pop();
        }
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }

        read += 1;
        let line = String::from_utf8_lossy(&buf).into_owned();
        if lines.send(line).is_err() {
            return Ok(read);
        }
    }
}

fn match_lines(lines: Receiver<String>, records: Sender<Record>) {
    for line in lines.iter() {
        match parse_line(&line) {
            Some(record) => {
                if records.send(record).is_err() {
                    return;
                }
            }
            None => tracing::trace!(line = %line, "dropping unmatched line"),
        }
    }
}
