// src/stats.rs

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::record::Record;

const DIMENSIONS: usize = 6;

/// The dimensions a [`Stats`] store counts by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatType {
    /// Client addresses.
    Ips,
    StatusCodes,
    /// Request paths without the query string.
    Pages,
    /// Raw request targets, query string included.
    Hits,
    UserAgents,
    Extensions,
}

impl StatType {
    pub const ALL: [StatType; DIMENSIONS] = [
        StatType::Ips,
        StatType::StatusCodes,
        StatType::Pages,
        StatType::Hits,
        StatType::UserAgents,
        StatType::Extensions,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StatType::Ips => "ips",
            StatType::StatusCodes => "status_codes",
            StatType::Pages => "pages",
            StatType::Hits => "hits",
            StatType::UserAgents => "user_agents",
            StatType::Extensions => "extensions",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for StatType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatType {
    type Err = Error;

    /// Accepts the snake_case names plus a few CLI-friendly spellings
    /// (`status-codes`, `status`, `ua`, `ext`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        let stat = match normalized.as_str() {
            "ips" | "ip" => StatType::Ips,
            "status_codes" | "status" => StatType::StatusCodes,
            "pages" => StatType::Pages,
            "hits" => StatType::Hits,
            "user_agents" | "ua" => StatType::UserAgents,
            "extensions" | "ext" => StatType::Extensions,
            _ => return Err(Error::UnknownStatType(s.to_string())),
        };
        Ok(stat)
    }
}

/// One entry of a [`Stats::stats`] snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stat {
    pub name: String,
    pub value: u64,
}

impl Stat {
    pub fn new(name: impl Into<String>, value: u64) -> Self {
        Stat { name: name.into(), value }
    }
}

#[derive(Debug, Default)]
struct Tables {
    data: [HashMap<String, u64>; DIMENSIONS],
    count: u64,
    ipv6: u64,
}

impl Tables {
    fn table(&self, stat: StatType) -> &HashMap<String, u64> {
        &self.data[stat.index()]
    }

    fn bump(&mut self, stat: StatType, key: &str) -> u64 {
        let table = &mut self.data[stat.index()];
        // Avoid allocating the key again for already-seen values.
        match table.get_mut(key) {
            Some(v) => {
                *v += 1;
                *v - 1
            }
            None => {
                table.insert(key.to_string(), 1);
                0
            }
        }
    }
}

/// Running frequency tables for every [`StatType`], plus the total request
/// count and the number of distinct IPv6 clients.
///
/// All state sits behind one reader/writer lock: a record is applied as a
/// single write, snapshots are taken under a read.
#[derive(Debug, Default)]
pub struct Stats {
    inner: RwLock<Tables>,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one record into every table.
    pub fn record(&self, record: &Record) {
        let clean_path = record.clean_path();
        let extension = record.extension();

        let mut tables = self.inner.write();
        // First sighting decides whether this address adds to the IPv6 tally.
        if tables.bump(StatType::Ips, &record.ip) == 0 && record.is_ipv6() {
            tables.ipv6 += 1;
        }
        tables.bump(StatType::StatusCodes, &record.status);
        tables.bump(StatType::Pages, clean_path);
        tables.bump(StatType::Hits, &record.filename);
        tables.bump(StatType::UserAgents, &record.user_agent);
        tables.bump(StatType::Extensions, extension);
        tables.count += 1;
    }

    /// Entries of `stat` seen at least `min` times (`0` keeps everything),
    /// most frequent first. Ties come out in no particular order.
    pub fn stats(&self, stat: StatType, min: u64) -> Vec<Stat> {
        let mut out: Vec<Stat> = {
            let tables = self.inner.read();
            tables
                .table(stat)
                .iter()
                .filter(|(_, value)| **value >= min)
                .map(|(name, &value)| Stat::new(name.as_str(), value))
                .collect()
        };

        // sorted outside the lock
        out.sort_unstable_by(|a, b| b.value.cmp(&a.value));
        out
    }

    /// Number of records aggregated so far.
    pub fn count(&self) -> u64 {
        self.inner.read().count
    }

    /// Distinct client addresses split into `(ipv4, ipv6)`.
    pub fn ips_count(&self) -> (u64, u64) {
        let tables = self.inner.read();
        let total = tables.table(StatType::Ips).len() as u64;
        (total - tables.ipv6, tables.ipv6)
    }

    /// Number of distinct keys in one table.
    pub fn distinct(&self, stat: StatType) -> usize {
        self.inner.read().table(stat).len()
    }
}
