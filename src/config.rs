// src/config.rs

use serde::Deserialize;
use std::num::NonZeroUsize;
use std::thread;

use crate::error::Result;

/// Sizing for the parse pipeline.
///
/// Both fields fall back to the host's available parallelism when missing or
/// zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Matcher threads.
    pub workers: usize,
    /// Capacity of the line queue and of the record queue.
    pub queue_capacity: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        let cpus = available_parallelism();
        ParserConfig {
            workers: cpus,
            queue_capacity: cpus,
        }
    }
}

impl ParserConfig {
    pub fn with_workers(workers: usize) -> Self {
        ParserConfig {
            workers,
            queue_capacity: workers,
        }
        .normalized()
    }

    /// Reads a config like `{"workers": 8, "queue_capacity": 64}`.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: ParserConfig = serde_json::from_str(json)?;
        Ok(config.normalized())
    }

    /// Replaces zero sizes with the defaults.
    pub fn normalized(self) -> Self {
        let cpus = available_parallelism();
        ParserConfig {
            workers: if self.workers == 0 { cpus } else { self.workers },
            queue_capacity: if self.queue_capacity == 0 { cpus } else { self.queue_capacity },
        }
    }
}

fn available_parallelism() -> usize {
    thread::available_parallelism().map_or(1, NonZeroUsize::get)
}
