pub mod config;
pub mod error;
pub mod parsers;
pub mod pipeline;
pub mod record;
pub mod stats;
pub mod time;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export for easy access
pub use config::ParserConfig;
pub use error::{Error, Result};
pub use parsers::parse_line;
pub use pipeline::{ParseSummary, Parser};
pub use record::Record;
pub use stats::{Stat, StatType, Stats};
