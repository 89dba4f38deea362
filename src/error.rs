// src/error.rs

use thiserror::Error;

/// Errors surfaced by the crate.
///
/// Lines that don't match the access-log grammar are never errors; they are
/// dropped inside the pipeline. Only a failing input stream reaches the caller
/// of [`Parser::parse`](crate::Parser::parse).
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read log stream: {0}")]
    Io(#[from] std::io::Error),

    #[error("unknown stat type: '{0}'")]
    UnknownStatType(String),

    #[error("invalid parser config: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
