//! Error type shared by all fallible operations of the library.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed or truncated input text. `line` is 1-based, `0` means end of input.
    #[error("parse error on line {line}: {msg}")]
    Parse { line: usize, msg: String },

    #[error("vertex {id} is not between 1 and {num_nodes}")]
    VertexOutOfRange { id: i64, num_nodes: usize },

    #[error("longitude {0} is not between 180 deg West and 180 deg East")]
    LongitudeOutOfRange(i64),

    #[error("latitude {0} is not between 90 deg South and 90 deg North")]
    LatitudeOutOfRange(i64),

    #[error("invalid value {value:?} for config key {key}")]
    Config { key: String, value: String },

    #[error("edge flag data does not match the graph: {0}")]
    FlagFileMismatch(String),

    #[error("query generation failed: {0}")]
    QueryGeneration(String),
}

impl Error {
    pub(crate) fn parse(line: usize, msg: impl Into<String>) -> Self {
        Error::Parse { line, msg: msg.into() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
