//! Error types for kvwal

use std::io;
use thiserror::Error;

/// Result type alias for log operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for log operations
#[derive(Error, Debug)]
pub enum Error {
    /// Log file could not be opened, read or written
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Line is not a well-formed record
    #[error("Parse error: {0}")]
    Parse(String),

    /// Key cannot be represented in the log format
    #[error("Invalid key {0:?}: keys must be non-empty and free of whitespace")]
    InvalidKey(String),

    /// Value cannot be represented in the log format
    #[error("Invalid value for key {0:?}: values must not contain line breaks")]
    InvalidValue(String),
}

impl From<nom::Err<nom::error::Error<&str>>> for Error {
    fn from(err: nom::Err<nom::error::Error<&str>>) -> Self {
        Error::Parse(format!("{:?}", err))
    }
}
