//! Error types for kvcache

use thiserror::Error;

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for store operations
#[derive(Error, Debug)]
pub enum Error {
    /// Log or record error (I/O, invalid key or value)
    #[error(transparent)]
    Wal(#[from] kvwal::Error),

    /// Recovery requested on a store without a log path
    #[error("Write-ahead log is not configured")]
    WalDisabled,

    /// Capacity must be positive
    #[error("Capacity must be greater than 0")]
    ZeroCapacity,
}
