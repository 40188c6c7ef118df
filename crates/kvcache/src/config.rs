//! Store configuration

use std::env;
use std::path::{Path, PathBuf};

use kvwal::SyncPolicy;

use crate::error::{Error, Result};

/// Default number of entries
pub const DEFAULT_CAPACITY: usize = 1000;

/// Store configuration parameters
///
/// Values can be loaded from environment variables with [`Config::from_env`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Maximum number of entries before LRU eviction
    pub capacity: usize,
    /// Log file path; `None` disables logging
    pub wal_path: Option<PathBuf>,
    /// Durability point for each log append
    pub sync: SyncPolicy,
}

impl Config {
    /// Config with the given capacity and logging disabled
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    /// Enable logging to `path`; an empty path leaves logging disabled
    pub fn with_wal<P: AsRef<Path>>(mut self, path: P) -> Self {
        let path = path.as_ref();
        self.wal_path = if path.as_os_str().is_empty() {
            None
        } else {
            Some(path.to_path_buf())
        };
        self
    }

    /// Set the durability point for log appends
    pub fn with_sync(mut self, sync: SyncPolicy) -> Self {
        self.sync = sync;
        self
    }

    /// Load configuration from environment variables
    ///
    /// # Environment Variables
    /// - `KVCACHE_CAPACITY` - Maximum entries (default: 1000)
    /// - `KVCACHE_WAL_PATH` - Log file path (default: unset, logging disabled)
    /// - `KVCACHE_WAL_SYNC` - `always` or `flush` (default: always)
    pub fn from_env() -> Self {
        let mut config = Self::new(
            env::var("KVCACHE_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_CAPACITY),
        );

        if let Some(path) = env::var_os("KVCACHE_WAL_PATH") {
            config = config.with_wal(path);
        }

        config.sync = env::var("KVCACHE_WAL_SYNC")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_default();

        config
    }

    /// Reject configurations a store cannot be built from
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(Error::ZeroCapacity);
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            wal_path: None,
            sync: SyncPolicy::Always,
        }
    }
}
