//! KvStore: synchronized LRU cache with write-ahead logging

use std::path::{Path, PathBuf};

use kvwal::{validate_key, validate_value, Record, RecoveryReport, ReplayTarget, SyncPolicy, Wal};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::lru::{Insertion, LruCache};
use crate::stats::CacheStats;

/// State guarded by the store lock
struct Inner {
    /// Index and recency order
    cache: LruCache<String, String>,

    /// Open log, if logging is enabled and the file could be opened
    wal: Option<Wal>,
}

impl Inner {
    /// Append a record for a mutation that has already been applied
    ///
    /// Failures are reported and swallowed; the in-memory change stands.
    fn log(&mut self, record: Record<'_>) {
        if let Some(wal) = self.wal.as_mut() {
            if let Err(err) = wal.append(&record) {
                warn!("Failed to append {} record to {:?}: {}", record.op(), wal.path(), err);
            }
        }
    }
}

/// Thread-safe, capacity-bounded key-value store
///
/// Every operation runs under one exclusive lock that covers the index, the
/// recency order and the log append, so each call is linearizable end to end.
pub struct KvStore {
    inner: Mutex<Inner>,

    /// Store statistics
    stats: CacheStats,

    /// Maximum number of entries
    capacity: usize,

    /// Configured log path, kept even when the writer failed to open
    wal_path: Option<PathBuf>,
}

impl KvStore {
    /// Create a store from a configuration
    ///
    /// A log file that cannot be opened disables logging with a warning; only
    /// an invalid configuration is an error.
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_config(config))
    }

    /// Create an in-memory store with no log
    ///
    /// # Panics
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than 0");
        Self::from_config(Config::new(capacity))
    }

    /// Create a store logging to `path` with fsync on every append
    ///
    /// An empty path disables logging.
    ///
    /// # Panics
    /// Panics if `capacity` is 0.
    pub fn with_wal<P: AsRef<Path>>(capacity: usize, path: P) -> Self {
        assert!(capacity > 0, "Capacity must be greater than 0");
        Self::from_config(Config::new(capacity).with_wal(path).with_sync(SyncPolicy::Always))
    }

    fn from_config(config: Config) -> Self {
        let wal = config
            .wal_path
            .as_deref()
            .and_then(|path| match Wal::open(path, config.sync) {
                Ok(wal) => Some(wal),
                Err(err) => {
                    warn!("Failed to open write-ahead log {:?}, logging disabled: {}", path, err);
                    None
                }
            });

        Self {
            inner: Mutex::new(Inner {
                cache: LruCache::new(config.capacity),
                wal,
            }),
            stats: CacheStats::new(),
            capacity: config.capacity,
            wal_path: config.wal_path,
        }
    }

    /// Insert or overwrite a key and make it most recently used
    ///
    /// Inserting a new key into a full store evicts the least recently used
    /// entry first. Overwrites never evict.
    ///
    /// # Errors
    /// Keys must be non-empty without whitespace and values must not contain
    /// line breaks, so every accepted write can be replayed from the log.
    pub fn put(&self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        validate_value(key, value)?;

        let mut inner = self.inner.lock();
        match inner.cache.put(key.to_string(), value.to_string()) {
            Insertion::Inserted => self.stats.record_insert(),
            Insertion::Replaced(_) => self.stats.record_update(),
            Insertion::Evicted { key: evicted, .. } => {
                debug!("Evicted least recently used key {:?}", evicted);
                self.stats.record_eviction();
                self.stats.record_insert();
            }
        }

        inner.log(Record::Put { key, value });
        Ok(())
    }

    /// Look up a key, promoting it to most recently used on a hit
    pub fn get(&self, key: &str) -> Option<String> {
        let mut inner = self.inner.lock();
        match inner.cache.get(key) {
            Some(value) => {
                self.stats.record_hit();
                Some(value.clone())
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    /// Remove a key, returning whether it was present
    ///
    /// Only deletes that remove something are logged.
    pub fn delete(&self, key: &str) -> bool {
        let mut inner = self.inner.lock();
        if inner.cache.remove(key).is_none() {
            return false;
        }

        self.stats.record_delete();
        inner.log(Record::Del { key });
        true
    }

    /// Check for a key without touching recency
    pub fn exists(&self, key: &str) -> bool {
        self.inner.lock().cache.contains(key)
    }

    /// Current number of entries
    pub fn len(&self) -> usize {
        self.inner.lock().cache.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.inner.lock().cache.is_empty()
    }

    /// Remove every entry
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.cache.clear();
        inner.log(Record::Clear);
    }

    /// Rebuild the store contents from the log
    ///
    /// Replays the log into a fresh engine of the same capacity, then swaps it
    /// in. The current contents are kept if the log cannot be opened or read. Replayed
    /// records are not written back to the log.
    ///
    /// # Errors
    /// [`Error::WalDisabled`] without a log path, or an I/O error if the log
    /// file cannot be opened. Malformed lines are skipped and counted.
    pub fn recover(&self) -> Result<RecoveryReport> {
        let path = self.wal_path.as_deref().ok_or(Error::WalDisabled)?;

        let mut inner = self.inner.lock();
        let mut fresh: LruCache<String, String> = LruCache::new(self.capacity);
        let report = kvwal::replay(path, &mut fresh)?;
        inner.cache = fresh;

        Ok(report)
    }

    /// Get store statistics
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Configured log path
    pub fn wal_path(&self) -> Option<&Path> {
        self.wal_path.as_deref()
    }

    /// Whether mutations are currently being appended to a log
    pub fn is_logging(&self) -> bool {
        self.inner.lock().wal.is_some()
    }

    /// Keys from most to least recently used
    pub fn keys(&self) -> Vec<String> {
        self.inner
            .lock()
            .cache
            .iter()
            .map(|(key, _)| key.clone())
            .collect()
    }
}

impl ReplayTarget for LruCache<String, String> {
    fn apply(&mut self, record: &Record<'_>) {
        match *record {
            Record::Put { key, value } => {
                self.put(key.to_string(), value.to_string());
            }
            Record::Del { key } => {
                self.remove(key);
            }
            Record::Clear => self.clear(),
        }
    }
}
