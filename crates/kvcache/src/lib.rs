//! # kvcache
//!
//! Thread-safe, capacity-bounded key-value cache with crash recovery.
//!
//! ## Architecture
//! - **HashMap**: AHash index from key to arena slot (O(1))
//! - **LRU List**: Doubly-linked list threaded through the arena (O(1) promotion and eviction)
//! - **Durability**: Every accepted mutation is appended to a [`kvwal`] log under the same lock
//! - **Recovery**: The log is replayed into a fresh engine through its public operations
//!
//! ```no_run
//! use kvcache::KvStore;
//!
//! let store = KvStore::with_wal(1000, "data/wal.log");
//! store.recover().ok();
//! store.put("user:1", "Alice").unwrap();
//! assert_eq!(store.get("user:1").as_deref(), Some("Alice"));
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod lru;
mod stats;
mod store;


pub use config::{Config, DEFAULT_CAPACITY};
pub use error::{Error, Result};
pub use kvwal::{RecoveryReport, SyncPolicy};
pub use lru::{Insertion, Iter, LruCache};
pub use stats::CacheStats;
pub use store::KvStore;
