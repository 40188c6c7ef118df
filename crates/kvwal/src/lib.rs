//! # kvwal
//!
//! Write-ahead log for the kvcache engine.
//!
//! ## Format
//! One record per line, space-separated ASCII tokens:
//! - `PUT <key> <value...>` (value runs to the end of the line)
//! - `DEL <key>`
//! - `CLEAR`
//!
//! ## Guarantees
//! - Appends are ordered and, with [`SyncPolicy::Always`], on stable storage
//!   before [`Wal::append`] returns
//! - Replay is best-effort: malformed or torn lines are skipped, never fatal

#![warn(missing_docs)]

mod error;
mod record;
mod replay;
mod wal;

pub use error::{Error, Result};
pub use record::{parse_record, validate_key, validate_value, Record};
pub use replay::{replay, RecoveryReport, ReplayTarget};
pub use wal::{SyncPolicy, Wal};
