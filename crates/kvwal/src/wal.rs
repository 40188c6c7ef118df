//! Append-only log writer
//!
//! The log is a single text file opened in append mode. Each record is written
//! with one `write_all` so a crash can only leave a torn final line behind.
//! Opening the log cuts such a line off so new records start on a fresh line.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::warn;

use crate::error::{Error, Result};
use crate::record::Record;

/// Chunk size used when scanning backwards for the last line break
const TAIL_SCAN_CHUNK: u64 = 4096;

/// How far an append is pushed before [`Wal::append`] returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncPolicy {
    /// Flush and `fsync` the data after every record
    #[default]
    Always,
    /// Flush to the operating system only
    Flush,
}

impl FromStr for SyncPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "always" | "fsync" => Ok(SyncPolicy::Always),
            "flush" => Ok(SyncPolicy::Flush),
            other => Err(Error::Parse(format!("Unknown sync policy: {}", other))),
        }
    }
}

/// Write handle for a log file
#[derive(Debug)]
pub struct Wal {
    /// Path of the log file
    path: PathBuf,

    /// Append-mode file handle
    file: File,

    /// Durability point for each append
    sync: SyncPolicy,

    /// Records appended through this handle
    appended: u64,
}

impl Wal {
    /// Open (or create) the log at `path` for appending
    ///
    /// # Arguments
    /// * `path` - Log file path; missing parent directories are created
    /// * `sync` - Durability point for each append
    pub fn open<P: AsRef<Path>>(path: P, sync: SyncPolicy) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .read(true)
            .create(true)
            .append(true)
            .open(path)?;

        let dropped = truncate_torn_tail(&mut file)?;
        if dropped > 0 {
            warn!("Dropped {} bytes of torn record at the end of {:?}", dropped, path);
        }

        Ok(Wal {
            path: path.to_path_buf(),
            file,
            sync,
            appended: 0,
        })
    }

    /// Append one record and push it to the configured durability point
    pub fn append(&mut self, record: &Record<'_>) -> Result<()> {
        let line = record.encode();
        self.file.write_all(line.as_bytes())?;
        self.file.flush()?;

        if self.sync == SyncPolicy::Always {
            self.file.sync_data()?;
        }

        self.appended += 1;
        Ok(())
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of records appended through this handle
    pub fn appended(&self) -> u64 {
        self.appended
    }
}

/// Cut the file back to just after its last `\n`, returning the bytes removed
fn truncate_torn_tail(file: &mut File) -> Result<u64> {
    let len = file.metadata()?.len();
    let mut end = len;
    let mut buf = [0u8; TAIL_SCAN_CHUNK as usize];

    while end > 0 {
        let start = end.saturating_sub(TAIL_SCAN_CHUNK);
        let chunk = &mut buf[..(end - start) as usize];
        file.seek(SeekFrom::Start(start))?;
        file.read_exact(chunk)?;

        if let Some(pos) = chunk.iter().rposition(|&b| b == b'\n') {
            end = start + pos as u64 + 1;
            break;
        }
        end = start;
    }

    if end < len {
        file.set_len(end)?;
        file.sync_data()?;
    }
    Ok(len - end)
}

impl Drop for Wal {
    fn drop(&mut self) {
        let _ = self.file.sync_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_append_writes_lines_in_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wal.log");

        let mut wal = Wal::open(&path, SyncPolicy::Always).unwrap();
        wal.append(&Record::Put { key: "a", value: "1" }).unwrap();
        wal.append(&Record::Del { key: "a" }).unwrap();
        wal.append(&Record::Clear).unwrap();
        assert_eq!(wal.appended(), 3);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "PUT a 1\nDEL a\nCLEAR\n");
    }

    #[test]
    fn test_reopen_appends() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wal.log");

        {
            let mut wal = Wal::open(&path, SyncPolicy::Flush).unwrap();
            wal.append(&Record::Put { key: "a", value: "1" }).unwrap();
        }
        {
            let mut wal = Wal::open(&path, SyncPolicy::Flush).unwrap();
            assert_eq!(wal.appended(), 0);
            wal.append(&Record::Put { key: "b", value: "2" }).unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "PUT a 1\nPUT b 2\n");
    }

    #[test]
    fn test_open_cuts_torn_tail() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wal.log");
        std::fs::write(&path, "PUT a 1\nPUT c trunc").unwrap();

        let mut wal = Wal::open(&path, SyncPolicy::Always).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "PUT a 1\n");

        wal.append(&Record::Put { key: "d", value: "4" }).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "PUT a 1\nPUT d 4\n");
    }

    #[test]
    fn test_open_cuts_torn_only_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wal.log");
        std::fs::write(&path, "PUT half").unwrap();

        let mut wal = Wal::open(&path, SyncPolicy::Flush).unwrap();
        wal.append(&Record::Clear).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "CLEAR\n");
    }

    #[test]
    fn test_open_cuts_torn_tail_longer_than_scan_chunk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wal.log");
        let torn = format!("PUT big {}", "x".repeat(3 * TAIL_SCAN_CHUNK as usize));
        std::fs::write(&path, format!("PUT a 1\n{}", torn)).unwrap();

        let _wal = Wal::open(&path, SyncPolicy::Flush).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "PUT a 1\n");
    }

    #[test]
    fn test_open_keeps_clean_log() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wal.log");
        std::fs::write(&path, "PUT a 1\nDEL a\n").unwrap();

        let _wal = Wal::open(&path, SyncPolicy::Flush).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "PUT a 1\nDEL a\n");
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/deeper/wal.log");

        let wal = Wal::open(&path, SyncPolicy::Always).unwrap();
        assert_eq!(wal.path(), path.as_path());
        assert!(path.exists());
    }

    #[test]
    fn test_open_fails_on_directory() {
        let dir = TempDir::new().unwrap();
        let result = Wal::open(dir.path(), SyncPolicy::Always);
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_sync_policy_from_str() {
        assert_eq!("always".parse::<SyncPolicy>().unwrap(), SyncPolicy::Always);
        assert_eq!(" FLUSH ".parse::<SyncPolicy>().unwrap(), SyncPolicy::Flush);
        assert!("sometimes".parse::<SyncPolicy>().is_err());
        assert_eq!(SyncPolicy::default(), SyncPolicy::Always);
    }
}
