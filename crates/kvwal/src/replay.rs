//! Log replay
//!
//! Replay reads the log top to bottom and hands every well-formed record to a
//! [`ReplayTarget`]. Bad lines are counted and skipped.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::record::{parse_record, Record};

/// Anything that can re-execute logged mutations
pub trait ReplayTarget {
    /// Re-issue one recorded operation
    fn apply(&mut self, record: &Record<'_>);
}

/// Outcome of a replay that managed to open the log
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Records handed to the target
    pub applied: u64,
    /// Lines skipped as malformed or torn
    pub skipped: u64,
    /// The last line had no terminator and was dropped
    pub torn_tail: bool,
}

/// Replay the log at `path` into `target`
///
/// Fails when the log cannot be opened or read at all, including a path that
/// is not a regular file. Malformed lines, invalid UTF-8 and a torn final line
/// are skipped; a read error after the first line ends replay early.
pub fn replay<P, T>(path: P, target: &mut T) -> Result<RecoveryReport>
where
    P: AsRef<Path>,
    T: ReplayTarget + ?Sized,
{
    let path = path.as_ref();
    let file = File::open(path)?;
    if !file.metadata()?.is_file() {
        return Err(Error::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{:?} is not a regular file", path),
        )));
    }

    let mut reader = BufReader::new(file);
    let mut report = RecoveryReport::default();
    let mut buf = Vec::new();
    let mut line_no = 0u64;

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {}
            Err(err) if line_no == 0 => return Err(err.into()),
            Err(err) => {
                warn!("Stopping replay of {:?} at line {}: {}", path, line_no + 1, err);
                break;
            }
        }
        line_no += 1;

        if buf.last() != Some(&b'\n') {
            debug!("Skipping torn record at line {} of {:?}", line_no, path);
            report.skipped += 1;
            report.torn_tail = true;
            break;
        }

        let parsed = std::str::from_utf8(&buf)
            .map_err(|e| Error::Parse(e.to_string()))
            .and_then(parse_record);

        match parsed {
            Ok(record) => {
                target.apply(&record);
                report.applied += 1;
            }
            Err(err) => {
                debug!("Skipping malformed record at line {}: {}", line_no, err);
                report.skipped += 1;
            }
        }
    }

    info!(
        "Replayed {} records from {:?} ({} skipped)",
        report.applied, path, report.skipped
    );

    Ok(report)
}
