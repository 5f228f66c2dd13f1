//! Append-only journal shared by every participating process.
//!
//! Appends are serialized across processes by the logging lock in the
//! shared block, so concurrent writers never interleave partial lines.
//! Each line carries a local timestamp.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::error::{Error, Result};
use crate::lock::{Pid, ProcessLock};
use crate::probe::ProcessProbe;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Handle on the shared journal file. Cheap to construct; the file is
/// opened per append so a crashed writer never wedges the log.
pub struct Journal {
    path: PathBuf,
}

impl Journal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one timestamped line while holding `lock`.
    ///
    /// The lock is released on the write path's failure as well; the
    /// caller only sees the I/O outcome.
    pub fn append(
        &self,
        lock: &ProcessLock,
        self_pid: Pid,
        probe: &dyn ProcessProbe,
        message: &str,
    ) -> Result<()> {
        lock.acquire(self_pid, probe);
        let outcome = self.write_line(message);
        lock.release(self_pid);
        outcome
    }

    fn write_line(&self, message: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| Error::Journal {
                path: self.path.clone(),
                source,
            })?;
        writeln!(file, "{} {message}", Local::now().format(TIMESTAMP_FORMAT)).map_err(|source| {
            Error::Journal {
                path: self.path.clone(),
                source,
            }
        })
    }
}
