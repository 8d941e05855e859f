// src/pidfile.rs

//! PID files: a decimal process id plus newline, owner-read-only.
//!
//! A [`PidFile`] is a guard: the file is removed by [`PidFile::remove`] or,
//! failing that, when the guard is dropped. Callers still remove explicitly
//! before returning an exit status so the deletion is ordered before the
//! process terminates.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::errors::{MinicronError, Result};

const PID_FILE_MODE: u32 = 0o400;

#[derive(Debug)]
pub struct PidFile {
    path: PathBuf,
    pid: u32,
    removed: bool,
}

impl PidFile {
    /// Write `pid` to `path`, replacing any stale file already there.
    pub fn create(path: impl Into<PathBuf>, pid: u32) -> Result<Self> {
        let path = path.into();
        let wrap = |source| MinicronError::PidFile {
            path: path.clone(),
            source,
        };

        // A leftover file is read-only, so it cannot be truncated in place.
        match fs::remove_file(&path) {
            Ok(()) => debug!(path = ?path, "replaced stale pid file"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(wrap(e)),
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .mode(PID_FILE_MODE)
            .open(&path)
            .map_err(wrap)?;
        file.write_all(format!("{pid}\n").as_bytes()).map_err(wrap)?;

        debug!(path = ?path, pid, "pid file written");
        Ok(Self {
            path,
            pid,
            removed: false,
        })
    }

    /// Like [`PidFile::create`], but a `None` path records nothing.
    pub fn record(path: Option<&Path>, pid: u32) -> Result<Option<Self>> {
        path.map(|p| Self::create(p, pid)).transpose()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Delete the file now.
    pub fn remove(mut self) {
        self.remove_inner();
    }

    fn remove_inner(&mut self) {
        if self.removed {
            return;
        }
        self.removed = true;

        match fs::remove_file(&self.path) {
            Ok(()) => debug!(path = ?self.path, pid = self.pid, "pid file removed"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(path = ?self.path, error = %e, "failed to remove pid file"),
        }
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        self.remove_inner();
    }
}

/// Read a PID file back. Used by tests and external tooling.
pub fn read_pid(path: impl AsRef<Path>) -> Result<u32> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| MinicronError::PidFile {
        path: path.to_path_buf(),
        source,
    })?;
    contents.trim_end().parse::<u32>().map_err(|e| MinicronError::PidFile {
        path: path.to_path_buf(),
        source: std::io::Error::new(ErrorKind::InvalidData, e),
    })
}
