// src/task.rs

//! The immutable task specification shared by every tier.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::{CliArgs, SuperviseArgs};
use crate::errors::{MinicronError, Result};

/// What to run, how often, and where to record process identities.
///
/// Built once at startup and only ever read afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSpec {
    executable: PathBuf,
    argv: Vec<OsString>,
    period: Duration,
    kill_after: Option<Duration>,
    child_grace: Duration,
    child_pidfile: Option<PathBuf>,
    daemon_pidfile: Option<PathBuf>,
}

impl TaskSpec {
    /// Build a spec from a command vector (`command[0]` is the executable).
    ///
    /// `kill_after` of zero means "no hard runtime limit".
    pub fn new(
        command: Vec<OsString>,
        period: Duration,
        kill_after: Duration,
        child_grace: Duration,
    ) -> Result<Self> {
        let executable = match command.first() {
            Some(first) if !first.is_empty() => PathBuf::from(first),
            _ => {
                return Err(MinicronError::InvalidSpec(
                    "a command to run is required".to_string(),
                ));
            }
        };

        Ok(Self {
            executable,
            argv: command,
            period,
            kill_after: (!kill_after.is_zero()).then_some(kill_after),
            child_grace,
            child_pidfile: None,
            daemon_pidfile: None,
        })
    }

    pub fn with_child_pidfile(mut self, path: Option<PathBuf>) -> Self {
        self.child_pidfile = path;
        self
    }

    pub fn with_daemon_pidfile(mut self, path: Option<PathBuf>) -> Self {
        self.daemon_pidfile = path;
        self
    }

    /// Spec for the scheduler role.
    pub fn from_cli(args: &CliArgs) -> Result<Self> {
        Ok(Self::new(
            args.command.clone(),
            Duration::from_secs(args.period),
            Duration::from_secs(args.kill_after),
            Duration::from_secs(args.grace),
        )?
        .with_child_pidfile(args.child_pidfile.clone())
        .with_daemon_pidfile(args.daemon_pidfile.clone()))
    }

    /// Spec for the supervisor role.
    ///
    /// The supervisor never looks at the period or the daemon PID file.
    pub fn from_supervise_args(args: &SuperviseArgs) -> Result<Self> {
        Ok(Self::new(
            args.command.clone(),
            Duration::ZERO,
            Duration::from_secs(args.kill_after),
            Duration::from_secs(args.grace),
        )?
        .with_child_pidfile(args.child_pidfile.clone()))
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Full argument vector; `argv()[0]` is the executable path.
    pub fn argv(&self) -> &[OsString] {
        &self.argv
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn kill_after(&self) -> Option<Duration> {
        self.kill_after
    }

    pub fn child_grace(&self) -> Duration {
        self.child_grace
    }

    pub fn child_pidfile(&self) -> Option<&Path> {
        self.child_pidfile.as_deref()
    }

    pub fn daemon_pidfile(&self) -> Option<&Path> {
        self.daemon_pidfile.as_deref()
    }
}
