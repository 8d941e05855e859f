// src/process/handle.rs

//! Real process handle backed by `tokio::process::Child`.

use std::future::Future;
use std::pin::Pin;
use std::process::ExitStatus;

use nix::errno::Errno;
use nix::sys::signal::kill;
use nix::unistd::Pid;
use tokio::process::Child;
use tracing::{debug, trace};

use crate::errors::{MinicronError, Result};

use super::{ProcessControl, Role, TermSignal};

/// A spawned process plus its role tag.
///
/// The exit status is cached once observed, so probing an already-reaped
/// handle never touches the OS again (and never signals a recycled pid).
#[derive(Debug)]
pub struct ProcessHandle {
    role: Role,
    pid: u32,
    child: Child,
    status: Option<ExitStatus>,
}

impl ProcessHandle {
    /// Wrap a freshly spawned child.
    ///
    /// `tokio` only reports `None` for the id of a child it already reaped,
    /// which cannot happen right after `spawn`.
    pub fn new(role: Role, child: Child) -> Result<Self> {
        let pid = child.id().ok_or_else(|| MinicronError::Launch {
            role,
            source: std::io::Error::other("spawned process has no pid"),
        })?;
        Ok(Self {
            role,
            pid,
            child,
            status: None,
        })
    }
}

impl ProcessControl for ProcessHandle {
    fn role(&self) -> Role {
        self.role
    }

    fn pid(&self) -> Option<u32> {
        match self.status {
            Some(_) => None,
            None => Some(self.pid),
        }
    }

    fn try_reap(&mut self) -> Result<Option<ExitStatus>> {
        if self.status.is_some() {
            return Ok(self.status);
        }

        let status = self.child.try_wait()?;
        if let Some(status) = status {
            debug!(role = %self.role, pid = self.pid, ?status, "process reaped");
            self.status = Some(status);
        }
        Ok(status)
    }

    fn signal(&mut self, signal: TermSignal) -> Result<()> {
        if self.status.is_some() {
            trace!(role = %self.role, pid = self.pid, ?signal, "already reaped; not signalling");
            return Ok(());
        }

        let pid = i32::try_from(self.pid).map_err(anyhow::Error::from)?;
        match kill(Pid::from_raw(pid), signal.as_nix()) {
            Ok(()) => {
                debug!(role = %self.role, pid = self.pid, ?signal, "signal sent");
                Ok(())
            }
            // Exited between the probe and the signal (zombie or gone).
            Err(Errno::ESRCH) => {
                debug!(role = %self.role, pid = self.pid, ?signal, "process already gone");
                Ok(())
            }
            Err(source) => Err(MinicronError::Signal {
                pid: self.pid,
                source,
            }),
        }
    }

    fn wait(&mut self) -> Pin<Box<dyn Future<Output = Result<ExitStatus>> + Send + '_>> {
        Box::pin(async move {
            if let Some(status) = self.status {
                return Ok(status);
            }

            let status = self.child.wait().await?;
            debug!(role = %self.role, pid = self.pid, ?status, "process reaped");
            self.status = Some(status);
            Ok(status)
        })
    }
}
