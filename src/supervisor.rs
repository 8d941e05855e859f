// src/supervisor.rs

//! The supervisor tier: owns exactly one child for one period.
//!
//! Three events race once the child is running:
//! - the child exits on its own → remove the child PID file, exit 0;
//! - a termination request arrives (the scheduler's period ended) →
//!   escalate against the child with the child grace period, remove the PID
//!   file, exit 1;
//! - the hard runtime limit (`kill_after`) elapses → escalate against the
//!   child, remove the PID file, exit 0.
//!
//! Exactly one of them is acted on. Once an escalation has started, a later
//! termination request does not cut the grace sleep short.

use std::process::{ExitCode, ExitStatus};
use std::time::Duration;

use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::errors::Result;
use crate::pidfile::PidFile;
use crate::process::{Escalation, Launcher, ProcessControl, escalate};
use crate::signals::TerminationListener;
use crate::task::TaskSpec;

/// How a supervisor lifetime ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorExit {
    /// The child exited by itself.
    ChildExited(ExitStatus),
    /// The hard runtime limit elapsed and the child was escalated against.
    TimedOut(Escalation),
    /// A termination request arrived and the child was escalated against.
    Terminated(Escalation),
    /// The child could not be started.
    LaunchFailed,
}

impl SupervisorExit {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            SupervisorExit::ChildExited(_) | SupervisorExit::TimedOut(_)
        )
    }

    pub fn exit_code(&self) -> ExitCode {
        if self.is_success() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }
    }
}

enum SupervisorEvent {
    ChildExited(Result<ExitStatus>),
    TerminateRequested,
    LimitReached,
}

/// Owns the per-period child.
///
/// Generic over the launcher and the termination source so it can be driven
/// by real signals in production and by channels in tests.
pub struct Supervisor<'a, L, T> {
    spec: &'a TaskSpec,
    launcher: L,
    termination: T,
}

impl<'a, L, T> Supervisor<'a, L, T>
where
    L: Launcher,
    T: TerminationListener,
{
    /// `termination` must already be listening: a request delivered while
    /// the child is being launched still has to be observed.
    pub fn new(spec: &'a TaskSpec, launcher: L, termination: T) -> Self {
        Self {
            spec,
            launcher,
            termination,
        }
    }

    /// Run one supervised execution of the task.
    pub async fn run(mut self) -> Result<SupervisorExit> {
        let mut child = match self.launcher.launch(self.spec) {
            Ok(child) => child,
            Err(err) => {
                error!(error = %err, "failed to launch child");
                return Ok(SupervisorExit::LaunchFailed);
            }
        };

        // The child is already running: an unwritable PID file must not
        // leave it unsupervised.
        let recorded = match child.pid() {
            Some(pid) => PidFile::record(self.spec.child_pidfile(), pid),
            None => Ok(None),
        };
        let pidfile = match recorded {
            Ok(pidfile) => pidfile,
            Err(err) => {
                warn!(error = %err, "failed to record child pid; continuing without pid file");
                None
            }
        };

        let grace = self.spec.child_grace();
        let limit = self.spec.kill_after();

        let event = tokio::select! {
            status = child.wait() => SupervisorEvent::ChildExited(status),
            _ = self.termination.requested() => SupervisorEvent::TerminateRequested,
            _ = runtime_limit(limit) => SupervisorEvent::LimitReached,
        };

        let exit = match event {
            SupervisorEvent::ChildExited(status) => {
                let status = status?;
                info!(?status, "child exited");
                SupervisorExit::ChildExited(status)
            }
            SupervisorEvent::TerminateRequested => {
                info!("termination requested; stopping child");
                SupervisorExit::Terminated(escalate(&mut child, grace).await?)
            }
            SupervisorEvent::LimitReached => {
                warn!(
                    kill_after_secs = limit.map(|d| d.as_secs()),
                    "runtime limit reached; stopping child"
                );
                SupervisorExit::TimedOut(escalate(&mut child, grace).await?)
            }
        };

        if let Some(pidfile) = pidfile {
            pidfile.remove();
        }

        info!(?exit, "supervisor finished");
        Ok(exit)
    }
}

/// Sleep for the hard runtime limit, or forever when there is none.
async fn runtime_limit(limit: Option<Duration>) {
    match limit {
        Some(limit) => sleep(limit).await,
        None => std::future::pending().await,
    }
}
