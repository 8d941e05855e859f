// src/scheduler.rs

//! The scheduler tier: one supervisor per period, forever.
//!
//! Each iteration launches a supervisor, sleeps for the period and then
//! escalates against the supervisor with zero grace, which blocks until it
//! has exited. The supervisor escalates against its own child on SIGTERM, so
//! a zero grace here is enough. At most one supervisor is alive at a time.
//!
//! A termination request cuts the sleep short: the current supervisor is
//! escalated against, the daemon PID file is removed and the scheduler
//! returns [`SchedulerExit::Terminated`].

use std::process::ExitCode;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::pidfile::PidFile;
use crate::process::{Launcher, escalate};
use crate::signals::{TerminationListener, termination_pending};
use crate::task::TaskSpec;

/// Supervisors get no grace: they handle SIGTERM themselves.
pub const SUPERVISOR_GRACE: Duration = Duration::ZERO;

/// How the scheduler loop ended. It only ever ends on request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerExit {
    Terminated,
}

impl SchedulerExit {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            SchedulerExit::Terminated => ExitCode::FAILURE,
        }
    }
}

/// Counters for one scheduler lifetime, exposed for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub supervisors_launched: u64,
    pub launch_failures: u64,
}

enum PeriodEvent {
    Elapsed,
    TerminateRequested,
}

pub struct Scheduler<'a, L, T> {
    spec: &'a TaskSpec,
    launcher: L,
    termination: T,
    stats: SchedulerStats,
}

impl<'a, L, T> Scheduler<'a, L, T>
where
    L: Launcher,
    T: TerminationListener,
{
    /// `termination` must already be listening before the first supervisor
    /// is launched.
    pub fn new(spec: &'a TaskSpec, launcher: L, termination: T) -> Self {
        Self {
            spec,
            launcher,
            termination,
            stats: SchedulerStats::default(),
        }
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    /// Run until a termination request arrives.
    ///
    /// The daemon PID file (if configured) exists for exactly as long as this
    /// future runs.
    pub async fn run(&mut self) -> Result<SchedulerExit> {
        let daemon_pidfile = PidFile::record(self.spec.daemon_pidfile(), std::process::id())?;
        info!(
            period_secs = self.spec.period().as_secs(),
            kill_after_secs = self.spec.kill_after().map(|d| d.as_secs()),
            "scheduler started"
        );

        loop {
            let mut supervisor = match self.launcher.launch(self.spec) {
                Ok(supervisor) => {
                    self.stats.supervisors_launched += 1;
                    supervisor
                }
                Err(err) => {
                    // Retried right away, without backoff.
                    self.stats.launch_failures += 1;
                    warn!(error = %err, "failed to launch supervisor; retrying");
                    if termination_pending(&mut self.termination).await {
                        break;
                    }
                    tokio::task::yield_now().await;
                    continue;
                }
            };

            let event = tokio::select! {
                _ = self.termination.requested() => PeriodEvent::TerminateRequested,
                _ = sleep(self.spec.period()) => PeriodEvent::Elapsed,
            };

            match event {
                PeriodEvent::Elapsed => {
                    debug!(
                        supervisors = self.stats.supervisors_launched,
                        "period elapsed; stopping supervisor"
                    );
                    escalate(&mut supervisor, SUPERVISOR_GRACE).await?;

                    if termination_pending(&mut self.termination).await {
                        break;
                    }
                }
                PeriodEvent::TerminateRequested => {
                    info!("termination requested; stopping supervisor");
                    escalate(&mut supervisor, SUPERVISOR_GRACE).await?;
                    break;
                }
            }
        }

        if let Some(pidfile) = daemon_pidfile {
            pidfile.remove();
        }

        info!(stats = ?self.stats, "scheduler terminated");
        Ok(SchedulerExit::Terminated)
    }
}
