// src/process/escalate.rs

//! Termination escalation: SIGTERM, then SIGKILL once the grace period runs
//! out.
//!
//! Protocol for a target process and grace period `g`:
//!
//! 1. Probe without blocking. Already exited → return, nothing is sent.
//! 2. Send SIGTERM.
//! 3. `g == 0`: block until the process exits.
//! 4. `g > 0`: probe again, sleep `g` only if still alive, probe a third
//!    time and send SIGKILL if it is still running. The SIGKILL is not
//!    waited for.
//!
//! The probe between SIGTERM and the sleep keeps a process that dies right
//! away from costing a full grace period.
//!
//! The grace sleep is not interruptible.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::errors::Result;

use super::{ProcessControl, TermSignal};

/// What [`escalate`] had to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escalation {
    /// The process had exited before anything was sent.
    AlreadyExited,
    /// The process exited after SIGTERM.
    Terminated,
    /// The grace period ran out and SIGKILL was sent.
    Killed,
}

/// Drive `process` from running to reaped (or SIGKILLed).
pub async fn escalate<P>(process: &mut P, grace: Duration) -> Result<Escalation>
where
    P: ProcessControl + ?Sized,
{
    let role = process.role();
    let pid = process.pid();

    if process.try_reap()?.is_some() {
        debug!(%role, ?pid, "process already exited; nothing to escalate");
        return Ok(Escalation::AlreadyExited);
    }

    info!(%role, ?pid, grace_secs = grace.as_secs_f64(), "sending SIGTERM");
    process.signal(TermSignal::Graceful)?;

    if grace.is_zero() {
        let status = process.wait().await?;
        debug!(%role, ?pid, ?status, "process exited after SIGTERM");
        return Ok(Escalation::Terminated);
    }

    if process.try_reap()?.is_some() {
        debug!(%role, ?pid, "process exited right after SIGTERM");
        return Ok(Escalation::Terminated);
    }

    sleep(grace).await;

    if process.try_reap()?.is_some() {
        debug!(%role, ?pid, "process exited within grace period");
        return Ok(Escalation::Terminated);
    }

    warn!(%role, ?pid, grace_secs = grace.as_secs_f64(), "grace period elapsed; sending SIGKILL");
    process.signal(TermSignal::Forceful)?;
    Ok(Escalation::Killed)
}
