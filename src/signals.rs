// src/signals.rs

//! Signal plumbing.
//!
//! Termination requests (SIGTERM) are not acted on inside a signal handler.
//! `tokio` records the delivery and the scheduler / supervisor observe it at
//! their `select!` points, then run the cleanup (escalate, delete PID file,
//! exit) in ordinary code.

use std::future::Future;
use std::pin::Pin;

use nix::sys::signal::{SigHandler, Signal, signal};
use tokio::signal::unix::{self, SignalKind};
use tracing::debug;

use crate::errors::Result;

/// Source of "terminate requested" events.
///
/// `requested()` may be polled repeatedly; each call resolves once per
/// delivered request (requests delivered while nobody was polling are kept).
pub trait TerminationListener: Send {
    fn requested(&mut self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

/// SIGTERM listener backed by `tokio::signal::unix`.
#[derive(Debug)]
pub struct SigtermListener {
    inner: unix::Signal,
}

impl SigtermListener {
    /// Install the SIGTERM handler. From this point on a SIGTERM no longer
    /// kills the process; it is queued for [`TerminationListener::requested`].
    ///
    /// Must be called from within a tokio runtime.
    pub fn install() -> Result<Self> {
        let inner = unix::signal(SignalKind::terminate())?;
        debug!("SIGTERM listener installed");
        Ok(Self { inner })
    }
}

impl TerminationListener for SigtermListener {
    fn requested(&mut self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            if self.inner.recv().await.is_none() {
                // The signal driver is gone; no request can arrive anymore.
                std::future::pending::<()>().await;
            }
        })
    }
}

/// Non-blocking check for a request that is already pending.
pub async fn termination_pending<T>(listener: &mut T) -> bool
where
    T: TerminationListener + ?Sized,
{
    tokio::select! {
        biased;
        _ = listener.requested() => true,
        _ = std::future::ready(()) => false,
    }
}

/// Set SIGINT to `SIG_IGN`.
///
/// The ignored disposition survives `exec`, so supervisors and children
/// started afterwards ignore interactive interrupts too.
pub fn ignore_interrupts() -> Result<()> {
    // SAFETY: installing SIG_IGN does not run any code in signal context and
    // does not replace a Rust handler that other code relies on.
    unsafe { signal(Signal::SIGINT, SigHandler::SigIgn) }
        .map_err(|e| anyhow::anyhow!("ignoring SIGINT: {e}"))?;
    debug!("SIGINT ignored");
    Ok(())
}
