// src/process/mod.rs

//! Process layer.
//!
//! - [`handle`] wraps a spawned `tokio::process::Child` as a [`ProcessControl`].
//! - [`launcher`] starts the two kinds of processes: the target command
//!   (child) and the supervisor (a re-execution of this binary).
//! - [`escalate`] implements the SIGTERM → grace → SIGKILL protocol.
//!
//! Tiers above only talk to [`ProcessControl`] and [`Launcher`], so tests can
//! substitute scripted fakes for real processes.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::process::ExitStatus;

use crate::errors::Result;

pub mod escalate;
pub mod handle;
pub mod launcher;

pub use escalate::{Escalation, escalate};
pub use handle::ProcessHandle;
pub use launcher::{ChildLauncher, Launcher, SupervisorLauncher};

/// Which tier a process belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Supervisor,
    Child,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Supervisor => f.write_str("supervisor"),
            Role::Child => f.write_str("child"),
        }
    }
}

/// The two signals of the escalation protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermSignal {
    /// SIGTERM.
    Graceful,
    /// SIGKILL.
    Forceful,
}

impl TermSignal {
    pub fn as_nix(self) -> nix::sys::signal::Signal {
        match self {
            TermSignal::Graceful => nix::sys::signal::Signal::SIGTERM,
            TermSignal::Forceful => nix::sys::signal::Signal::SIGKILL,
        }
    }
}

/// A process this one is the parent of.
///
/// Implementations must tolerate the target having exited at any point:
/// signalling a dead process is not an error, and probing or waiting after
/// the process was reaped returns the recorded status again.
pub trait ProcessControl: Send {
    fn role(&self) -> Role;

    /// OS process id, `None` once the process has been reaped.
    fn pid(&self) -> Option<u32>;

    /// Non-blocking probe; reaps the process if it has exited.
    fn try_reap(&mut self) -> Result<Option<ExitStatus>>;

    /// Send one of the escalation signals.
    fn signal(&mut self, signal: TermSignal) -> Result<()>;

    /// Block until the process exits and reap it.
    fn wait(&mut self) -> Pin<Box<dyn Future<Output = Result<ExitStatus>> + Send + '_>>;
}
