// src/daemon.rs

//! Detaching from the controlling terminal (`-d`).
//!
//! This forks, so it MUST run before the tokio runtime is built: `fork()`
//! only duplicates the calling thread.

use std::fs::OpenOptions;
use std::os::unix::io::AsRawFd;

use anyhow::{Context, Result};
use nix::sys::signal::{SigHandler, Signal, signal};
use nix::sys::stat::{Mode, umask};
use nix::unistd::{ForkResult, dup2, fork, getppid, setsid};

/// Detach the current process from its terminal and session.
///
/// Returns in the detached process only; the original parent exits with
/// status 0. Does nothing when already parented by init.
#[allow(unsafe_code)]
pub fn detach() -> Result<()> {
    if getppid().as_raw() == 1 {
        return Ok(());
    }

    umask(Mode::from_bits_truncate(0o027));

    // SAFETY: called from `main` before any runtime or other thread exists.
    match unsafe { fork() }.context("forking to detach")? {
        ForkResult::Parent { .. } => std::process::exit(0),
        ForkResult::Child => {}
    }

    setsid().context("creating a new session")?;

    for sig in [Signal::SIGTSTP, Signal::SIGTTIN, Signal::SIGTTOU] {
        // SAFETY: SIG_IGN runs no code in signal context.
        unsafe { signal(sig, SigHandler::SigIgn) }
            .with_context(|| format!("ignoring {sig}"))?;
    }

    let devnull = OpenOptions::new()
        .read(true)
        .write(true)
        .open("/dev/null")
        .context("opening /dev/null")?;
    let fd = devnull.as_raw_fd();
    for target in 0..=2 {
        dup2(fd, target).with_context(|| format!("redirecting fd {target} to /dev/null"))?;
    }

    Ok(())
}
