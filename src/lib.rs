// src/lib.rs

pub mod cli;
pub mod daemon;
pub mod errors;
pub mod logging;
pub mod pidfile;
pub mod process;
pub mod scheduler;
pub mod signals;
pub mod supervisor;
pub mod task;

use std::process::ExitCode;

use tracing::debug;

use crate::cli::{CliArgs, SuperviseArgs};
use crate::errors::Result;
use crate::process::{ChildLauncher, SupervisorLauncher};
use crate::scheduler::Scheduler;
use crate::signals::{SigtermListener, ignore_interrupts};
use crate::supervisor::Supervisor;
use crate::task::TaskSpec;

/// Scheduler entry point used by `main.rs`.
///
/// This wires together:
/// - the task spec built from the CLI
/// - SIGINT ignoring and the SIGTERM listener
/// - the supervisor launcher (re-executes this binary)
/// - the scheduler loop
///
/// Only returns once a termination request has been handled.
pub async fn run(args: CliArgs) -> Result<ExitCode> {
    let spec = TaskSpec::from_cli(&args)?;
    debug!(?spec, "task spec");

    ignore_interrupts()?;
    let termination = SigtermListener::install()?;

    let launcher = SupervisorLauncher::current_exe()?.with_log_level(args.log_level);

    let mut scheduler = Scheduler::new(&spec, launcher, termination);
    let exit = scheduler.run().await?;
    Ok(exit.exit_code())
}

/// Supervisor entry point, reached through the internal `__supervise` role.
pub async fn run_supervisor(args: SuperviseArgs) -> Result<ExitCode> {
    let spec = TaskSpec::from_supervise_args(&args)?;
    debug!(?spec, "supervisor task spec");

    // Listen before the child exists so an early request is not lost.
    let termination = SigtermListener::install()?;

    let supervisor = Supervisor::new(&spec, ChildLauncher, termination);
    let exit = supervisor.run().await?;
    Ok(exit.exit_code())
}
