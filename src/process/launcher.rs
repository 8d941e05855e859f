// src/process/launcher.rs

//! Launching the child command and the supervisor process.

use std::ffi::OsString;
use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::Command;
use tracing::info;

use crate::cli::{LogLevel, SUPERVISE_COMMAND};
use crate::errors::{MinicronError, Result};
use crate::task::TaskSpec;

use super::{ProcessControl, ProcessHandle, Role};

/// Trait abstracting how a tier starts the process one level below it.
///
/// Production code uses [`ChildLauncher`] (supervisor → child) and
/// [`SupervisorLauncher`] (scheduler → supervisor); tests can provide their
/// own implementation that doesn't spawn real processes.
pub trait Launcher: Send {
    type Process: ProcessControl;

    fn launch(&mut self, spec: &TaskSpec) -> Result<Self::Process>;
}

/// Starts the configured command.
///
/// The command gets `argv[0]` equal to the executable path, the remaining
/// arguments verbatim, the full inherited environment and inherited stdio.
#[derive(Debug, Clone, Default)]
pub struct ChildLauncher;

impl Launcher for ChildLauncher {
    type Process = ProcessHandle;

    fn launch(&mut self, spec: &TaskSpec) -> Result<ProcessHandle> {
        let argv = spec.argv();

        let mut cmd = std::process::Command::new(spec.executable());
        cmd.arg0(&argv[0])
            .args(&argv[1..])
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = Command::from(cmd)
            .spawn()
            .map_err(|source| MinicronError::Launch {
                role: Role::Child,
                source,
            })?;

        let handle = ProcessHandle::new(Role::Child, child)?;
        info!(
            pid = ?handle.pid(),
            executable = ?spec.executable(),
            "child launched"
        );
        Ok(handle)
    }
}

/// Starts a supervisor by re-executing a `minicron` binary in its internal
/// supervisor role.
#[derive(Debug, Clone)]
pub struct SupervisorLauncher {
    program: PathBuf,
    log_level: Option<LogLevel>,
}

impl SupervisorLauncher {
    /// Launch supervisors through `program`, which must be a `minicron`
    /// binary.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            log_level: None,
        }
    }

    /// Launch supervisors through the currently running executable.
    pub fn current_exe() -> Result<Self> {
        Ok(Self::new(std::env::current_exe()?))
    }

    /// Forward an explicit log level to the supervisor.
    pub fn with_log_level(mut self, level: Option<LogLevel>) -> Self {
        self.log_level = level;
        self
    }

    /// Arguments (after the program name) that recreate `spec` in the
    /// supervisor role.
    pub fn supervise_args(&self, spec: &TaskSpec) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            SUPERVISE_COMMAND.into(),
            "--grace".into(),
            spec.child_grace().as_secs().to_string().into(),
        ];

        if let Some(limit) = spec.kill_after() {
            args.push("--kill-after".into());
            args.push(limit.as_secs().to_string().into());
        }
        if let Some(path) = spec.child_pidfile() {
            args.push("--child-pidfile".into());
            args.push(path.as_os_str().to_owned());
        }
        if let Some(level) = self.log_level {
            args.push("--log-level".into());
            args.push(level.as_str().into());
        }

        args.push("--".into());
        args.extend(spec.argv().iter().cloned());
        args
    }
}

impl Launcher for SupervisorLauncher {
    type Process = ProcessHandle;

    fn launch(&mut self, spec: &TaskSpec) -> Result<ProcessHandle> {
        let child = Command::new(&self.program)
            .args(self.supervise_args(spec))
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| MinicronError::Launch {
                role: Role::Supervisor,
                source,
            })?;

        let handle = ProcessHandle::new(Role::Supervisor, child)?;
        info!(pid = ?handle.pid(), "supervisor launched");
        Ok(handle)
    }
}
