// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! The binary has two roles:
//! - the public scheduler invocation described by [`CliArgs`];
//! - an internal supervisor invocation ([`SuperviseArgs`]) that the
//!   scheduler launches by re-executing itself with [`SUPERVISE_COMMAND`] as
//!   the first argument.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::{Parser, ValueEnum};
use thiserror::Error;

/// First argument that selects the internal supervisor role.
pub const SUPERVISE_COMMAND: &str = "__supervise";

/// Seconds the supervisor waits between SIGTERM and SIGKILL for its child.
pub const DEFAULT_CHILD_GRACE_SECS: u64 = 3;

/// Command-line arguments for `minicron`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "minicron",
    version,
    about = "Run a command every PERIOD seconds under a supervising process.",
    long_about = None
)]
pub struct CliArgs {
    /// Save the child PID in this file.
    #[arg(short = 'p', value_name = "PIDFILE")]
    pub child_pidfile: Option<PathBuf>,

    /// Save the daemon PID in this file.
    #[arg(short = 'P', value_name = "PIDFILE")]
    pub daemon_pidfile: Option<PathBuf>,

    /// Kill the child after N seconds (0 = no limit).
    #[arg(short = 'k', value_name = "N", default_value_t = 0)]
    pub kill_after: u64,

    /// Detach from the controlling terminal after starting.
    #[arg(short = 'd')]
    pub detach: bool,

    /// Seconds to wait after SIGTERM before sending SIGKILL to the child.
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_CHILD_GRACE_SECS)]
    pub grace: u64,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `MINICRON_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Seconds between two runs of the command.
    #[arg(value_name = "PERIOD")]
    pub period: u64,

    /// The command to run, followed by its arguments.
    #[arg(
        value_name = "COMMAND",
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub command: Vec<OsString>,
}

/// Arguments of the internal supervisor role.
///
/// Not meant to be typed by hand; see `process::SupervisorLauncher`.
#[derive(Debug, Clone, Parser)]
#[command(name = SUPERVISE_COMMAND, hide = true)]
pub struct SuperviseArgs {
    #[arg(long, value_name = "PIDFILE")]
    pub child_pidfile: Option<PathBuf>,

    #[arg(long, value_name = "N", default_value_t = 0)]
    pub kill_after: u64,

    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_CHILD_GRACE_SECS)]
    pub grace: u64,

    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Executable followed by its arguments, after `--`.
    #[arg(value_name = "COMMAND", required = true, last = true)]
    pub command: Vec<OsString>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// The spelling accepted by `--log-level`.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Which role this process was started in.
#[derive(Debug, Clone)]
pub enum Invocation {
    Schedule(CliArgs),
    Supervise(SuperviseArgs),
}

/// Classification of argument errors, each with its own exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgErrorKind {
    /// `--help` / `--version`: not really an error.
    HelpOrVersion,
    TooFewArguments,
    UnknownFlag,
    InvalidValue,
}

impl ArgErrorKind {
    pub fn exit_code(self) -> u8 {
        match self {
            ArgErrorKind::HelpOrVersion => 0,
            ArgErrorKind::TooFewArguments => 11,
            ArgErrorKind::UnknownFlag => 12,
            ArgErrorKind::InvalidValue => 13,
        }
    }
}

/// Argument parsing failure, reported before any process is spawned.
#[derive(Error, Debug)]
#[error("{inner}")]
pub struct ArgError {
    kind: ArgErrorKind,
    inner: clap::Error,
}

impl ArgError {
    pub fn kind(&self) -> ArgErrorKind {
        self.kind
    }

    pub fn exit_code(&self) -> u8 {
        self.kind.exit_code()
    }

    /// Print the usage / diagnostic text and return the matching exit code.
    pub fn report(&self) -> ExitCode {
        let _ = self.inner.print();
        ExitCode::from(self.exit_code())
    }
}

impl From<clap::Error> for ArgError {
    fn from(inner: clap::Error) -> Self {
        let kind = match inner.kind() {
            ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => ArgErrorKind::HelpOrVersion,
            ErrorKind::MissingRequiredArgument | ErrorKind::TooFewValues => {
                ArgErrorKind::TooFewArguments
            }
            ErrorKind::UnknownArgument => ArgErrorKind::UnknownFlag,
            _ => ArgErrorKind::InvalidValue,
        };
        Self { kind, inner }
    }
}

/// Parse the process arguments.
pub fn parse() -> Result<Invocation, ArgError> {
    parse_from(std::env::args_os())
}

/// Parse an explicit argument vector (first element is the program name).
pub fn parse_from<I, T>(args: I) -> Result<Invocation, ArgError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();

    if args.get(1).and_then(|a| a.to_str()) == Some(SUPERVISE_COMMAND) {
        let parsed = SuperviseArgs::try_parse_from(args[1..].iter().cloned())?;
        return Ok(Invocation::Supervise(parsed));
    }

    let parsed = CliArgs::try_parse_from(args)?;
    Ok(Invocation::Schedule(parsed))
}
