// src/main.rs

//! Synchronous entry point.
//!
//! `-d` forks, and `fork()` is only sound while the process is
//! single-threaded, so arguments are parsed and the process detached before
//! the tokio runtime is built by hand.

use std::process::ExitCode;

use anyhow::Context;
use minicron::cli::{self, Invocation};
use minicron::{daemon, logging, run, run_supervisor};

fn main() -> ExitCode {
    let invocation = match cli::parse() {
        Ok(invocation) => invocation,
        Err(err) => return err.report(),
    };

    match run_main(invocation) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("minicron error: {err:?}");
            ExitCode::FAILURE
        }
    }
}

fn run_main(invocation: Invocation) -> anyhow::Result<ExitCode> {
    match invocation {
        Invocation::Schedule(args) => {
            logging::init_logging(args.log_level)?;
            if args.detach {
                daemon::detach()?;
            }
            let code = build_runtime()?.block_on(run(args))?;
            Ok(code)
        }
        Invocation::Supervise(args) => {
            logging::init_logging(args.log_level)?;
            let code = build_runtime()?.block_on(run_supervisor(args))?;
            Ok(code)
        }
    }
}

/// One execution context per process: a current-thread runtime.
fn build_runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")
}
