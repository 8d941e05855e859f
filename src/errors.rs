// src/errors.rs

//! Crate-wide error type and `Result` alias.

use std::path::PathBuf;

use thiserror::Error;

use crate::process::Role;

#[derive(Error, Debug)]
pub enum MinicronError {
    #[error("Invalid task specification: {0}")]
    InvalidSpec(String),

    #[error("Failed to launch {role}: {source}")]
    Launch {
        role: Role,
        #[source]
        source: std::io::Error,
    },

    #[error("PID file {path:?}: {source}")]
    PidFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to signal process {pid}: {source}")]
    Signal {
        pid: u32,
        #[source]
        source: nix::errno::Errno,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, MinicronError>;
