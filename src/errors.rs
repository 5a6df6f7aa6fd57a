// src/errors.rs

//! Crate-wide error types.
//!
//! - [`InvocationError`] is what the engine in [`crate::invoke`] returns. Every
//!   variant except `Spawn` carries the output accumulated before the
//!   invocation ended, so callers can decide whether it is still useful.
//! - [`SidepipeError`] is the application-level error used by config loading
//!   and the CLI runner.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Output a tool had produced on both channels when its invocation ended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialOutput {
    /// Text channel, decoded the same way as a successful result.
    pub text: String,
    /// Side channel bytes, unmodified.
    pub binary: Vec<u8>,
}

#[derive(Error, Debug)]
pub enum InvocationError {
    /// The child never started (empty argv, missing executable, pipe or
    /// fork/exec failure).
    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The child ran and exited nonzero (or was killed by a signal the
    /// watchdog did not send).
    #[error("tool exited with code {exit_code}: {}", .partial.text.trim_end())]
    ToolFailure {
        exit_code: i32,
        partial: PartialOutput,
    },

    /// The watchdog fired and the child was terminated.
    #[error("tool timed out after {elapsed:?} ({stalls} stalled waits)")]
    TimeoutExceeded {
        elapsed: Duration,
        stalls: u64,
        pid: Option<u32>,
        partial: PartialOutput,
    },

    /// Killing or reaping the child failed.
    #[error("failed to clean up tool process {pid:?}: {source}")]
    CleanupFailure {
        pid: Option<u32>,
        #[source]
        source: io::Error,
        partial: PartialOutput,
    },

    /// Unexpected descriptor error inside the readiness loop. The child has
    /// already been terminated and reaped when this is returned.
    #[error("I/O error while exchanging data with tool: {source}")]
    Io {
        #[source]
        source: io::Error,
        partial: PartialOutput,
    },
}

impl InvocationError {
    /// Partial output carried by this error, `None` for `Spawn`.
    pub fn partial(&self) -> Option<&PartialOutput> {
        match self {
            InvocationError::Spawn { .. } => None,
            InvocationError::ToolFailure { partial, .. }
            | InvocationError::TimeoutExceeded { partial, .. }
            | InvocationError::CleanupFailure { partial, .. }
            | InvocationError::Io { partial, .. } => Some(partial),
        }
    }

    /// Hard failures (`Spawn`, `CleanupFailure`, `Io`) versus outcomes a
    /// caller may still want to display (`ToolFailure`, `TimeoutExceeded`).
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            InvocationError::ToolFailure { .. } | InvocationError::TimeoutExceeded { .. }
        )
    }
}

#[derive(Error, Debug)]
pub enum SidepipeError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Invocation(#[from] InvocationError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, SidepipeError>;
