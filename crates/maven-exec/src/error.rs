//! Error types for Maven invocations

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Unified error type for building and running a Maven invocation
///
/// `Configuration` and `ExecutableNotFound` are raised before any process
/// exists. Everything else can only happen after the child was spawned.
#[derive(Error, Debug)]
pub enum Error {
    /// The execution spec is invalid
    #[error("invalid configuration: {reason}")]
    Configuration {
        /// What was wrong with the spec
        reason: String,
    },

    /// No Maven launcher could be located
    #[error("maven executable not found: {reason}")]
    ExecutableNotFound {
        /// The locations that were tried
        reason: String,
    },

    /// Maven exited with a non-zero code
    #[error("maven exited with code {exit_code}{}", format_tail(.tail))]
    ExecutionFailed {
        /// The exit code reported by the process
        exit_code: i32,
        /// The last lines of captured output
        tail: Vec<String>,
    },

    /// Process terminated by a signal we did not send
    #[error("maven terminated by signal {signal}{}", format_tail(.tail))]
    SignalTerminated {
        /// The signal number that terminated the process
        signal: i32,
        /// The last lines of captured output
        tail: Vec<String>,
    },

    /// The invocation ran past its deadline and was stopped
    #[error("maven timed out after {after:?}")]
    Timeout {
        /// The configured timeout
        after: Duration,
    },

    /// The invocation was cancelled by the caller and was stopped
    #[error("maven invocation cancelled")]
    Cancelled,

    /// The launcher ran but its output named no Maven version
    #[error("{} did not report a maven version", .launcher.display())]
    UnrecognizedVersion {
        /// The launcher that was probed
        launcher: PathBuf,
    },

    /// Failed to spawn a process
    #[error("failed to spawn process: {reason}")]
    SpawnFailed {
        /// The reason for the spawn failure
        reason: String,
    },

    /// Failed to send signal to process
    #[error("failed to send signal {signal}: {reason}")]
    SignalFailed {
        /// The signal number that failed to send
        signal: i32,
        /// The reason for the signal failure
        reason: String,
    },

    /// I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn format_tail(tail: &[String]) -> String {
    match tail.last() {
        Some(line) => format!(" (last output: {line})"),
        None => String::new(),
    }
}

impl Error {
    /// Create a configuration error
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// Create an executable-not-found error
    pub fn not_found(reason: impl Into<String>) -> Self {
        Self::ExecutableNotFound {
            reason: reason.into(),
        }
    }

    /// Create a spawn failed error
    pub fn spawn_failed(reason: impl Into<String>) -> Self {
        Self::SpawnFailed {
            reason: reason.into(),
        }
    }

    /// Create a signal failed error
    pub fn signal_failed(signal: i32, reason: impl Into<String>) -> Self {
        Self::SignalFailed {
            signal,
            reason: reason.into(),
        }
    }

    /// True when the error was raised before a process could be spawned
    pub fn is_pre_spawn(&self) -> bool {
        matches!(
            self,
            Error::Configuration { .. } | Error::ExecutableNotFound { .. }
        )
    }

    /// The exit code carried by an `ExecutionFailed` error
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Error::ExecutionFailed { exit_code, .. } => Some(*exit_code),
            _ => None,
        }
    }

    /// The output tail captured before the process failed, if any
    pub fn output_tail(&self) -> &[String] {
        match self {
            Error::ExecutionFailed { tail, .. } | Error::SignalTerminated { tail, .. } => tail,
            _ => &[],
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
