//! Error types for the toolchain runner.

use thiserror::Error;

/// Result type alias for runner operations.
pub type RunnerResult<T> = Result<T, RunnerError>;

/// Errors that can occur while invoking the toolchain.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Failed to spawn {command}: {message}")]
    Spawn { command: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
