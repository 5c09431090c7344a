//! Error types for proctorterm

use thiserror::Error;

/// Result type alias using proctorterm's Error.
pub type Result<T> = std::result::Result<T, Error>;

/// proctorterm error types.
#[derive(Error, Debug)]
pub enum Error {
    /// Parse error occurred while parsing a command line.
    #[error("parse error: {0}")]
    Parse(String),

    /// Execution error occurred while running a command.
    #[error("execution error: {0}")]
    Execution(String),

    /// I/O error from virtual filesystem operations.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Command not found in the registry.
    #[error("command not found: {0}")]
    CommandNotFound(String),

    /// Snapshot could not be decoded.
    #[error("snapshot error: {0}")]
    Snapshot(String),
}
