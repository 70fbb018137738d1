//! Error types for wp-core
//!
//! Configuration and filesystem errors are fatal and abort a run before any
//! upload starts. Read and transfer errors are per-file: the pipeline counts
//! them and moves on.

use thiserror::Error;

/// Result type alias for wp-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while preparing or running an upload
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or invalid settings
    #[error("Configuration error: {0}")]
    Config(String),

    /// Directory enumeration failed
    #[error("Filesystem error: {0}")]
    Filesystem(String),

    /// A local file could not be read
    #[error("{0}")]
    Read(#[source] std::io::Error),

    /// The object store rejected or failed an upload
    #[error("{0}")]
    Transfer(String),

    /// The object store rejected the credentials
    #[error("Authentication failed: {0}")]
    Auth(String),
}
