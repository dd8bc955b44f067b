//! Error types for test synchronization

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Synchronization errors
///
/// Only [`Error::Configuration`] is fatal. Every other variant is caught at the
/// narrowest scope, logged, and never surfaces in a test's own result.
#[derive(Error, Debug)]
pub enum Error {
    /// No usable shared temporary directory
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Encoded sync property could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// File lock could not be taken
    #[error("Failed to acquire file lock for [{}]: {source}", path.display())]
    LockAcquisition {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Sync file or folder could not be removed
    #[error("Failed to delete [{}]: {source}", path.display())]
    Cleanup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Tag cannot be used as a sync file name or on the wire
    #[error("Invalid tag: {0}")]
    InvalidTag(String),

    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Whether this error must abort the build
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Configuration(_))
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
