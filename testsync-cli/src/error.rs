//! Error types and handling for the CLI

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Test synchronization tag [{0}] was already added, please check your configuration")]
    DuplicateTag(String),

    #[error("No command given")]
    MissingCommand,

    #[error("Failed to launch command: {0}")]
    Spawn(String),

    #[error("{failed} of {total} worker(s) failed")]
    WorkersFailed { failed: usize, total: usize },

    #[error("Command exited with status {0}")]
    CommandFailed(i32),

    #[error("Test synchronization is disabled in this process")]
    SyncDisabled,

    #[error(transparent)]
    Sync(#[from] testsync_core::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            CliError::MissingCommand => Some("Pass the command after `--`, e.g. `testsync run -- cargo test`"),
            CliError::DuplicateTag(_) => {
                Some("Remove the tag from either `--tag` or the [sync] section of .testsync.toml")
            }
            CliError::Sync(e) if e.is_fatal() => {
                Some("Set [sync].temp_dir in .testsync.toml to an existing directory")
            }
            CliError::SyncDisabled => Some("Launch this process through `testsync run`"),
            _ => None,
        }
    }

    /// Process exit code reported for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::CommandFailed(code) => *code,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_tag_message() {
        let err = CliError::DuplicateTag("db".to_string());
        assert!(err.to_string().contains("[db] was already added"));
        assert!(err.suggestion().is_some());
    }

    #[test]
    fn test_exit_code_propagates_child_status() {
        assert_eq!(CliError::CommandFailed(3).exit_code(), 3);
        assert_eq!(CliError::MissingCommand.exit_code(), 1);
    }

    #[test]
    fn test_fatal_sync_error_has_suggestion() {
        let err = CliError::from(testsync_core::Error::Configuration("x".to_string()));
        assert!(err.suggestion().is_some());

        let err = CliError::from(testsync_core::Error::InvalidTag("x".to_string()));
        assert!(err.suggestion().is_none());
    }
}
