//! Exec command implementation
//!
//! Wraps a single test command: the locks of its tags are taken before the
//! command starts and released once it exits, whatever the exit status.

use testsync_core::{SyncListener, TestCase, TestOutcome};

use crate::cli::ExecArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::process::{self, CommandSpec};

pub fn execute(args: ExecArgs, config: Config) -> Result<()> {
    if args.command.is_empty() {
        return Err(CliError::MissingCommand);
    }
    let spec = CommandSpec::from_argv(&args.command).map_err(|e| CliError::Spawn(e.to_string()))?;

    let listener = SyncListener::from_env(&config.sync.settings());
    if !listener.is_enabled() {
        log::debug!("No sync property found, running [{}] unsynchronized", args.id);
    }

    let test = TestCase {
        id: args.id,
        tags: args.tags,
        container: args.container,
    };

    let guard = listener.guard(&test);
    match process::run_once(&spec) {
        Ok(status) => {
            guard.finish(TestOutcome::from_success(status.success()));
            if status.success() {
                Ok(())
            } else {
                Err(CliError::CommandFailed(status.code().unwrap_or(1)))
            }
        }
        Err(e) => {
            guard.finish(TestOutcome::Aborted);
            Err(CliError::Spawn(format!("{:#}", e)))
        }
    }
}
