//! Init command implementation

use std::collections::HashSet;
use std::fs;
use testsync_core::protocol;

use crate::cli::InitArgs;
use crate::config::{Config, CONFIG_FILE_NAME, DEFAULT_CONFIG};
use crate::error::{CliError, Result};
use crate::output::Output;

pub fn execute(args: InitArgs, output: &Output) -> Result<()> {
    log::info!("Initializing TestSync in: {}", args.path.display());

    if !args.path.is_dir() {
        return Err(CliError::ConfigError(format!(
            "Not a directory: {}",
            args.path.display()
        )));
    }

    let config_path = args.path.join(CONFIG_FILE_NAME);
    if config_path.exists() && !args.force {
        return Err(CliError::ConfigError(format!(
            "Configuration file already exists: {}\nUse --force to overwrite",
            config_path.display()
        )));
    }

    let mut seen = HashSet::new();
    for tag in &args.tags {
        protocol::validate_tag(tag)?;
        if !seen.insert(tag.as_str()) {
            return Err(CliError::DuplicateTag(tag.clone()));
        }
    }

    if args.tags.is_empty() {
        // keep the commented template as-is
        fs::write(&config_path, DEFAULT_CONFIG)?;
    } else {
        let mut config = Config::default();
        config.sync.tags = args.tags;
        config.save(&config_path)?;
    }

    output.success(&format!(
        "Created configuration file: {}",
        config_path.display()
    ));
    output.info("Next: testsync run --workers 4 -- <test command>");

    Ok(())
}
