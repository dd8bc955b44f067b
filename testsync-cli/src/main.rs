//! TestSync CLI
//!
//! Command-line host for cross-process test synchronization: launches worker
//! processes with a shared sync property and wraps individual tagged tests.

mod cli;
mod commands;
mod config;
mod error;
mod output;
mod process;

use clap::Parser;
use colored::*;

use crate::cli::{Cli, Commands};
use crate::config::Config;
use crate::error::Result;
use crate::output::{Output, OutputFormat};

fn main() {
    // Parse command-line arguments
    let cli = Cli::parse();
    let output = Output::new(cli.format);

    if let Err(err) = run(cli) {
        output.error(&err.to_string());
        if let Some(hint) = err.suggestion() {
            if output.format() == OutputFormat::Text {
                eprintln!("  {} {}", "hint:".cyan().bold(), hint);
            }
        }
        std::process::exit(err.exit_code());
    }
}

fn run(cli: Cli) -> Result<()> {
    // Load configuration
    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };

    // Lock activity inside workers is only interesting when asked for
    let synchronizer = config.verbose.synchronizer && matches!(cli.command, Commands::Exec(_));
    setup_logging(cli.verbose || synchronizer, cli.quiet);

    // Execute command
    cli.execute(config)
}

fn setup_logging(verbose: bool, quiet: bool) {
    let level = if quiet {
        log::LevelFilter::Error
    } else if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp(None)
        .format_module_path(false)
        .init();
}
