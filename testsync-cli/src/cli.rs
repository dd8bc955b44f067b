//! CLI argument definitions and parsing

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::commands;
use crate::config::Config;
use crate::error::Result;
use crate::output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "testsync")]
#[command(version, about = "Keep tagged tests from running concurrently across worker processes", long_about = None)]
#[command(author, propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Configuration file (defaults to .testsync.toml, then the user config)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Launch worker processes that share one set of sync files
    Run(RunArgs),

    /// Run one test command while holding the locks of its tags
    Exec(ExecArgs),

    /// Show the sync property seen by this process
    Check(CheckArgs),

    /// Initialize TestSync configuration
    Init(InitArgs),

    /// Generate shell completions
    Completion(CompletionArgs),
}

#[derive(Args)]
pub struct RunArgs {
    /// Tag to synchronize (repeatable, added to the configured tags)
    #[arg(short, long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,

    /// Number of worker processes to launch
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Stop remaining workers as soon as one fails
    #[arg(long)]
    pub fail_fast: bool,

    /// Worker command and its arguments
    #[arg(last = true)]
    pub command: Vec<String>,
}

#[derive(Args)]
pub struct ExecArgs {
    /// Unique identifier of the test
    #[arg(long)]
    pub id: String,

    /// Tag declared by the test (repeatable)
    #[arg(short, long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,

    /// Treat the command as a container, which is never synchronized
    #[arg(long)]
    pub container: bool,

    /// Test command and its arguments
    #[arg(last = true)]
    pub command: Vec<String>,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Fail when synchronization is disabled
    #[arg(long)]
    pub require: bool,
}

#[derive(Args)]
pub struct InitArgs {
    /// Project directory
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Overwrite existing configuration
    #[arg(long)]
    pub force: bool,

    /// Tags to write into the new configuration
    #[arg(short, long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,
}

#[derive(Args)]
pub struct CompletionArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
    Elvish,
}

impl Cli {
    pub fn execute(self, config: Config) -> Result<()> {
        let output = Output::new(self.format);
        match self.command {
            Commands::Run(args) => commands::run::execute(args, config, &output),
            Commands::Exec(args) => commands::exec::execute(args, config),
            Commands::Check(args) => commands::check::execute(args, config, &output),
            Commands::Init(args) => commands::init::execute(args, &output),
            Commands::Completion(args) => commands::completion::execute(args),
        }
    }
}
