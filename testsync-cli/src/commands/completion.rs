//! Completion command implementation

use clap::CommandFactory;
use clap_complete::Shell as ClapShell;
use std::io::{self, Write};

use crate::cli::{Cli, CompletionArgs, Shell};
use crate::error::Result;

impl From<Shell> for ClapShell {
    fn from(shell: Shell) -> Self {
        match shell {
            Shell::Bash => ClapShell::Bash,
            Shell::Zsh => ClapShell::Zsh,
            Shell::Fish => ClapShell::Fish,
            Shell::Powershell => ClapShell::PowerShell,
            Shell::Elvish => ClapShell::Elvish,
        }
    }
}

pub fn execute(args: CompletionArgs) -> Result<()> {
    let mut stdout = io::stdout().lock();
    write_completions(args.shell, &mut stdout)?;
    stdout.flush()?;
    Ok(())
}

/// Completion script for `testsync`, covering every subcommand and `--tag`
fn write_completions(shell: Shell, out: &mut dyn Write) -> io::Result<()> {
    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    let mut buffer = Vec::new();
    clap_complete::generate(ClapShell::from(shell), &mut cmd, bin_name, &mut buffer);
    out.write_all(&buffer)
}
