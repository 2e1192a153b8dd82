//! # Completions
//!
//! Generates shell completion scripts with `clap_complete` for
//! `gitfleet --completions SHELL`.
//!
//! ```bash
//! gitfleet --completions bash > ~/.local/share/bash-completion/completions/gitfleet
//! gitfleet --completions zsh > ~/.zfunc/_gitfleet
//! ```

use std::io::{self, Write};

use anyhow::Result;
use clap::{CommandFactory, ValueEnum};
use clap_complete::{generate, Shell};

use crate::cli::Cli;

/// Shell types for completion generation
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CompletionShell {
    /// Bourne Again Shell
    Bash,
    /// Z Shell
    Zsh,
    /// Fish Shell
    Fish,
    /// PowerShell
    #[value(name = "powershell")]
    PowerShell,
    /// Elvish Shell
    Elvish,
}

impl From<CompletionShell> for Shell {
    fn from(shell: CompletionShell) -> Self {
        match shell {
            CompletionShell::Bash => Shell::Bash,
            CompletionShell::Zsh => Shell::Zsh,
            CompletionShell::Fish => Shell::Fish,
            CompletionShell::PowerShell => Shell::PowerShell,
            CompletionShell::Elvish => Shell::Elvish,
        }
    }
}

/// Write the completion script for `shell` to `out`.
pub fn write(shell: CompletionShell, out: &mut dyn Write) {
    let mut cmd = Cli::command();
    generate(Shell::from(shell), &mut cmd, "gitfleet", out);
}

/// Print the completion script for `shell` on stdout.
pub fn execute(shell: CompletionShell) -> Result<()> {
    write(shell, &mut io::stdout());
    Ok(())
}
