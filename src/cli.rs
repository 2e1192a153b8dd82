//! CLI argument parsing and dispatch

use anyhow::Result;
use clap::Parser;
use log::debug;

use gitfleet::exit_codes;
use gitfleet::output::OutputConfig;

use crate::commands;
use crate::commands::completions::CompletionShell;
use crate::commands::run::{RunArgs, Separator};

/// gitfleet - Run a git command, or any command, in many repositories
#[derive(Parser, Debug)]
#[command(name = "gitfleet")]
#[command(version, about, long_about = None)]
#[command(override_usage = "gitfleet [DIR]... [OPTIONS] [- [git] SUBCOMMAND...]\n       \
                            gitfleet [DIR]... [OPTIONS] [-- COMMAND...]")]
pub struct Cli {
    #[command(flatten)]
    run: RunArgs,

    /// Print a shell completion script and exit
    #[arg(long, value_enum, value_name = "SHELL")]
    completions: Option<CompletionShell>,

    /// Colorize output (always, never, auto)
    #[arg(long, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

impl Cli {
    /// Parse the process arguments.
    ///
    /// Everything from the first `-` or `--` on is the command to run and is
    /// kept away from clap.
    pub fn parse_split(args: Vec<String>) -> (Self, Option<(Separator, Vec<String>)>) {
        let mut args = args.into_iter();
        let program = args.next().unwrap_or_else(|| "gitfleet".to_string());
        let (mine, rest) = commands::run::split_args(args.collect());
        let cli = Self::parse_from(std::iter::once(program).chain(mine));
        (cli, rest)
    }

    /// Execute the CLI and return the process exit code.
    pub fn execute(self, rest: Option<(Separator, Vec<String>)>) -> Result<u8> {
        init_logging(&self.log_level);
        debug!("command line: {:?}", self);

        if let Some(shell) = self.completions {
            commands::completions::execute(shell)?;
            return Ok(exit_codes::SUCCESS);
        }

        let output = OutputConfig::from_env_and_flag(&self.color);
        commands::run::execute(self.run, rest, output)
    }
}

fn init_logging(level: &str) {
    let _ = env_logger::Builder::new()
        .parse_filters(level)
        .format_timestamp(None)
        .format_target(false)
        .try_init();
}
