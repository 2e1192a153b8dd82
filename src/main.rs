//! # gitfleet CLI
//!
//! This is the binary entry point for the `gitfleet` command-line tool.
//!
//! Its responsibilities are:
//! - Splitting the argument vector into gitfleet's options and the command to
//!   run, and parsing the former with `clap`.
//! - Running the selected repositories through the library.
//! - Translating the outcome into a process exit code.
//!
//! The core logic lives in the `gitfleet` library crate; the binary is a
//! thin wrapper around it.

mod cli;
mod commands;

use std::env;
use std::process::ExitCode;

use gitfleet::exit_codes;

fn main() -> ExitCode {
    let args: Vec<String> = env::args_os()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();
    let (cli, rest) = cli::Cli::parse_split(args);

    match cli.execute(rest) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("Error: {:#}", err);
            let nothing_to_do = err
                .downcast_ref::<gitfleet::Error>()
                .is_some_and(gitfleet::Error::is_nothing_to_do);
            ExitCode::from(if nothing_to_do {
                exit_codes::NOTHING_TO_DO
            } else {
                exit_codes::ERROR
            })
        }
    }
}
