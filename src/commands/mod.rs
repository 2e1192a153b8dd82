//! # CLI Command Implementations
//!
//! `gitfleet` has a single operation, so there are no subcommands. The
//! top-level parser in `cli.rs` flattens [`run::RunArgs`] and dispatches
//! either to [`run::execute`] or, for `--completions`, to
//! [`completions::execute`].

pub mod completions;
pub mod run;
