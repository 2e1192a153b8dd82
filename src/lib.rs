//! # gitfleet
//!
//! Run one action across many git repositories.
//!
//! The library finds repositories under a set of directories, narrows them
//! down with include/exclude sets and branch or local-change filters, and
//! then drives each one through an optional fetch, an optional checkout of
//! the first requested branch that exists, and a user command. A failure in
//! one repository never stops the others; every failure is collected and
//! reported at the end. It can also emit a shell script that recreates the
//! same set of repositories elsewhere.
//!
//! It is used by the `gitfleet` command-line tool.
//!
//! ## Quick Example
//!
//! ```
//! use gitfleet::git::parse_branch_names;
//!
//! let names = parse_branch_names("* main\n  remotes/origin/main\n  remotes/origin/rel-2\n");
//! assert_eq!(names.into_iter().collect::<Vec<_>>(), vec!["main", "rel-2"]);
//! ```
//!
//! ## Execution Flow
//!
//! 1.  **Discovery** (`discovery`): walk each directory for repositories.
//! 2.  **Identity** (`target`): collapse different spellings of the same
//!     directory across the searched, included and excluded sets.
//! 3.  **Filtering** (`filter`): exclude, then the modified and branch
//!     pre-filters.
//! 4.  **Orchestration** (`orchestrator`): the per-target stage pipeline,
//!     running commands through `exec` and recording failures in `ledger`.
//! 5.  **Reporting** (`report`, `script`): error summary, clone script and
//!     listing.
//!
//! [`plan::RunPlan`] carries every option of a run.

pub mod defaults;
pub mod discovery;
pub mod error;
pub mod exec;
pub mod exit_codes;
pub mod filter;
pub mod git;
pub mod ledger;
pub mod orchestrator;
pub mod output;
pub mod plan;
pub mod report;
pub mod script;
pub mod target;

#[cfg(test)]
mod selection_proptest;

pub use error::{Error, Result};
