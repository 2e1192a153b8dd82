//! # Error Handling
//!
//! This module defines the error type shared by the `gitfleet` library. It
//! uses `thiserror` to give every failure mode a descriptive message.
//!
//! Only a handful of conditions are errors in this sense. Per-target command
//! failures are *not* errors: they are captured as
//! [`ExecutionResult`](crate::exec::ExecutionResult)s and accumulated in the
//! [`ErrorLedger`](crate::ledger::ErrorLedger) so a single broken repository
//! never aborts a run.
//!
//! - **`TargetIdentity`**: a target path could not be resolved to an on-disk
//!   identity. This is a fatal input error that aborts the run before any
//!   target is processed.
//! - **`GitQuery`**: a read-only git query (branch listing, status, remotes)
//!   failed. Callers decide whether that excludes the target or is recorded
//!   as a per-target failure.
//! - **`NoTargets`** / **`AllFiltered`**: the run has nothing to do.
//! - **`Script`**: the generated reproduction script could not be written.

use std::path::PathBuf;

use thiserror::Error;

use crate::exec::{ExecutionResult, TargetCommand};

/// Main error type for gitfleet operations
#[derive(Error, Debug)]
pub enum Error {
    /// A target path could not be resolved to a filesystem identity.
    #[error("Cannot resolve target {}", path.display())]
    TargetIdentity {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A read-only git query failed or could not be launched.
    #[error("Git query failed in {}: {command} - {}", target.display(), result.diagnostic())]
    GitQuery {
        target: PathBuf,
        command: TargetCommand,
        result: ExecutionResult,
    },

    /// Discovery produced no repositories and nothing was included.
    #[error("found no repositories")]
    NoTargets,

    /// Repositories were found but every one of them was filtered out.
    #[error("found {count} repositories but all were filtered out")]
    AllFiltered { count: usize },

    /// The reproduction script could not be written to its destination.
    #[error("Cannot write clone script {}", path.display())]
    Script {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error means "nothing to do" rather than a real failure.
    pub fn is_nothing_to_do(&self) -> bool {
        matches!(self, Error::NoTargets | Error::AllFiltered { .. })
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
