//! Per-run record of failing commands.
//!
//! The ledger maps each target to the commands that failed in it, in the order
//! the failures happened. Entries are only ever appended; a target that fails
//! twice keeps both records. It is consulted once, at the end of a run, to
//! print the error summary and to pick the process exit code.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::exec::{ExecutionResult, TargetCommand};

/// One failed command and what it reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub command: TargetCommand,
    pub result: ExecutionResult,
}

/// Insertion-ordered map from target to its failed commands.
#[derive(Debug, Default)]
pub struct ErrorLedger {
    entries: IndexMap<PathBuf, Vec<Failure>>,
    last_code: Option<i32>,
}

impl ErrorLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a failure under `target`, creating the entry if needed.
    pub fn record(&mut self, target: &Path, command: TargetCommand, result: ExecutionResult) {
        self.last_code = Some(result.code);
        self.entries
            .entry(target.to_path_buf())
            .or_default()
            .push(Failure { command, result });
    }

    /// Append everything recorded in `other`, keeping its order.
    pub fn merge(&mut self, other: ErrorLedger) {
        for (target, failures) in other.entries {
            self.entries.entry(target).or_default().extend(failures);
        }
        if other.last_code.is_some() {
            self.last_code = other.last_code;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of targets with at least one failure.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Failures recorded for `target`, if any.
    pub fn failures(&self, target: &Path) -> Option<&[Failure]> {
        self.entries.get(target).map(Vec::as_slice)
    }

    /// Targets and their failures in first-failure order.
    pub fn iter(&self) -> impl Iterator<Item = (&Path, &[Failure])> {
        self.entries
            .iter()
            .map(|(target, failures)| (target.as_path(), failures.as_slice()))
    }

    /// Code of the chronologically last failure, if any failure happened.
    pub fn last_exit_code(&self) -> Option<i32> {
        self.last_code
    }
}
