//! # Orchestration Loop
//!
//! Drives every selected target through a fixed sequence of [`Stage`]s:
//!
//! ```text
//! Fetch -> Test -> ResolveBranches -> Checkout -> UserAction
//! ```
//!
//! Each stage has a guard (was it requested, does it apply to this kind of
//! target) and either lets the target continue or stops it with a
//! [`TargetOutcome`]. A stopped target never affects the next one.
//!
//! Discovered targets are processed first, then included targets. Included
//! targets only run `Fetch` and `UserAction`. A target that shows up twice,
//! whatever its source, is processed the first time only.
//!
//! Failures of a single target are collected in a ledger of its own and
//! merged into the run-wide [`ErrorLedger`] once the target is done.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::defaults::BRANCH_ENV_VAR;
use crate::error::Error;
use crate::exec::{CommandRunner, Executor};
use crate::filter::Selection;
use crate::git::{self, GitOperations};
use crate::ledger::ErrorLedger;
use crate::output::Console;
use crate::plan::RunPlan;
use crate::report::RunReport;
use crate::script::ScriptEntry;

/// One step of the per-target pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Test,
    ResolveBranches,
    Checkout,
    UserAction,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Fetch,
        Stage::Test,
        Stage::ResolveBranches,
        Stage::Checkout,
        Stage::UserAction,
    ];
}

/// Where a target came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Discovered,
    Included,
}

/// How a target left the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetOutcome {
    /// Every requested stage succeeded; `branch` is the resolved branch.
    Processed { branch: Option<String> },
    /// Benign skip: the test command rejected the target or none of the
    /// requested branches exist.
    Skipped,
    /// A command failed; the failure is in the ledger.
    Failed,
}

enum Flow {
    Continue,
    Stop(TargetOutcome),
}

/// Runs the selected targets of one plan.
pub struct Orchestrator<'a> {
    plan: &'a RunPlan,
    git: &'a dyn GitOperations,
    discovered: Executor<'a>,
    included: Executor<'a>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        plan: &'a RunPlan,
        git: &'a dyn GitOperations,
        runner: &'a dyn CommandRunner,
    ) -> Self {
        // Commands are echoed when more than the user command runs; included
        // targets never test or check out, so only fetch counts for them.
        let echo = plan.fetch || plan.test.is_some() || plan.checkout;
        Self {
            plan,
            git,
            discovered: Executor::new(runner, echo),
            included: Executor::new(runner, plan.fetch),
        }
    }

    fn executor(&self, source: Source) -> &Executor<'a> {
        match source {
            Source::Discovered => &self.discovered,
            Source::Included => &self.included,
        }
    }

    /// Whether `stage` runs for targets from `source`.
    pub fn applies(&self, stage: Stage, source: Source) -> bool {
        let discovered = source == Source::Discovered;
        match stage {
            Stage::Fetch => self.plan.fetch,
            Stage::Test => discovered && self.plan.test.is_some(),
            Stage::ResolveBranches => discovered && !self.plan.branches.is_empty(),
            Stage::Checkout => discovered && self.plan.checkout,
            Stage::UserAction => self.plan.command.is_some(),
        }
    }

    /// Process every target of `selection` and collect the results.
    pub fn run(&self, selection: &Selection, console: &mut Console) -> RunReport {
        let mut report = RunReport::default();
        let mut seen: HashSet<PathBuf> = HashSet::new();

        let queue = selection
            .filtered
            .iter()
            .map(|t| (t, Source::Discovered))
            .chain(selection.included.iter().map(|t| (t, Source::Included)));

        for (target, source) in queue {
            if !seen.insert(target.to_path_buf()) {
                debug!("already processed {}", target.display());
                continue;
            }

            let mut failures = ErrorLedger::new();
            let outcome = self.process(target, source, console, &mut failures);
            debug!("{}: {:?}", target.display(), outcome);

            if let TargetOutcome::Processed { .. } = outcome {
                let scripted = self.plan.clone_script.is_none()
                    || self.collect_script_line(target, &mut report, console, &mut failures);
                if scripted {
                    report.processed.push(target.to_path_buf());
                }
            }
            report.ledger.merge(failures);
        }
        report
    }

    /// Run the stage pipeline for one target.
    pub fn process(
        &self,
        target: &Path,
        source: Source,
        console: &mut Console,
        failures: &mut ErrorLedger,
    ) -> TargetOutcome {
        if self.plan.fetch || self.plan.checkout || self.plan.command.is_some() {
            console.header(target);
        }

        let mut branch = None;
        for stage in Stage::ALL {
            if !self.applies(stage, source) {
                continue;
            }
            match self.run_stage(stage, source, target, &mut branch, console, failures) {
                Flow::Continue => {}
                Flow::Stop(outcome) => return outcome,
            }
        }
        TargetOutcome::Processed { branch }
    }

    fn run_stage(
        &self,
        stage: Stage,
        source: Source,
        target: &Path,
        branch: &mut Option<String>,
        console: &mut Console,
        failures: &mut ErrorLedger,
    ) -> Flow {
        let plan = self.plan;
        let executor = self.executor(source);
        match stage {
            Stage::Fetch => {
                let result = executor.execute(
                    console,
                    target,
                    &git::fetch_command(),
                    &[],
                    false,
                    Some(&mut *failures),
                );
                if !result.is_success() {
                    return Flow::Stop(TargetOutcome::Failed);
                }
            }
            Stage::Test => {
                if let Some(test) = &plan.test {
                    let result = executor.execute(console, target, test, &[], false, None);
                    if !result.is_success() {
                        console.line("Skipping");
                        return Flow::Stop(TargetOutcome::Skipped);
                    }
                }
            }
            Stage::ResolveBranches => {
                let found = match git::resolve_branches(self.git, target, &plan.branches) {
                    Ok(found) => found,
                    Err(err) => {
                        record_query_failure(target, err, console, failures);
                        return Flow::Stop(TargetOutcome::Failed);
                    }
                };
                if found.is_empty() {
                    console.line("Branches not found, skipping");
                    return Flow::Stop(TargetOutcome::Skipped);
                }
                if plan.fetch {
                    console.line(format!("Found branches: {}", found.join(", ")));
                }
                *branch = found.into_iter().next();
            }
            Stage::Checkout => {
                if let Some(name) = branch.as_deref() {
                    let result = executor.execute(
                        console,
                        target,
                        &git::checkout_command(name),
                        &[],
                        plan.dry_run,
                        Some(&mut *failures),
                    );
                    if !result.is_success() {
                        return Flow::Stop(TargetOutcome::Failed);
                    }
                }
            }
            Stage::UserAction => {
                if let Some(command) = &plan.command {
                    let env: Vec<(String, String)> = branch
                        .iter()
                        .map(|b| (BRANCH_ENV_VAR.to_string(), b.clone()))
                        .collect();
                    let result = executor.execute(
                        console,
                        target,
                        command,
                        &env,
                        plan.dry_run,
                        Some(&mut *failures),
                    );
                    if !result.is_success() {
                        return Flow::Stop(TargetOutcome::Failed);
                    }
                }
            }
        }
        Flow::Continue
    }

    /// Render the reproduction line for `target`; false if that failed.
    fn collect_script_line(
        &self,
        target: &Path,
        report: &mut RunReport,
        console: &mut Console,
        failures: &mut ErrorLedger,
    ) -> bool {
        match ScriptEntry::for_target(self.git, target) {
            Ok(entry) => {
                report.script_lines.push(entry.to_string());
                true
            }
            Err(err) => {
                record_query_failure(target, err, console, failures);
                false
            }
        }
    }
}

fn record_query_failure(
    target: &Path,
    err: Error,
    console: &mut Console,
    failures: &mut ErrorLedger,
) {
    match err {
        Error::GitQuery { command, result, .. } => {
            if !result.diagnostic().is_empty() {
                console.diagnostic(result.diagnostic());
            }
            failures.record(target, command, result);
        }
        other => warn!("{}: {}", target.display(), other),
    }
}
