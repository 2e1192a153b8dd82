//! Property-based tests for target selection and processing.
//!
//! These tests use proptest to generate target sets, branch lists and
//! failure sequences, and check the invariants that hold across a run.

#[cfg(test)]
mod proptest_tests {
    use std::cell::RefCell;
    use std::collections::{BTreeSet, HashMap};
    use std::path::{Path, PathBuf};

    use proptest::prelude::*;

    use crate::exec::{CommandRunner, ExecutionResult, ResultOrigin, TargetCommand};
    use crate::filter::{self, FilterOptions, Selection};
    use crate::git::mock::{MockGit, MockRepo};
    use crate::git::{parse_branch_names, resolve_branches};
    use crate::ledger::ErrorLedger;
    use crate::orchestrator::Orchestrator;
    use crate::output::Console;
    use crate::plan::RunPlan;
    use crate::target::TargetSet;

    fn names() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec("[a-e]", 0..8)
    }

    fn to_set(items: &[String]) -> TargetSet {
        items.iter().map(PathBuf::from).collect()
    }

    /// Runner counting launches per target; fails targets listed in `codes`.
    #[derive(Default)]
    struct CountingRunner {
        launches: RefCell<HashMap<PathBuf, usize>>,
        codes: HashMap<PathBuf, i32>,
    }

    impl CommandRunner for CountingRunner {
        fn run(&self, target: &Path, _: &TargetCommand, _: &[(String, String)]) -> ExecutionResult {
            *self
                .launches
                .borrow_mut()
                .entry(target.to_path_buf())
                .or_default() += 1;
            match self.codes.get(target) {
                Some(&code) => ExecutionResult {
                    code,
                    stderr: String::new(),
                    origin: ResultOrigin::ProcessExit,
                },
                None => ExecutionResult::succeeded(),
            }
        }
    }

    // ============================================================================
    // exclude property tests
    // ============================================================================

    proptest! {
        /// Property: nothing excluded survives, in either the found or the included set
        #[test]
        fn exclude_always_wins(found in names(), include in names(), exclude in names()) {
            let git = MockGit::new();
            let selection = filter::apply(
                &git,
                to_set(&found),
                to_set(&include),
                to_set(&exclude),
                FilterOptions::default(),
            );
            for target in exclude.iter().map(Path::new) {
                prop_assert!(!selection.filtered.contains(target));
                prop_assert!(!selection.included.contains(target));
            }
        }

        /// Property: excluding twice is the same as excluding once
        #[test]
        fn exclude_is_idempotent(found in names(), exclude in names()) {
            let exclude = to_set(&exclude);
            let once = to_set(&found).without(&exclude);
            prop_assert_eq!(once.without(&exclude), once);
        }
    }

    // ============================================================================
    // branch property tests
    // ============================================================================

    proptest! {
        /// Property: resolved branches keep the requested priority order
        #[test]
        fn resolution_preserves_requested_order(
            requested in prop::collection::vec("[a-f]", 1..6),
            existing in prop::collection::btree_set("[a-f]", 0..6),
        ) {
            let existing: Vec<&str> = existing.iter().map(String::as_str).collect();
            let git = MockGit::new().with("repo", MockRepo::with_branches(&existing));
            let resolved = resolve_branches(&git, Path::new("repo"), &requested).unwrap();

            let expected: Vec<String> = requested
                .iter()
                .filter(|b| existing.contains(&b.as_str()))
                .cloned()
                .collect();
            prop_assert_eq!(resolved, expected);
        }

        /// Property: local and remote-tracking spellings collapse to one name
        #[test]
        fn remote_prefix_is_stripped(
            branch in "[a-z][a-z0-9-]{0,10}",
            remote in "[a-z]{1,6}",
        ) {
            let output = format!("* {branch}\n  remotes/{remote}/{branch}\n");
            let parsed = parse_branch_names(&output);
            prop_assert_eq!(parsed, BTreeSet::from([branch]));
        }
    }

    // ============================================================================
    // orchestration property tests
    // ============================================================================

    proptest! {
        /// Property: every target is processed at most once, whatever its sources
        #[test]
        fn each_target_runs_at_most_once(found in names(), include in names()) {
            let git = MockGit::new();
            let runner = CountingRunner::default();
            let plan = RunPlan {
                command: Some(TargetCommand::new("true", Vec::<String>::new())),
                ..RunPlan::default()
            };
            let selection = Selection {
                filtered: to_set(&found),
                included: to_set(&include),
                ..Selection::default()
            };

            let report = Orchestrator::new(&plan, &git, &runner).run(&selection, &mut Console::sink());

            for count in runner.launches.borrow().values() {
                prop_assert_eq!(*count, 1);
            }
            let distinct: BTreeSet<&String> = found.iter().chain(include.iter()).collect();
            prop_assert_eq!(report.processed.len(), distinct.len());
        }

        /// Property: the exit code is the code of the last failing target
        #[test]
        fn exit_code_is_last_failure(codes in prop::collection::vec(0i32..4, 1..8)) {
            let targets: Vec<String> = (0..codes.len()).map(|i| format!("t{i}")).collect();
            let runner = CountingRunner {
                codes: targets
                    .iter()
                    .zip(&codes)
                    .filter(|(_, code)| **code != 0)
                    .map(|(t, code)| (PathBuf::from(t), *code))
                    .collect(),
                ..CountingRunner::default()
            };
            let plan = RunPlan {
                command: Some(TargetCommand::new("make", Vec::<String>::new())),
                ..RunPlan::default()
            };
            let selection = Selection {
                filtered: to_set(&targets),
                ..Selection::default()
            };

            let git = MockGit::new();
            let report = Orchestrator::new(&plan, &git, &runner).run(&selection, &mut Console::sink());

            let expected = codes.iter().rev().find(|c| **c != 0).copied();
            prop_assert_eq!(report.ledger.last_exit_code(), expected);
            let failed = codes.iter().filter(|c| **c != 0).count();
            prop_assert_eq!(report.ledger.len(), failed);
        }

        /// Property: success never lands in the ledger
        #[test]
        fn zero_exit_is_never_recorded(code in 0i32..3) {
            let mut ledger = ErrorLedger::new();
            let runner = CountingRunner {
                codes: HashMap::from([(PathBuf::from("t"), code)]),
                ..CountingRunner::default()
            };
            let executor = crate::exec::Executor::new(&runner, false);
            executor.execute(
                &mut Console::sink(),
                Path::new("t"),
                &TargetCommand::git(["fetch"]),
                &[],
                false,
                Some(&mut ledger),
            );
            prop_assert_eq!(ledger.is_empty(), code == 0);
        }
    }
}
