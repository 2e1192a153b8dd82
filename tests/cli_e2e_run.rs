//! End-to-end tests for running commands across repositories.
//!
//! These tests build real repositories with the system `git`, invoke the
//! binary on them and check what was processed and printed.

#[allow(dead_code)]
mod common;
use common::prelude::*;

/// Two repositories: `A` is clean on `main`, `B` is modified on `dev`.
fn scenario() -> GitFixture {
    let fixture = GitFixture::new();
    fixture.repo("A");
    fixture.repo_on_branch("B", "dev");
    fixture.modify("B");
    fixture
}

#[test]
fn test_modified_filter() {
    let fixture = scenario();

    fixture
        .command()
        .args(["-m", "-l"])
        .assert()
        .success()
        .stdout("Did:\nB\n");
}

#[test]
fn test_branch_filter_without_fetch() {
    let fixture = scenario();

    fixture
        .command()
        .args(["-b", "main", "-l"])
        .assert()
        .success()
        .stdout("Did:\nA\n");
}

#[test]
fn test_untracked_files_are_not_modifications() {
    let fixture = GitFixture::new();
    fixture.repo("A");
    fixture.touch("A/notes.txt");

    fixture
        .command()
        .args(["-m", "-", "status"])
        .assert()
        .code(3);
}

#[test]
fn test_include_bypasses_filters() {
    let fixture = scenario();

    fixture
        .command()
        .args(["-m", "-i", "A", "-l"])
        .assert()
        .success()
        .stdout("Did:\nB A\n");
}

#[test]
fn test_exclude_wins_over_include() {
    let fixture = scenario();

    fixture
        .command()
        .args(["-i", "A", "-x", "A", "-l"])
        .assert()
        .success()
        .stdout("Did:\nB\n");
}

#[test]
fn test_parent_relative_root() {
    let fixture = GitFixture::new();
    fixture.repo("repos/A");
    std::fs::create_dir(fixture.join("work")).expect("Failed to create work dir");

    fixture
        .command()
        .current_dir(fixture.join("work"))
        .args(["../repos", "-l"])
        .assert()
        .success()
        .stdout("Did:\n../repos/A\n");
}

#[test]
fn test_same_repository_spelled_twice_runs_once() {
    let fixture = GitFixture::new();
    let repo = fixture.repo("A");

    let assert = fixture
        .command()
        .args(["-d", "0", "./A"])
        .arg(&repo)
        .args(["-l", "--", "true"])
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    assert_eq!(stdout.matches("------  ").count(), 1);
    assert!(stdout.ends_with("Did:\nA\n"));
}

#[test]
fn test_git_separator_runs_git() {
    let fixture = GitFixture::new();
    fixture.repo("A");

    fixture
        .command()
        .args(["-", "rev-parse", "--abbrev-ref", "HEAD"])
        .assert()
        .success()
        .stdout(predicate::str::contains("------  A  ------\nmain\n"))
        .stdout(predicate::str::ends_with("Done.\n"));
}

#[test]
fn test_checkout_first_available_branch() {
    let fixture = GitFixture::new();
    fixture.repo("A");
    fixture.branch("A", "rel-1");

    fixture
        .command()
        .args(["-b", "rel-2", "rel-1", "main", "-c"])
        .args(["--", "sh", "-c", "echo \"on $GITFLEET_BRANCH\"; git rev-parse --abbrev-ref HEAD"])
        .assert()
        .success()
        .stdout(predicate::str::contains("$ git checkout rel-1\n"))
        .stdout(predicate::str::contains("on rel-1\nrel-1\n"));
}

#[test]
fn test_missing_branch_is_a_benign_skip() {
    let fixture = GitFixture::new();
    fixture.repo("upstream/O");
    fixture.clone_repo("upstream/O", "work/V");
    fixture.clone_repo("upstream/O", "work/W");
    fixture.branch("work/V", "topic");

    fixture
        .command()
        .args(["work", "-f", "-b", "topic", "-c", "-l"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Branches not found, skipping\n"))
        .stdout(predicate::str::ends_with("Did:\nwork/V\n"));
}

#[test]
fn test_fetch_sees_new_branches() {
    let fixture = GitFixture::new();
    fixture.repo("upstream/O");
    fixture.clone_repo("upstream/O", "work/W");
    fixture.branch("upstream/O", "rel-2");

    // Without fetch the stale branch list filters W out.
    fixture
        .command()
        .args(["work", "-b", "rel-2", "-", "status"])
        .assert()
        .code(3);

    fixture
        .command()
        .args(["work", "-f", "-b", "rel-2", "-c", "-l"])
        .assert()
        .success()
        .stdout(predicate::str::contains("$ git fetch\n"))
        .stdout(predicate::str::contains("Found branches: rel-2\n"))
        .stdout(predicate::str::ends_with("Did:\nwork/W\n"));
}

#[test]
fn test_test_command_selects_repositories() {
    let fixture = scenario();
    fixture.touch("A/Makefile");

    fixture
        .command()
        .args(["-l", "-t", "test", "-f", "Makefile"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Skipping\n"))
        .stdout(predicate::str::ends_with("Did:\nA\n"));
}

#[test]
fn test_dry_run_prints_instead_of_running() {
    let fixture = GitFixture::new();
    fixture.repo("A");

    fixture
        .command()
        .args(["--dry-run", "--", "touch", "marker"])
        .assert()
        .success()
        .stdout(predicate::str::contains("DRY $ touch marker\n"));

    assert!(!fixture.join("A/marker").exists());
}

#[test]
fn test_failures_are_summarized() {
    let fixture = scenario();

    fixture
        .command()
        .args(["-", "rev-parse", "--verify", "-q", "no-such-ref"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("ERRORS:"))
        .stderr(predicate::str::contains("\tA:\n"))
        .stderr(predicate::str::contains("\tB:\n"))
        .stdout(predicate::str::ends_with("Done.\n"));
}

#[test]
fn test_print_args() {
    let fixture = scenario();

    fixture
        .command()
        .args(["-m", "--print-args", "--", "echo", "hi"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"modified\": true"))
        .stdout(predicate::str::contains("* Command:\n\techo hi\n"))
        .stdout(predicate::str::contains("* Found Repos:\n\tA\n\tB\n"))
        .stdout(predicate::str::contains("* Filtered Repos:\n\tB\n"))
        .stdout(predicate::str::contains("Done.").not());
}

#[test]
fn test_git_tool_from_environment() {
    let fixture = GitFixture::new();
    fixture.repo("A");

    fixture
        .command()
        .env("GITFLEET_GIT_TOOL", "echo")
        .args(["-", "hello"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hello\n"));
}

#[test]
fn test_timeout_kills_slow_commands() {
    let fixture = GitFixture::new();
    fixture.repo("A");

    fixture
        .command()
        .args(["--timeout", "1", "--", "sleep", "5"])
        .assert()
        .code(124)
        .stderr(predicate::str::contains("timed out"));
}
