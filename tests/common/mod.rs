//! Shared test utilities for E2E tests.
//!
//! This module provides a fixture that builds real git repositories with the
//! system `git`, plus helpers to run the `gitfleet` binary against them.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = GitFixture::new();
//!     fixture.repo("A");
//!     fixture.command().arg("-l").assert().success();
//! }
//! ```

use std::path::{Path, PathBuf};
use std::process::Command;

use assert_fs::prelude::*;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    #[allow(unused_imports)]
    pub use assert_fs::prelude::*;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::GitFixture;
}

/// Run `git` in `dir`, panicking with its stderr on failure.
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(["-c", "user.name=Fleet Test", "-c", "user.email=fleet@example.com"])
        .args(["-c", "init.defaultBranch=main", "-c", "advice.detachedHead=false"])
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Failed to launch git");
    assert!(
        output.status.success(),
        "git {:?} failed in {}: {}",
        args,
        dir.display(),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// A temporary directory holding git repositories.
///
/// # Example
///
/// ```rust,ignore
/// let fixture = GitFixture::new();
/// fixture.repo("A");
/// fixture.repo_on_branch("B", "dev");
/// fixture.modify("B");
/// ```
pub struct GitFixture {
    temp_dir: assert_fs::TempDir,
}

impl GitFixture {
    /// Create a new fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Absolute path of `name` inside the fixture.
    pub fn join(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Create a repository on `main` with one commit.
    pub fn repo(&self, name: &str) -> PathBuf {
        self.repo_on_branch(name, "main")
    }

    /// Create a repository whose only branch is `branch`, with one commit.
    pub fn repo_on_branch(&self, name: &str, branch: &str) -> PathBuf {
        let dir = self.join(name);
        std::fs::create_dir_all(&dir).expect("Failed to create repository directory");
        git(&dir, &["init", "-q"]);
        git(&dir, &["symbolic-ref", "HEAD", &format!("refs/heads/{}", branch)]);
        self.temp_dir
            .child(format!("{}/README.md", name))
            .write_str(&format!("# {}\n", name))
            .expect("Failed to write README");
        git(&dir, &["add", "README.md"]);
        git(&dir, &["commit", "-q", "-m", "Initial commit"]);
        dir
    }

    /// Clone `source` (inside the fixture) to `name`.
    pub fn clone_repo(&self, source: &str, name: &str) -> PathBuf {
        let source = self.join(source);
        git(
            self.path(),
            &["clone", "-q", &source.to_string_lossy(), name],
        );
        self.join(name)
    }

    /// Create `branch` at HEAD of `name`.
    pub fn branch(&self, name: &str, branch: &str) {
        git(&self.join(name), &["branch", branch]);
    }

    /// Change a tracked file so the repository has local modifications.
    pub fn modify(&self, name: &str) {
        self.temp_dir
            .child(format!("{}/README.md", name))
            .write_str("changed\n")
            .expect("Failed to modify README");
    }

    /// Add an untracked file.
    pub fn touch(&self, path: &str) {
        self.temp_dir
            .child(path)
            .write_str("")
            .expect("Failed to write file");
    }

    /// A `gitfleet` command running in the fixture without colors.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("gitfleet");
        cmd.current_dir(self.path())
            .env_remove("GITFLEET_GIT_TOOL")
            .env_remove("GITFLEET_TIMEOUT")
            .arg("--color")
            .arg("never");
        cmd
    }
}

impl Default for GitFixture {
    fn default() -> Self {
        Self::new()
    }
}
