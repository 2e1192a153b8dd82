//! # Git Collaborator
//!
//! Everything gitfleet asks of git goes through the [`GitOperations`] trait,
//! so the filter pipeline, the orchestration loop and the script emitter can
//! be exercised against a mock. [`DefaultGitOperations`] shells out to the
//! system `git` and parses its line-oriented output:
//!
//! - `git branch --list --all [PATTERN...]`: lines are `* name` or `  name`,
//!   optionally with a `remotes/<remote>/` prefix which is stripped, so local
//!   and remote-tracking branches collapse to one bare name.
//! - `git branch`: the current branch is the line starting with `* `.
//! - `git status --short [--untracked-files=no]`: any line means changes.
//! - `git remote`, `git remote get-url <name>`: one item per line.
//!
//! Only these read-only queries live here; imperative actions (fetch,
//! checkout) are plain [`TargetCommand`]s run by the executor.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};
use crate::exec::{self, TargetCommand};
use crate::target::is_bare;

/// Matches the current-branch marker and an optional `remotes/<remote>/`
/// prefix. Remote names are assumed not to contain `/`.
static BRANCH_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\*?\s*(remotes/[^/]*/)?").expect("valid branch regex"));

/// Read-only git queries against a target.
pub trait GitOperations {
    /// Bare names of local and remote-tracking branches.
    ///
    /// `patterns` narrows the listing on the git side; an empty slice lists
    /// every branch.
    fn branches(&self, target: &Path, patterns: &[String]) -> Result<BTreeSet<String>>;

    /// The checked-out branch, or `None` for an empty repository or a
    /// detached HEAD.
    fn current_branch(&self, target: &Path) -> Result<Option<String>>;

    /// Short status lines, optionally including untracked files.
    fn status(&self, target: &Path, include_untracked: bool) -> Result<Vec<String>>;

    /// Configured remote names, in git's order.
    fn remotes(&self, target: &Path) -> Result<Vec<String>>;

    /// Fetch URL of `remote`.
    fn remote_url(&self, target: &Path, remote: &str) -> Result<Option<String>>;

    /// Whether `remote` has a remote-tracking branch named `branch`.
    fn remote_has_branch(&self, target: &Path, remote: &str, branch: &str) -> Result<bool>;
}

/// Command that lists branches; each requested name becomes a `*name`
/// pattern so remote-tracking branches match as well.
pub fn branch_list_command(patterns: &[String]) -> TargetCommand {
    let mut args = vec!["branch".to_string(), "--list".into(), "--all".into()];
    args.extend(patterns.iter().map(|p| format!("*{}", p)));
    TargetCommand::git(args)
}

pub fn current_branch_command() -> TargetCommand {
    TargetCommand::git(["branch"])
}

pub fn status_command(include_untracked: bool) -> TargetCommand {
    let mut args = vec!["status", "--short"];
    if !include_untracked {
        args.push("--untracked-files=no");
    }
    TargetCommand::git(args)
}

pub fn remotes_command() -> TargetCommand {
    TargetCommand::git(["remote"])
}

pub fn remote_url_command(remote: &str) -> TargetCommand {
    TargetCommand::git(["remote", "get-url", remote])
}

pub fn remote_branch_command(remote: &str, branch: &str) -> TargetCommand {
    TargetCommand::git([
        "branch".to_string(),
        "--list".into(),
        "--remotes".into(),
        format!("{}/{}", remote, branch),
    ])
}

pub fn fetch_command() -> TargetCommand {
    TargetCommand::git(["fetch"])
}

pub fn checkout_command(branch: &str) -> TargetCommand {
    TargetCommand::git(["checkout", branch])
}

/// Reduce branch listing output to a set of bare branch names.
pub fn parse_branch_names(output: &str) -> BTreeSet<String> {
    output
        .lines()
        .map(|line| BRANCH_PREFIX.replace(line, "").into_owned())
        .filter(|name| !name.is_empty())
        .collect()
}

/// Pick the current branch out of plain `git branch` output.
pub fn parse_current_branch(output: &str) -> Option<String> {
    output
        .lines()
        .find_map(|line| line.strip_prefix("* "))
        .filter(|name| !name.starts_with('('))
        .map(str::to_string)
}

fn non_empty_lines(output: &str) -> Vec<String> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// The requested branches that exist in `target`, in requested order.
///
/// The first element, if any, is the branch that wins.
pub fn resolve_branches(
    git: &dyn GitOperations,
    target: &Path,
    requested: &[String],
) -> Result<Vec<String>> {
    if requested.is_empty() {
        return Ok(Vec::new());
    }
    let available = git.branches(target, requested)?;
    Ok(requested
        .iter()
        .filter(|b| available.contains(*b))
        .cloned()
        .collect())
}

/// Whether `target` has tracked local modifications.
///
/// Bare repositories have no working tree and never count as modified.
pub fn has_local_changes(git: &dyn GitOperations, target: &Path) -> Result<bool> {
    if is_bare(target) {
        return Ok(false);
    }
    Ok(!git.status(target, false)?.is_empty())
}

/// [`GitOperations`] backed by the system `git`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultGitOperations;

impl DefaultGitOperations {
    fn query(&self, target: &Path, command: TargetCommand) -> Result<String> {
        exec::capture(target, &command).map_err(|result| Error::GitQuery {
            target: target.to_path_buf(),
            command,
            result,
        })
    }
}

impl GitOperations for DefaultGitOperations {
    fn branches(&self, target: &Path, patterns: &[String]) -> Result<BTreeSet<String>> {
        let output = self.query(target, branch_list_command(patterns))?;
        Ok(parse_branch_names(&output))
    }

    fn current_branch(&self, target: &Path) -> Result<Option<String>> {
        let output = self.query(target, current_branch_command())?;
        Ok(parse_current_branch(&output))
    }

    fn status(&self, target: &Path, include_untracked: bool) -> Result<Vec<String>> {
        let output = self.query(target, status_command(include_untracked))?;
        Ok(non_empty_lines(&output))
    }

    fn remotes(&self, target: &Path) -> Result<Vec<String>> {
        let output = self.query(target, remotes_command())?;
        Ok(non_empty_lines(&output))
    }

    fn remote_url(&self, target: &Path, remote: &str) -> Result<Option<String>> {
        let output = self.query(target, remote_url_command(remote))?;
        Ok(non_empty_lines(&output).into_iter().next())
    }

    fn remote_has_branch(&self, target: &Path, remote: &str, branch: &str) -> Result<bool> {
        let output = self.query(target, remote_branch_command(remote, branch))?;
        Ok(!non_empty_lines(&output).is_empty())
    }
}
