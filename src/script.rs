//! # Reproduction Script Emitter
//!
//! Renders one shell statement per processed target and wraps them into a
//! script that recreates the same set of repositories elsewhere.
//!
//! - Normal repositories become `clone_or_skip DEST URL [BRANCH]`, using the
//!   `origin` remote if there is one and the first remote otherwise. The
//!   current branch is only passed when that remote has it; otherwise the
//!   statement is kept without it and the branch is noted as elided.
//! - Bare repositories become `mirror_or_skip DEST URL`.
//! - Repositories without any remote are emitted commented out, with a
//!   `file://` URL of their absolute path for reference.
//!
//! Every argument is shell-quoted.

use std::borrow::Cow;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Serialize;
use url::Url;

use crate::defaults::PREFERRED_REMOTE;
use crate::error::{Error, Result};
use crate::git::GitOperations;
use crate::output::Console;
use crate::target::is_bare;

const PROLOGUE: &str = r#"#!/bin/sh
# Generated by gitfleet.
# Running this script clones every repository that does not exist yet and
# checks out its working branch; bare repositories are mirrored.
# Repositories and branches that only existed locally are noted but elided.

clone_or_skip() {
    if [ -e "$1/.git" ]; then
        echo "$1 exists, skipped"
    else
        git clone "$2" "$1" && { [ -z "$3" ] || git -C "$1" checkout "$3"; }
    fi
}

mirror_or_skip() {
    if [ -e "$1" ]; then
        echo "$1 exists, skipped"
    else
        git clone --mirror "$2" "$1"
    fi
}

###  Repositories  ###
"#;

const EPILOGUE: &str = "#####\n";

/// How a target is recreated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloneKind {
    Clone,
    Mirror,
}

/// One reproduction statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptEntry {
    pub kind: CloneKind,
    pub dest: PathBuf,
    pub url: String,
    /// Branch to check out after cloning.
    pub branch: Option<String>,
    /// Current branch that the chosen remote does not have.
    pub elided_branch: Option<String>,
    /// The repository has no remote; the statement is commented out.
    pub local_only: bool,
}

impl ScriptEntry {
    /// Inspect `target` and describe how to recreate it.
    pub fn for_target(git: &dyn GitOperations, target: &Path) -> Result<Self> {
        let bare = is_bare(target);
        let kind = if bare {
            CloneKind::Mirror
        } else {
            CloneKind::Clone
        };
        let mut branch = if bare {
            None
        } else {
            git.current_branch(target)?
        };

        let remotes = git.remotes(target)?;
        let remote = remotes
            .iter()
            .find(|r| r.as_str() == PREFERRED_REMOTE)
            .or_else(|| remotes.first());
        let remote_url = match remote {
            Some(remote) => git.remote_url(target, remote)?.map(|url| (remote, url)),
            None => None,
        };

        let Some((remote, url)) = remote_url else {
            debug!("{} has no usable remote", target.display());
            return Ok(Self {
                kind,
                dest: target.to_path_buf(),
                url: local_url(target),
                branch,
                elided_branch: None,
                local_only: true,
            });
        };

        let mut elided_branch = None;
        if let Some(current) = &branch {
            if !git.remote_has_branch(target, remote, current)? {
                elided_branch = branch.take();
            }
        }

        Ok(Self {
            kind,
            dest: target.to_path_buf(),
            url,
            branch,
            elided_branch,
            local_only: false,
        })
    }
}

impl fmt::Display for ScriptEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.local_only {
            f.write_str("# ")?;
        }
        let dest = self.dest.to_string_lossy();
        match self.kind {
            CloneKind::Mirror => write!(f, "mirror_or_skip {} {}", quote(&dest), quote(&self.url))?,
            CloneKind::Clone => {
                write!(f, "clone_or_skip {} {}", quote(&dest), quote(&self.url))?;
                if let Some(branch) = &self.branch {
                    write!(f, " {}", quote(branch))?;
                }
            }
        }
        if let Some(branch) = &self.elided_branch {
            write!(f, "  # local branch '{}' elided", branch)?;
        }
        if self.local_only {
            f.write_str("  # local repository, reproduce manually")?;
        }
        Ok(())
    }
}

fn quote(text: &str) -> Cow<'_, str> {
    shell_escape::unix::escape(Cow::Borrowed(text))
}

/// `file://` URL for the absolute location of `target`.
fn local_url(target: &Path) -> String {
    let absolute = std::path::absolute(target).unwrap_or_else(|_| target.to_path_buf());
    match Url::from_file_path(&absolute) {
        Ok(url) => url.to_string(),
        Err(()) => format!("file://{}", absolute.display()),
    }
}

/// Wrap rendered statements into the full script.
pub fn render_script(lines: &[String]) -> String {
    let mut script = String::from(PROLOGUE);
    for line in lines {
        script.push_str(line);
        script.push('\n');
    }
    script.push_str(EPILOGUE);
    script
}

/// Where the generated script goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ScriptSink {
    StandardOutput,
    FileDestination(PathBuf),
}

impl ScriptSink {
    /// Deliver `script`.
    ///
    /// On stdout the script follows a `Clone script:` heading. A file is
    /// overwritten and made executable.
    pub fn deliver(&self, console: &mut Console, script: &str) -> Result<()> {
        match self {
            ScriptSink::StandardOutput => {
                console.begin_section();
                console.heading("Clone script:");
                console.line("");
                console.raw(script);
                console.line("");
            }
            ScriptSink::FileDestination(path) => {
                write_executable(path, script).map_err(|source| Error::Script {
                    path: path.clone(),
                    source,
                })?;
                console.line(format!("Clone script saved as {}", path.display()));
            }
        }
        Ok(())
    }
}

fn write_executable(path: &Path, script: &str) -> std::io::Result<()> {
    fs::write(path, script)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    }
    Ok(())
}
