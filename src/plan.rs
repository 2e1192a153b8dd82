//! # Run Plan
//!
//! [`RunPlan`] is the fully resolved option set of one run. The binary builds
//! it from the command line; the library only ever reads it. It serializes to
//! JSON for `--print-args`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;

use crate::defaults::DEFAULT_DEPTH;
use crate::discovery::{discover_all, DiscoveryOptions};
use crate::error::{Error, Result};
use crate::exec::TargetCommand;
use crate::filter::{self, FilterOptions, Selection};
use crate::git::GitOperations;
use crate::script::ScriptSink;
use crate::target::{normalize_sets, TargetSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunPlan {
    /// Directories to search.
    pub dirs: Vec<PathBuf>,
    pub depth: i32,
    pub subrepos: bool,
    /// Directories whose repositories are added after filtering.
    pub include: Vec<PathBuf>,
    /// Directories whose repositories are never worked on.
    pub exclude: Vec<PathBuf>,
    /// Requested branches, highest priority first.
    pub branches: Vec<String>,
    pub modified: bool,
    /// Command deciding whether a discovered target is worked on.
    pub test: Option<TargetCommand>,
    pub fetch: bool,
    pub checkout: bool,
    pub list: bool,
    pub clone_script: Option<ScriptSink>,
    pub dry_run: bool,
    /// The user action run in every target.
    pub command: Option<TargetCommand>,
    /// Per-command timeout in seconds.
    pub timeout_secs: Option<u64>,
}

impl Default for RunPlan {
    fn default() -> Self {
        Self {
            dirs: vec![PathBuf::from(".")],
            depth: DEFAULT_DEPTH,
            subrepos: false,
            include: Vec::new(),
            exclude: Vec::new(),
            branches: Vec::new(),
            modified: false,
            test: None,
            fetch: false,
            checkout: false,
            list: false,
            clone_script: None,
            dry_run: false,
            command: None,
            timeout_secs: None,
        }
    }
}

impl RunPlan {
    pub fn discovery_options(&self) -> DiscoveryOptions {
        DiscoveryOptions {
            depth: self.depth,
            subrepos: self.subrepos,
        }
    }

    pub fn filter_options(&self) -> FilterOptions<'_> {
        FilterOptions {
            modified: self.modified,
            branches: &self.branches,
            fetch: self.fetch,
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Whether the orchestration loop has anything to do.
    pub fn has_work(&self) -> bool {
        self.command.is_some()
            || self.clone_script.is_some()
            || self.fetch
            || (!self.branches.is_empty() && self.checkout)
            || self.list
    }

    /// Discover, canonicalize and filter the targets of this run.
    pub fn select(&self, git: &dyn GitOperations) -> Result<Selection> {
        let options = self.discovery_options();
        let mut found: TargetSet = discover_all(&self.dirs, options).into_iter().collect();
        let mut include: TargetSet = discover_all(&self.include, options).into_iter().collect();
        let mut exclude: TargetSet = discover_all(&self.exclude, options).into_iter().collect();

        normalize_sets(&mut [&mut found, &mut include, &mut exclude])?;
        found.dedup();
        include.dedup();
        exclude.dedup();

        Ok(filter::apply(git, found, include, exclude, self.filter_options()))
    }

    /// Fail when the selection leaves nothing to work on.
    ///
    /// List mode always proceeds so an empty listing can be printed.
    pub fn ensure_targets(&self, selection: &Selection) -> Result<()> {
        if self.list || !selection.included.is_empty() {
            return Ok(());
        }
        if selection.found.is_empty() {
            return Err(Error::NoTargets);
        }
        if selection.filtered.is_empty() {
            // Excluded includes still count as found.
            let mut seen: TargetSet = selection
                .found
                .iter()
                .chain(selection.requested.iter())
                .map(Path::to_path_buf)
                .collect();
            seen.dedup();
            return Err(Error::AllFiltered { count: seen.len() });
        }
        Ok(())
    }
}
