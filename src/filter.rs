//! # Filter Pipeline
//!
//! Narrows the discovered targets before the orchestration loop runs.
//!
//! Stages run strictly in this order on the discovered set:
//!
//! 1. drop everything in the exclude set,
//! 2. with `modified`, keep targets that have tracked local changes,
//! 3. with a branch list and no fetch, keep targets where at least one of the
//!    requested branches exists.
//!
//! Stage 3 is a pre-filter: the loop checks branches again per target, and
//! when a fetch is requested the check is skipped here because the branch
//! list may change once the fetch has run.
//!
//! Included targets only go through stage 1.
//!
//! A git query that fails while filtering is logged and the target counts as
//! not matching; the run goes on.

use std::path::Path;

use log::{debug, warn};

use crate::git::{self, GitOperations};
use crate::target::TargetSet;

/// Which predicates apply to the discovered set.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterOptions<'a> {
    pub modified: bool,
    pub branches: &'a [String],
    pub fetch: bool,
}

/// The target sets of one run, after filtering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Everything discovered, in discovery order.
    pub found: TargetSet,
    /// The exclude set as given.
    pub excluded: TargetSet,
    /// Discovered targets that survived every stage.
    pub filtered: TargetSet,
    /// Included targets that are not excluded.
    pub included: TargetSet,
    /// The include set as given, before exclusion.
    pub requested: TargetSet,
}

impl Selection {
    /// Whether some target is left to process.
    pub fn has_targets(&self) -> bool {
        !self.filtered.is_empty() || !self.included.is_empty()
    }
}

/// Run the filter stages over `found` and `include`.
///
/// All three sets must already be canonicalized against each other.
pub fn apply(
    git: &dyn GitOperations,
    found: TargetSet,
    include: TargetSet,
    exclude: TargetSet,
    options: FilterOptions<'_>,
) -> Selection {
    let mut filtered = found.without(&exclude);
    let included = include.without(&exclude);

    if options.modified {
        filtered.retain(|target| is_modified(git, target));
    }

    if !options.branches.is_empty() && !options.fetch {
        filtered.retain(|target| has_any_branch(git, target, options.branches));
    }

    Selection {
        found,
        excluded: exclude,
        filtered,
        included,
        requested: include,
    }
}

fn is_modified(git: &dyn GitOperations, target: &Path) -> bool {
    match git::has_local_changes(git, target) {
        Ok(changed) => {
            if !changed {
                debug!("filtered out unmodified {}", target.display());
            }
            changed
        }
        Err(err) => {
            warn!("{}", err);
            false
        }
    }
}

fn has_any_branch(git: &dyn GitOperations, target: &Path, branches: &[String]) -> bool {
    match git::resolve_branches(git, target, branches) {
        Ok(found) => {
            if found.is_empty() {
                debug!("filtered out {} lacking requested branches", target.display());
            }
            !found.is_empty()
        }
        Err(err) => {
            warn!("{}", err);
            false
        }
    }
}
