//! # Discovery
//!
//! Finds repository roots below a starting directory.
//!
//! A directory is a repository when it is bare (see [`is_bare`]) or directly
//! contains a `.git` directory. Once a repository is found the walk normally
//! stops descending there; with `subrepos` it keeps looking inside normal
//! working trees for nested clones, but never inside bare repositories or
//! the metadata directory itself.
//!
//! Depth is counted in path segments below the root: depth `0` only looks at
//! the root itself, depth `1` also at its immediate children, and a negative
//! depth means no limit. The result is sorted and free of duplicates; a root
//! that does not exist or is not a directory yields nothing.

use std::path::{Component, Path, PathBuf};

use log::{debug, warn};
use normalize_path::NormalizePath;
use walkdir::WalkDir;

use crate::defaults::METADATA_DIR;
use crate::target::is_bare;

/// Search parameters shared by every root of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryOptions {
    /// Maximum depth below the root; negative for unlimited.
    pub depth: i32,
    /// Keep searching inside repositories for nested repositories.
    pub subrepos: bool,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            depth: crate::defaults::DEFAULT_DEPTH,
            subrepos: false,
        }
    }
}

/// Find the repositories under `root`.
pub fn discover(root: &Path, options: DiscoveryOptions) -> Vec<PathBuf> {
    let mut walker = WalkDir::new(root).follow_links(false);
    if let Ok(max_depth) = usize::try_from(options.depth) {
        walker = walker.max_depth(max_depth);
    }

    let mut repos = Vec::new();
    let mut entries = walker
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || entry.file_name() != METADATA_DIR);

    while let Some(entry) = entries.next() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                if err.depth() == 0 {
                    debug!("skipping search root {}: {}", root.display(), err);
                } else {
                    warn!("cannot read directory during discovery: {}", err);
                }
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }

        let path = entry.path();
        let bare = is_bare(path);
        if bare || path.join(METADATA_DIR).is_dir() {
            debug!("found repository {}", path.display());
            repos.push(normalize(path));
            if bare || !options.subrepos {
                entries.skip_current_dir();
            }
        }
    }

    repos.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
    repos.dedup();
    repos
}

/// Discover under each root in turn, concatenating the results.
///
/// Results of different roots are kept in root order; duplicates across
/// roots are left for identity resolution to collapse.
pub fn discover_all<P: AsRef<Path>>(roots: &[P], options: DiscoveryOptions) -> Vec<PathBuf> {
    roots
        .iter()
        .flat_map(|root| discover(root.as_ref(), options))
        .collect()
}

/// Lexically clean a discovered path.
///
/// Absolute paths are fully normalized (`/r/./a/../b` becomes `/r/b`).
/// Relative paths only lose their `.` segments so that a leading `..` keeps
/// pointing above the working directory.
fn normalize(path: &Path) -> PathBuf {
    let normalized: PathBuf = if path.is_absolute() {
        path.normalize()
    } else {
        path.components()
            .filter(|component| !matches!(component, Component::CurDir))
            .collect()
    };
    if normalized.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        normalized
    }
}
