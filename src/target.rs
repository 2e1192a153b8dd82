//! # Targets and Target Identity
//!
//! A target is a repository working directory (normal or bare), named by a
//! path. Two different spellings of the same directory (`./a`, `a`,
//! `/abs/path/to/a`, a symlink to it) are the same target.
//!
//! [`IdentityResolver`] turns that rule into plain string equality: every
//! path it sees is mapped to the first spelling registered for the same
//! on-disk object, so once all [`TargetSet`]s of a run went through the same
//! resolver, membership tests are ordinary path comparisons.
//!
//! A path whose identity cannot be read is a fatal input error
//! ([`Error::TargetIdentity`]); it is never skipped silently.

use std::path::{Path, PathBuf};

use log::debug;

use crate::defaults::BARE_SUFFIX;
use crate::error::{Error, Result};

/// Whether `path` names a bare repository.
///
/// Bare repositories are recognised by the conventional `.git` suffix of the
/// directory name.
pub fn is_bare(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| name.to_string_lossy().ends_with(BARE_SUFFIX))
}

/// Ordered sequence of targets with set-like membership tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetSet {
    targets: Vec<PathBuf>,
}

impl TargetSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, target: PathBuf) {
        self.targets.push(target);
    }

    pub fn contains(&self, target: &Path) -> bool {
        self.targets.iter().any(|t| t == target)
    }

    pub fn retain<F: FnMut(&Path) -> bool>(&mut self, mut keep: F) {
        self.targets.retain(|t| keep(t));
    }

    /// Drop repeated entries, keeping the first occurrence of each.
    pub fn dedup(&mut self) {
        let mut seen = Vec::with_capacity(self.targets.len());
        self.targets.retain(|t| {
            if seen.contains(t) {
                false
            } else {
                seen.push(t.clone());
                true
            }
        });
    }

    /// The entries of `self` not present in `other`, in order.
    pub fn without(&self, other: &TargetSet) -> TargetSet {
        self.targets
            .iter()
            .filter(|t| !other.contains(t))
            .cloned()
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.targets.iter().map(PathBuf::as_path)
    }

    pub fn as_slice(&self) -> &[PathBuf] {
        &self.targets
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

impl FromIterator<PathBuf> for TargetSet {
    fn from_iter<I: IntoIterator<Item = PathBuf>>(iter: I) -> Self {
        Self {
            targets: iter.into_iter().collect(),
        }
    }
}

impl Extend<PathBuf> for TargetSet {
    fn extend<I: IntoIterator<Item = PathBuf>>(&mut self, iter: I) {
        self.targets.extend(iter);
    }
}

impl IntoIterator for TargetSet {
    type Item = PathBuf;
    type IntoIter = std::vec::IntoIter<PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.targets.into_iter()
    }
}

/// What a path points to on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileIdentity {
    #[cfg(unix)]
    device: u64,
    #[cfg(unix)]
    inode: u64,
    #[cfg(not(unix))]
    canonical: PathBuf,
}

impl FileIdentity {
    /// Read the identity of `path`, following symlinks.
    #[cfg(unix)]
    pub fn of(path: &Path) -> Result<Self> {
        use std::os::unix::fs::MetadataExt;

        let metadata = std::fs::metadata(path).map_err(|source| Error::TargetIdentity {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            device: metadata.dev(),
            inode: metadata.ino(),
        })
    }

    /// Read the identity of `path`, following symlinks.
    #[cfg(not(unix))]
    pub fn of(path: &Path) -> Result<Self> {
        let canonical = dunce::canonicalize(path).map_err(|source| Error::TargetIdentity {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self { canonical })
    }
}

/// Maps path spellings to one canonical spelling per on-disk object.
#[derive(Debug, Default)]
pub struct IdentityResolver {
    known: Vec<(PathBuf, FileIdentity)>,
}

impl IdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonical spelling for `path`.
    ///
    /// The first spelling seen for an object becomes canonical; later
    /// spellings of the same object are rewritten to it.
    pub fn canonical_name(&mut self, path: &Path) -> Result<PathBuf> {
        let identity = FileIdentity::of(path)?;
        if let Some((name, _)) = self.known.iter().find(|(_, id)| *id == identity) {
            if name != path {
                debug!("{} is the same target as {}", path.display(), name.display());
            }
            return Ok(name.clone());
        }
        self.known.push((path.to_path_buf(), identity));
        Ok(path.to_path_buf())
    }

    /// Rewrite every entry of `set` to its canonical spelling, in place.
    pub fn canonicalize(&mut self, set: &mut TargetSet) -> Result<()> {
        for target in &mut set.targets {
            *target = self.canonical_name(target)?;
        }
        Ok(())
    }
}

/// Canonicalize several sets against each other, in the order given.
///
/// After this call, entries in any of the sets that refer to the same
/// directory are identical paths.
pub fn normalize_sets(sets: &mut [&mut TargetSet]) -> Result<()> {
    let mut resolver = IdentityResolver::new();
    for set in sets.iter_mut() {
        resolver.canonicalize(set)?;
    }
    Ok(())
}
