//! Repository discovery.
//!
//! Two upward walks from a starting directory, both driven by
//! `git rev-parse --is-inside-work-tree`:
//!
//! - **superproject root**: keep climbing while git says we are inside a
//!   working tree; the last directory that passed is the root of the
//!   outermost repository.
//! - **toplevel**: climb until the first directory (inclusive of the
//!   start) that holds a `.git` entry. A directory for ordinary
//!   repositories, a file for submodules and worktrees. This is the
//!   repository git commands run against, which may be nested inside the
//!   superproject.
//!
//! A start outside any working tree yields [`DiscoveryError::NotFound`]
//! from both, never a guessed path.
//!
//! The dugit metadata directory (`.dugit/`) sits at the superproject
//! root and is listed in that root's `.gitignore`.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::files;
use crate::git::Git;

/// Name of git's own metadata entry in a working tree root.
pub const GIT_ENTRY_NAME: &str = ".git";

/// Name of the dugit metadata directory.
pub const METADATA_DIR_NAME: &str = ".dugit";

/// Entry written to `.gitignore` for the metadata directory.
pub const IGNORE_ENTRY: &str = ".dugit/";

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("not inside a git working tree: {0}")]
    NotFound(PathBuf),

    #[error("cannot prepare {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn normalize(start: &Path) -> PathBuf {
    std::fs::canonicalize(start).unwrap_or_else(|_| start.to_path_buf())
}

/// Root of the outermost working tree containing `start`.
pub fn superproject_root(git: &Git, start: &Path) -> Result<PathBuf, DiscoveryError> {
    let mut current = normalize(start);
    let mut last_valid: Option<PathBuf> = None;

    while git.is_inside_work_tree(&current) {
        last_valid = Some(current.clone());
        match current.parent() {
            Some(parent) if parent != current => current = parent.to_path_buf(),
            _ => break,
        }
    }

    debug!(start = %start.display(), root = ?last_valid, "superproject discovery");
    last_valid.ok_or_else(|| DiscoveryError::NotFound(start.to_path_buf()))
}

/// Nearest ancestor of `start` (inclusive) holding a `.git` entry.
pub fn toplevel(git: &Git, start: &Path) -> Result<PathBuf, DiscoveryError> {
    let mut current = normalize(start);

    while git.is_inside_work_tree(&current) {
        let entry = current.join(GIT_ENTRY_NAME);
        if files::dir_exists(&entry) || files::file_exists(&entry) {
            debug!(start = %start.display(), toplevel = %current.display(), "toplevel discovery");
            return Ok(current);
        }
        match current.parent() {
            Some(parent) if parent != current => current = parent.to_path_buf(),
            _ => break,
        }
    }

    Err(DiscoveryError::NotFound(start.to_path_buf()))
}

/// Path of the metadata directory under `root`, whether or not it exists.
pub fn metadata_path(root: &Path) -> PathBuf {
    root.join(METADATA_DIR_NAME)
}

/// Existing metadata directory for the repository containing `start`.
///
/// `Ok(None)` means the repository was found but has no `.dugit/` yet.
pub fn find_metadata_dir(git: &Git, start: &Path) -> Result<Option<PathBuf>, DiscoveryError> {
    let root = superproject_root(git, start)?;
    let dir = metadata_path(&root);
    Ok(files::dir_exists(&dir).then_some(dir))
}

/// Create the metadata directory under `root` and ignore it.
pub fn create_metadata_dir(root: &Path) -> Result<PathBuf, DiscoveryError> {
    let dir = metadata_path(root);
    std::fs::create_dir_all(&dir).map_err(|source| DiscoveryError::Io {
        path: dir.clone(),
        source,
    })?;
    ensure_ignored(root)?;
    debug!(dir = %dir.display(), "metadata directory ready");
    Ok(dir)
}

/// Add the metadata directory to `<root>/.gitignore` if not already there.
///
/// Returns `true` if the file changed.
pub fn ensure_ignored(root: &Path) -> Result<bool, DiscoveryError> {
    let gitignore = root.join(".gitignore");
    files::ensure_line(&gitignore, IGNORE_ENTRY).map_err(|source| DiscoveryError::Io {
        path: gitignore,
        source,
    })
}
