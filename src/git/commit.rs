//! Staging, commit and merge operations

use tracing::debug;

use super::{Git, GitError};

/// Fast-forward policy for merges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// Allow a fast-forward when possible (`--ff`).
    FastForward,
    /// Always create a merge commit (`--no-ff`).
    NoFastForward,
}

impl MergePolicy {
    fn flag(self) -> &'static str {
        match self {
            MergePolicy::FastForward => "--ff",
            MergePolicy::NoFastForward => "--no-ff",
        }
    }
}

impl Git {
    /// Stage modifications and deletions of tracked files.
    pub fn stage_tracked(&self) -> Result<(), GitError> {
        self.run(&["add", "--update"])?;
        Ok(())
    }

    /// Stage everything, untracked files included.
    pub fn stage_all(&self) -> Result<(), GitError> {
        self.run(&["add", "--all"])?;
        Ok(())
    }

    /// Commit the index with `message`.
    pub fn commit(&self, message: &str) -> Result<(), GitError> {
        self.run(&["commit", "--quiet", "-m", message])?;
        debug!(message, "committed");
        Ok(())
    }

    /// Merge `reference` without committing, leaving the result staged.
    ///
    /// A fast-forward under [`MergePolicy::FastForward`] still moves the
    /// branch immediately; there is nothing left to commit in that case.
    pub fn merge_no_commit(&self, reference: &str, policy: MergePolicy) -> Result<(), GitError> {
        self.run(&["merge", "--no-commit", policy.flag(), reference])?;
        debug!(reference, ?policy, "merge applied");
        Ok(())
    }

    /// Abort an in-progress merge.
    pub fn merge_abort(&self) -> Result<(), GitError> {
        self.run(&["merge", "--abort"])?;
        debug!("merge aborted");
        Ok(())
    }
}
