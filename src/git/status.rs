//! Git status and diff queries

use super::{Git, GitError};

impl Git {
    /// Human-readable `git status` for showing to the user.
    pub fn status_text(&self) -> Result<String, GitError> {
        Ok(self.run(&["status"])?.stdout)
    }

    /// Untracked, non-ignored files.
    pub fn untracked_files(&self) -> Result<Vec<String>, GitError> {
        self.lines(&["ls-files", "--others", "--exclude-standard"])
    }

    /// Changes in the working tree not yet staged (tracked files only).
    pub fn diff_unstaged(&self) -> Result<String, GitError> {
        Ok(self.run(&["diff", "--no-color"])?.stdout)
    }

    /// Names of files staged for the next commit.
    pub fn staged_file_names(&self) -> Result<Vec<String>, GitError> {
        self.lines(&["diff", "--cached", "--name-only"])
    }

    /// Everything that differs from HEAD, staged or not.
    pub fn diff_head(&self) -> Result<String, GitError> {
        Ok(self.run(&["diff", "HEAD", "--no-color"])?.stdout)
    }

    /// Whether tracked files have staged or unstaged modifications.
    pub fn has_uncommitted_changes(&self) -> Result<bool, GitError> {
        let lines = self.lines(&["status", "--porcelain", "--untracked-files=no"])?;
        Ok(!lines.is_empty())
    }

    /// Whether a merge is in progress (`MERGE_HEAD` exists).
    pub fn merge_in_progress(&self) -> Result<bool, GitError> {
        match self.run(&["rev-parse", "-q", "--verify", "MERGE_HEAD"]) {
            Ok(_) => Ok(true),
            Err(e) if e.is_exit_failure() => Ok(false),
            Err(e) => Err(e),
        }
    }
}
