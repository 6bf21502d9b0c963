//! Git branch operations

use super::parse::{parse_local_branches, parse_remote_branches};
use super::{Git, GitError};

impl Git {
    /// Names of all local branches, in `git branch` order.
    pub fn local_branch_names(&self) -> Result<Vec<String>, GitError> {
        let lines = self.lines(&["branch", "--no-color"])?;
        parse_local_branches(&lines)
    }

    /// Names of the branches `remote` has, without the `<remote>/` prefix.
    pub fn remote_branch_names(&self, remote: &str) -> Result<Vec<String>, GitError> {
        let lines = self.lines(&["branch", "-r", "--no-color"])?;
        parse_remote_branches(&lines, remote)
    }

    /// Name of the checked-out branch.
    ///
    /// A detached HEAD has no current branch and is reported as
    /// [`GitError::BranchNotFound`].
    pub fn current_branch_name(&self) -> Result<String, GitError> {
        let out = self.run(&["branch", "--show-current"])?;
        match out.lines().into_iter().next() {
            Some(name) if !name.is_empty() => Ok(name),
            _ => Err(GitError::BranchNotFound("HEAD is detached".to_string())),
        }
    }
}
