//! Git stash operations

use tracing::debug;

use super::parse::find_stash;
use super::{Git, GitError};

impl Git {
    /// Stash tracked changes under `message`.
    pub fn stash_push(&self, message: &str, keep_index: bool) -> Result<(), GitError> {
        let mut args = vec!["stash", "push", "-m", message];
        if keep_index {
            args.push("--keep-index");
        }
        self.run(&args)?;
        debug!(message, keep_index, "stash pushed");
        Ok(())
    }

    /// Pop the stash entry carrying `message`.
    ///
    /// Fails with [`GitError::OperationFailed`] if no such entry exists,
    /// so a foreign stash is never popped by mistake.
    pub fn stash_pop_named(&self, message: &str) -> Result<(), GitError> {
        let lines = self.lines(&["stash", "list"])?;
        let reference = find_stash(&lines, message).ok_or_else(|| {
            GitError::OperationFailed(format!("no stash entry named {}", message))
        })?;
        self.run(&["stash", "pop", &reference])?;
        debug!(%reference, "stash popped");
        Ok(())
    }
}
