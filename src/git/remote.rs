//! Git remote operations

use tracing::debug;

use super::parse::filter_remote_links;
use super::{Git, GitError};

/// Direction of a remote URL as printed by `git remote -v`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Fetch,
    Push,
}

impl Direction {
    /// Marker printed after the URL.
    pub fn marker(self) -> &'static str {
        match self {
            Direction::Fetch => "(fetch)",
            Direction::Push => "(push)",
        }
    }
}

impl Git {
    /// Names of all configured remotes.
    pub fn remote_names(&self) -> Result<Vec<String>, GitError> {
        self.lines(&["remote"])
    }

    /// URLs of `remote` in the given direction.
    ///
    /// Candidates come from `git remote get-url --all` (and `--push` for
    /// push URLs) and are kept only when `git remote -v` lists them with
    /// the matching direction marker.
    pub fn remote_links(&self, remote: &str, direction: Direction) -> Result<Vec<String>, GitError> {
        let candidates = match direction {
            Direction::Fetch => self.lines(&["remote", "get-url", "--all", remote])?,
            Direction::Push => self.lines(&["remote", "get-url", "--push", "--all", remote])?,
        };
        let verbose = self.lines(&["remote", "-v"])?;
        Ok(filter_remote_links(
            &verbose,
            remote,
            &candidates,
            direction.marker(),
        ))
    }

    /// Fetch `branch` from `remote`, updating `<remote>/<branch>`.
    pub fn fetch(&self, remote: &str, branch: &str) -> Result<(), GitError> {
        self.run(&["fetch", remote, branch])?;
        debug!(remote, branch, "fetch complete");
        Ok(())
    }

    /// Push `branch` to `remote`.
    pub fn push(&self, remote: &str, branch: &str) -> Result<(), GitError> {
        self.run(&["push", remote, branch])?;
        debug!(remote, branch, "push complete");
        Ok(())
    }

    /// One-line log of commits reachable from `to` but not from `from`.
    pub fn log_between(&self, from: &str, to: &str) -> Result<Vec<String>, GitError> {
        let range = format!("{}..{}", from, to);
        self.lines(&["log", "--oneline", "--no-color", &range])
    }
}

/// Tracking ref name for `branch` on `remote`.
pub fn tracking_ref(remote: &str, branch: &str) -> String {
    format!("{}/{}", remote, branch)
}
