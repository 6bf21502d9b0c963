//! dugit: sync a git repository with all of its remotes.
//!
//! One session per invocation: discover the repository, take the
//! advisory lock in `.dugit/`, build a model of branches and remotes,
//! then commit or sync the current branch.

pub mod cli;
pub mod core;
pub mod files;
pub mod git;
pub mod telemetry;
pub mod util;
