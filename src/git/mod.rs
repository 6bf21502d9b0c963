//! Git operations wrapper
//!
//! dugit never links a git library: every operation is a `git` subprocess
//! whose text output is parsed. All of that lives here, behind
//! [`GitRunner`], so the rest of the crate only sees typed results and the
//! parsing rules in [`parse`] can be tested against fixed strings.

pub mod branch;
pub mod commit;
pub mod parse;
pub mod remote;
pub mod stash;
pub mod status;

pub use commit::MergePolicy;
pub use remote::Direction;

use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

use crate::util::cmd::{run_command, CmdError, CmdOutput};

/// Errors that can occur during git operations
#[derive(Error, Debug)]
pub enum GitError {
    #[error(transparent)]
    Cmd(#[from] CmdError),

    #[error("missing dependency: {0} was not found on PATH")]
    MissingDependency(String),

    #[error("not inside a git working tree: {0}")]
    NotARepo(String),

    #[error("branch not found: {0}")]
    BranchNotFound(String),

    #[error("unexpected git output: {0}")]
    Parse(String),

    #[error("operation failed: {0}")]
    OperationFailed(String),
}

impl GitError {
    /// True when git ran but exited non-zero.
    pub fn is_exit_failure(&self) -> bool {
        matches!(self, GitError::Cmd(CmdError::Failed { .. }))
    }
}

/// Executes git with a given argument list in a given directory.
///
/// The production implementation is [`GitCli`]; tests substitute a
/// scripted runner.
pub trait GitRunner {
    fn run(&self, dir: &Path, args: &[&str]) -> Result<CmdOutput, GitError>;
}

/// Runs the real `git` binary.
#[derive(Debug, Clone)]
pub struct GitCli {
    binary: PathBuf,
}

impl GitCli {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Resolve the binary on `PATH`, failing if it is absent.
    pub fn check_dependency(&self) -> Result<PathBuf, GitError> {
        which::which(&self.binary)
            .map_err(|_| GitError::MissingDependency(self.binary.display().to_string()))
    }
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new("git")
    }
}

impl GitRunner for GitCli {
    fn run(&self, dir: &Path, args: &[&str]) -> Result<CmdOutput, GitError> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(args)
            .current_dir(dir)
            // Keep output stable for parsing and never block on a pager
            // or credential prompt we cannot show.
            .env("LC_ALL", "C")
            .env("GIT_PAGER", "cat")
            .env("GIT_TERMINAL_PROMPT", "0");
        Ok(run_command(&mut cmd)?)
    }
}

/// The external-collaborator adapter: logical git operations against one
/// working directory.
pub struct Git {
    runner: Box<dyn GitRunner>,
    workdir: PathBuf,
}

impl Git {
    pub fn new(runner: Box<dyn GitRunner>, workdir: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            workdir: workdir.into(),
        }
    }

    /// Adapter over the real `git` binary.
    pub fn cli(binary: impl Into<PathBuf>, workdir: impl Into<PathBuf>) -> Self {
        Self::new(Box::new(GitCli::new(binary)), workdir)
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Point the adapter at another directory (e.g. the discovered root).
    pub fn set_workdir(&mut self, workdir: impl Into<PathBuf>) {
        self.workdir = workdir.into();
    }

    /// Run git in the working directory.
    pub fn run(&self, args: &[&str]) -> Result<CmdOutput, GitError> {
        self.runner.run(&self.workdir, args)
    }

    /// Run git in an arbitrary directory.
    pub fn run_in(&self, dir: &Path, args: &[&str]) -> Result<CmdOutput, GitError> {
        self.runner.run(dir, args)
    }

    /// Run git expecting zero or more lines.
    pub fn lines(&self, args: &[&str]) -> Result<Vec<String>, GitError> {
        Ok(self.run(args)?.lines())
    }

    /// Run git expecting exactly one line.
    pub fn single_line(&self, args: &[&str]) -> Result<String, GitError> {
        let out = self.run(args)?;
        Ok(out.single_line(&format!("git {}", args.join(" ")))?)
    }

    /// Detected git version, e.g. `2.43.0`.
    pub fn version(&self) -> Result<String, GitError> {
        let line = self.single_line(&["--version"])?;
        parse::parse_version(&line)
    }

    /// Ask git whether `dir` is inside a tracked working tree.
    ///
    /// A failing `rev-parse` (not a repository, or the directory vanished)
    /// is a plain `false`.
    pub fn is_inside_work_tree(&self, dir: &Path) -> bool {
        match self.run_in(dir, &["rev-parse", "--is-inside-work-tree"]) {
            Ok(out) => out.lines().first().map(|l| l == "true").unwrap_or(false),
            Err(_) => false,
        }
    }
}
