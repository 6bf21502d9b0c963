//! Command-line arguments.
//!
//! clap validates the raw arguments once; the result is turned into a
//! typed [`Request`] (one [`Command`] plus a set of [`Flag`]s) that the
//! dispatcher consumes. Unknown commands or flags are rejected by clap
//! before anything touches the repository.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde::Deserialize;

#[derive(Parser, Debug)]
#[command(name = "dugit")]
#[command(
    version,
    about = "Sync a git repository with all of its remotes",
    long_about = None,
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Show debug logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// git binary to run
    #[arg(long, env = "DUGIT_GIT", global = true, value_name = "PATH")]
    pub git: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub flags: FlagArgs,
}

/// The recognised commands.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Show usage information
    Help,
    /// Show dugit and git versions
    Version,
    /// Show usage examples
    Examples,
    /// Stage and commit local changes
    Commit,
    /// Fetch, merge and push the current branch across all remotes
    Sync,
}

/// Boolean toggles, accepted before or after the command.
#[derive(Args, Debug, Clone, Default)]
pub struct FlagArgs {
    /// Generate commit messages instead of asking for one
    #[arg(long, global = true)]
    pub auto_message: bool,

    /// Stage untracked files too, without asking
    #[arg(long, global = true)]
    pub stage_all: bool,

    /// Commit local changes before syncing instead of stashing them
    #[arg(long = "commit", visible_alias = "commit-local", global = true)]
    pub commit_local: bool,

    /// Abort a merge automatically when it fails or is left unfinished
    #[arg(long, global = true)]
    pub abort_merge: bool,

    /// Skip confirmation prompts
    #[arg(long, global = true)]
    pub no_warning: bool,

    /// Allow fast-forward merges
    #[arg(long, global = true)]
    pub fast_forward: bool,

    /// Keep staged changes in the index when stashing
    #[arg(long, global = true)]
    pub keep_index: bool,
}

/// One boolean toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Flag {
    AutoMessage,
    StageAll,
    #[serde(alias = "commit")]
    CommitLocal,
    AbortMerge,
    NoWarning,
    FastForward,
    KeepIndex,
}

impl Flag {
    /// Spelling on the command line.
    pub fn cli_name(self) -> &'static str {
        match self {
            Flag::AutoMessage => "--auto-message",
            Flag::StageAll => "--stage-all",
            Flag::CommitLocal => "--commit",
            Flag::AbortMerge => "--abort-merge",
            Flag::NoWarning => "--no-warning",
            Flag::FastForward => "--fast-forward",
            Flag::KeepIndex => "--keep-index",
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cli_name())
    }
}

/// Set of enabled flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flags(BTreeSet<Flag>);

impl Flags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, flag: Flag) -> Self {
        self.0.insert(flag);
        self
    }

    pub fn insert(&mut self, flag: Flag) {
        self.0.insert(flag);
    }

    pub fn contains(&self, flag: Flag) -> bool {
        self.0.contains(&flag)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Extend<Flag> for Flags {
    fn extend<I: IntoIterator<Item = Flag>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl FromIterator<Flag> for Flags {
    fn from_iter<I: IntoIterator<Item = Flag>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<&FlagArgs> for Flags {
    fn from(args: &FlagArgs) -> Self {
        [
            (args.auto_message, Flag::AutoMessage),
            (args.stage_all, Flag::StageAll),
            (args.commit_local, Flag::CommitLocal),
            (args.abort_merge, Flag::AbortMerge),
            (args.no_warning, Flag::NoWarning),
            (args.fast_forward, Flag::FastForward),
            (args.keep_index, Flag::KeepIndex),
        ]
        .into_iter()
        .filter_map(|(on, flag)| on.then_some(flag))
        .collect()
    }
}

/// A validated invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub command: Command,
    pub flags: Flags,
}

impl Cli {
    /// Turn parsed arguments into a request; no command means `help`.
    pub fn request(&self) -> Request {
        Request {
            command: self.command.unwrap_or(Command::Help),
            flags: Flags::from(&self.flags),
        }
    }
}
