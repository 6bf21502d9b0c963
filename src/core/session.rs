//! Session lifecycle.
//!
//! A [`Session`] is the working context of one `commit` or `sync` run:
//! the git adapter pointed at the repository, the held lock, the built
//! model, the effective flags and a record of what needs undoing.
//!
//! # States
//!
//! ```text
//! Uninitialized -> DependenciesChecked -> LockAcquired -> ModelBuilt -> Ready
//!     Ready -> Syncing | Committing -> Idle
//!     any -> Terminated (cleanup)
//! ```
//!
//! Startup runs every step up to `Ready` or fails without running any
//! command. Cleanup is explicit ([`Session::cleanup`]) and idempotent;
//! `Drop` runs it as a backstop.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cli::args::{Flag, Flags};
use crate::cli::prompts::{PromptError, Prompter};
use crate::core::config::{ConfigError, DugitConfig};
use crate::core::discovery::{self, DiscoveryError};
use crate::core::lock::{LockError, SessionLock, LOCK_FILE_NAME};
use crate::core::model::{Model, ModelError};
use crate::git::{Git, GitCli, GitError};
use crate::util::signal;

/// Errors that stop a session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error("cannot determine the working directory: {0}")]
    WorkingDir(#[source] io::Error),

    #[error("{0}")]
    Workflow(String),

    #[error("interrupted")]
    Interrupted,
}

impl SessionError {
    /// Whether the error stems from a user interrupt.
    pub fn is_interrupt(&self) -> bool {
        matches!(
            self,
            SessionError::Interrupted | SessionError::Prompt(PromptError::Interrupted)
        )
    }
}

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    DependenciesChecked,
    LockAcquired,
    ModelBuilt,
    Ready,
    Syncing,
    Committing,
    Idle,
    Terminated,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::DependenciesChecked => "dependencies-checked",
            SessionState::LockAcquired => "lock-acquired",
            SessionState::ModelBuilt => "model-built",
            SessionState::Ready => "ready",
            SessionState::Syncing => "syncing",
            SessionState::Committing => "committing",
            SessionState::Idle => "idle",
            SessionState::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// Inputs to [`Session::start`].
pub struct SessionOptions {
    /// Directory to start discovery from; the process cwd when `None`.
    pub working_dir: Option<PathBuf>,
    /// git binary; `None` falls back to the config file, then `git`.
    pub git_binary: Option<PathBuf>,
    pub flags: Flags,
    pub prompter: Box<dyn Prompter>,
}

impl SessionOptions {
    pub fn new(flags: Flags, prompter: Box<dyn Prompter>) -> Self {
        Self {
            working_dir: None,
            git_binary: None,
            flags,
            prompter,
        }
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn git_binary(mut self, binary: Option<PathBuf>) -> Self {
        self.git_binary = binary;
        self
    }
}

/// What happened to an unfinished merge during cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeCleanup {
    None,
    Aborted,
    LeftInProgress,
}

/// Outcome of [`Session::cleanup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupReport {
    pub lock_released: bool,
    pub merge: MergeCleanup,
    /// Stash entry restored, if any.
    pub stash_popped: Option<String>,
    /// Stash entry left in place, if any.
    pub stash_kept: Option<String>,
    pub warnings: Vec<String>,
}

impl CleanupReport {
    fn empty() -> Self {
        Self {
            lock_released: false,
            merge: MergeCleanup::None,
            stash_popped: None,
            stash_kept: None,
            warnings: Vec::new(),
        }
    }
}

/// Owner token recorded in the lock file: the parent process id.
pub fn owner_token() -> String {
    #[cfg(unix)]
    {
        std::os::unix::process::parent_id().to_string()
    }
    #[cfg(not(unix))]
    {
        std::process::id().to_string()
    }
}

pub struct Session {
    git: Git,
    git_version: String,
    owner: String,
    working_dir: PathBuf,
    root: PathBuf,
    toplevel: PathBuf,
    metadata_dir: PathBuf,
    lock: Option<SessionLock>,
    stash_message: Option<String>,
    flags: Flags,
    config: DugitConfig,
    model: Model,
    prompter: Box<dyn Prompter>,
    state: SessionState,
}

impl Session {
    /// Check dependencies, discover the repository, take the lock and
    /// build the model.
    pub fn start(options: SessionOptions) -> Result<Self, SessionError> {
        let SessionOptions {
            working_dir,
            git_binary,
            mut flags,
            prompter,
        } = options;
        let mut state = SessionState::Uninitialized;

        let explicit_binary = git_binary.is_some();
        let cli = GitCli::new(git_binary.unwrap_or_else(|| PathBuf::from("git")));
        cli.check_dependency()?;
        transition(&mut state, SessionState::DependenciesChecked);

        let working_dir = match working_dir {
            Some(dir) => dir,
            None => std::env::current_dir().map_err(SessionError::WorkingDir)?,
        };
        let mut git = Git::new(Box::new(cli), working_dir.clone());
        let git_version = git.version()?;
        debug!(%git_version, "git detected");

        if !git.is_inside_work_tree(&working_dir) {
            return Err(GitError::NotARepo(working_dir.display().to_string()).into());
        }

        let root = discovery::superproject_root(&git, &working_dir)?;
        let metadata_dir = match discovery::find_metadata_dir(&git, &working_dir)? {
            Some(dir) => dir,
            None => discovery::create_metadata_dir(&root)?,
        };
        let toplevel = discovery::toplevel(&git, &working_dir)?;
        git.set_workdir(&toplevel);

        let config = DugitConfig::load(&metadata_dir)?;
        if let (false, Some(binary)) = (explicit_binary, config.git.as_ref()) {
            let cli = GitCli::new(binary.clone());
            cli.check_dependency()?;
            git = Git::new(Box::new(cli), toplevel.clone());
        }
        flags.extend(config.default_flags.iter().copied());

        let owner = owner_token();
        let lock = SessionLock::acquire(&metadata_dir.join(LOCK_FILE_NAME), &owner)?;
        transition(&mut state, SessionState::LockAcquired);

        // The lock guard is dropped (and released) if this fails.
        let model = Model::build(&git)?;
        transition(&mut state, SessionState::ModelBuilt);
        transition(&mut state, SessionState::Ready);

        info!(
            root = %root.display(),
            branch = %model.current_branch().name,
            "session ready"
        );

        Ok(Self {
            git,
            git_version,
            owner,
            working_dir,
            root,
            toplevel,
            metadata_dir,
            lock: Some(lock),
            stash_message: None,
            flags,
            config,
            model,
            prompter,
            state,
        })
    }

    pub fn git(&self) -> &Git {
        &self.git
    }

    pub fn git_version(&self) -> &str {
        &self.git_version
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Superproject root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory git commands run in.
    pub fn toplevel(&self) -> &Path {
        &self.toplevel
    }

    pub fn metadata_dir(&self) -> &Path {
        &self.metadata_dir
    }

    pub fn lock_path(&self) -> PathBuf {
        self.metadata_dir.join(LOCK_FILE_NAME)
    }

    pub fn is_locked(&self) -> bool {
        self.lock.as_ref().is_some_and(SessionLock::is_held)
    }

    pub fn flags(&self) -> &Flags {
        &self.flags
    }

    pub fn has_flag(&self, flag: Flag) -> bool {
        self.flags.contains(flag)
    }

    pub fn config(&self) -> &DugitConfig {
        &self.config
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn prompter(&mut self) -> &mut dyn Prompter {
        self.prompter.as_mut()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Move to a working state. Nothing moves out of `Terminated`.
    pub fn enter(&mut self, next: SessionState) {
        if self.state != SessionState::Terminated {
            transition(&mut self.state, next);
        }
    }

    /// Fail with [`SessionError::Interrupted`] once a signal arrived.
    pub fn ensure_not_interrupted(&self) -> Result<(), SessionError> {
        if signal::interrupted() {
            warn!(state = %self.state, "interrupt received");
            Err(SessionError::Interrupted)
        } else {
            Ok(())
        }
    }

    /// Stash entry taken by this session, if any.
    pub fn stash_message(&self) -> Option<&str> {
        self.stash_message.as_deref()
    }

    /// Stash tracked changes under a name unique to this session.
    pub fn stash_changes(&mut self) -> Result<String, SessionError> {
        let message = format!(
            "{}-{}-{}",
            self.config.stash_message_prefix,
            self.owner,
            chrono::Local::now().format("%Y%m%d%H%M%S")
        );
        self.git
            .stash_push(&message, self.has_flag(Flag::KeepIndex))?;
        info!(%message, "local changes stashed");
        self.stash_message = Some(message.clone());
        Ok(message)
    }

    /// Release the lock and undo what the session left behind.
    ///
    /// An unfinished merge is aborted under `--abort-merge`; otherwise it
    /// is left for the user and the stash is not popped on top of it.
    /// Running cleanup again is a no-op.
    pub fn cleanup(&mut self) -> CleanupReport {
        let mut report = CleanupReport::empty();
        if self.state == SessionState::Terminated {
            return report;
        }

        let pop_allowed = match self.git.merge_in_progress() {
            Ok(false) => true,
            Ok(true) if self.has_flag(Flag::AbortMerge) => match self.git.merge_abort() {
                Ok(()) => {
                    report.merge = MergeCleanup::Aborted;
                    true
                }
                Err(e) => {
                    report.merge = MergeCleanup::LeftInProgress;
                    report.warnings.push(format!("could not abort the merge: {}", e));
                    false
                }
            },
            Ok(true) => {
                report.merge = MergeCleanup::LeftInProgress;
                report
                    .warnings
                    .push("a merge is still in progress; finish or abort it".to_string());
                false
            }
            Err(e) => {
                report
                    .warnings
                    .push(format!("could not inspect merge state: {}", e));
                false
            }
        };

        if let Some(message) = self.stash_message.take() {
            if !pop_allowed {
                report
                    .warnings
                    .push(format!("stashed changes kept as '{}'", message));
                report.stash_kept = Some(message);
            } else {
                match self.git.stash_pop_named(&message) {
                    Ok(()) => report.stash_popped = Some(message),
                    Err(e) => {
                        report
                            .warnings
                            .push(format!("could not restore stash '{}': {}", message, e));
                        report.stash_kept = Some(message);
                    }
                }
            }
        }

        if let Some(mut lock) = self.lock.take() {
            match lock.release() {
                Ok(()) => report.lock_released = true,
                Err(e) => report.warnings.push(e.to_string()),
            }
        }

        for warning in &report.warnings {
            warn!("{}", warning);
        }
        transition(&mut self.state, SessionState::Terminated);
        report
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.state != SessionState::Terminated {
            let report = self.cleanup();
            debug!(?report, "cleanup on drop");
        }
    }
}

fn transition(state: &mut SessionState, next: SessionState) {
    debug!(from = %state, to = %next, "session state");
    *state = next;
}
