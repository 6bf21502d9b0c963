//! Advisory session lock.
//!
//! The lock lives at `<metadata-dir>/.lock`. Mutual exclusion comes from
//! an OS-level exclusive advisory lock (`fs2`), which the kernel drops
//! automatically when the owning process dies. On top of that the owner
//! token (the parent process id) is appended to the file as a line, so
//! [`SessionLock::check`] can tell which session believes it holds the
//! lock.
//!
//! # Invariants
//!
//! - While held, the file is OS-locked and contains a line equal to the
//!   owner token.
//! - Acquisition is non-blocking: contention fails fast with
//!   [`LockError::AlreadyLocked`].
//! - Release truncates the file, then drops the OS lock. Dropping the
//!   guard releases too.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;
use tracing::debug;

use crate::files;

/// File name of the lock inside the metadata directory.
pub const LOCK_FILE_NAME: &str = ".lock";

/// Errors from locking operations.
#[derive(Debug, Error)]
pub enum LockError {
    /// Another process already holds the lock.
    #[error("repository is locked by another dugit session ({0})")]
    AlreadyLocked(PathBuf),

    /// Failed to create or open the lock file.
    #[error("failed to create lock: {0}")]
    CreateFailed(String),

    /// Failed to acquire the OS lock.
    #[error("failed to acquire lock: {0}")]
    AcquireFailed(String),

    /// Failed to record the owner token.
    #[error("failed to record lock owner: {0}")]
    OwnerWriteFailed(String),

    /// Failed to release the lock.
    #[error("failed to release lock: {0}")]
    ReleaseFailed(String),

    #[error("lock i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// An exclusive lock on the metadata directory.
#[derive(Debug)]
pub struct SessionLock {
    path: PathBuf,
    owner: String,
    /// Open handle carrying the OS lock. `Some` while held.
    file: Option<File>,
}

impl SessionLock {
    /// Take the lock at `path` on behalf of `owner`.
    ///
    /// Opens or creates the file, takes the OS-level exclusive lock, then
    /// appends `owner` as a new line. If the owner line cannot be written
    /// the OS lock is dropped again and an error returned.
    pub fn acquire(path: &Path, owner: &str) -> Result<Self, LockError> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| {
                LockError::CreateFailed(format!("cannot open {}: {}", path.display(), e))
            })?;

        match file.try_lock_exclusive() {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                return Err(LockError::AlreadyLocked(path.to_path_buf()))
            }
            Err(e) => {
                // fs2 reports contention as `lock_contended_error`, which is
                // not WouldBlock on every platform.
                if e.raw_os_error() == fs2::lock_contended_error().raw_os_error() {
                    return Err(LockError::AlreadyLocked(path.to_path_buf()));
                }
                return Err(LockError::AcquireFailed(e.to_string()));
            }
        }

        if let Err(e) = append_owner(&mut file, owner) {
            let _ = file.unlock();
            return Err(LockError::OwnerWriteFailed(e.to_string()));
        }

        debug!(path = %path.display(), owner, "session lock acquired");

        Ok(Self {
            path: path.to_path_buf(),
            owner: owner.to_string(),
            file: Some(file),
        })
    }

    /// True iff the file at `path` exists and has a line equal to `owner`.
    pub fn check(path: &Path, owner: &str) -> bool {
        files::file_exists(path) && files::line_exists(path, owner).unwrap_or(false)
    }

    /// Whether this guard still holds the OS lock.
    pub fn is_held(&self) -> bool {
        self.file.is_some()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Truncate the lock file and drop the OS lock.
    ///
    /// Safe to call more than once.
    pub fn release(&mut self) -> Result<(), LockError> {
        if let Some(file) = self.file.take() {
            file.set_len(0)
                .map_err(|e| LockError::ReleaseFailed(e.to_string()))?;
            file.unlock()
                .map_err(|e| LockError::ReleaseFailed(e.to_string()))?;
            debug!(path = %self.path.display(), "session lock released");
        }
        Ok(())
    }
}

impl Drop for SessionLock {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            let _ = file.set_len(0);
            let _ = file.unlock();
        }
    }
}

/// Append the owner token through the locked handle.
fn append_owner(file: &mut File, owner: &str) -> std::io::Result<()> {
    let len = file.seek(SeekFrom::End(0))?;
    if len > 0 {
        file.seek(SeekFrom::End(-1))?;
        let mut last = [0u8; 1];
        file.read_exact(&mut last)?;
        file.seek(SeekFrom::End(0))?;
        if last[0] != b'\n' {
            file.write_all(b"\n")?;
        }
    }
    writeln!(file, "{}", owner)?;
    file.flush()
}
