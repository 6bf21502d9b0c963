//! Interrupt notification.
//!
//! Signal handlers never touch the session. A background task flips a
//! process-wide flag and the session polls it between workflow steps,
//! running its cleanup on the main thread.
//!
//! Once the watcher is installed SIGTERM no longer kills the process
//! outright. A run blocked in a terminal prompt or a git subprocess sees
//! the flag only when that call returns.

use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// Whether an interrupt or termination signal has been received.
pub fn interrupted() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}

/// Record an interrupt.
pub fn notify_interrupt() {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

/// Clear the flag. Only meaningful in tests that share a process.
pub fn reset() {
    INTERRUPTED.store(false, Ordering::SeqCst);
}

/// Spawn the signal watcher on the current tokio runtime.
///
/// Listens for Ctrl-C everywhere and SIGTERM on Unix.
pub fn install_watcher() {
    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received");
            notify_interrupt();
        }
    });

    #[cfg(unix)]
    tokio::spawn(async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                if term.recv().await.is_some() {
                    warn!("termination signal received");
                    notify_interrupt();
                }
            }
            Err(e) => warn!(error = %e, "could not install SIGTERM handler"),
        }
    });
}
