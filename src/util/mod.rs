//! Utility functions and helpers

pub mod cmd;
pub mod signal;

pub use cmd::{log_cmd, run_command, CmdError, CmdOutput};
