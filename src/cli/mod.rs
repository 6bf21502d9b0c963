//! CLI layer
//!
//! Command-line interface using clap.

pub mod args;
pub mod commands;
pub mod output;
pub mod prompts;

pub use args::{Cli, Command, Flag, Flags, Request};
pub use output::Output;
