//! help, version and examples: commands that need no repository.

use std::path::PathBuf;

use clap::CommandFactory;

use crate::cli::args::Cli;
use crate::cli::output::Output;
use crate::git::Git;

const EXAMPLES: &[(&str, &str)] = &[
    ("dugit sync", "fetch, merge and push the current branch everywhere"),
    (
        "dugit sync --commit --auto-message",
        "commit local work first, with a generated message",
    ),
    (
        "dugit sync --no-warning --fast-forward",
        "sync unattended, fast-forwarding where possible",
    ),
    (
        "dugit sync --abort-merge",
        "give up on merges that fail or are cancelled",
    ),
    ("dugit commit", "stage tracked changes and commit them"),
    (
        "dugit commit --stage-all --auto-message",
        "commit everything, untracked files included",
    ),
];

/// Print usage.
pub fn run_help() -> anyhow::Result<()> {
    Cli::command().print_help()?;
    println!();
    Ok(())
}

/// Print the dugit version and, if git can be run, the git version.
pub fn run_version(git_binary: Option<PathBuf>) -> anyhow::Result<()> {
    println!("dugit {}", env!("CARGO_PKG_VERSION"));
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let git = Git::cli(git_binary.unwrap_or_else(|| PathBuf::from("git")), cwd);
    match git.version() {
        Ok(version) => println!("git {}", version),
        Err(e) => Output::warning(&format!("git not available: {}", e)),
    }
    Ok(())
}

/// Print usage examples.
pub fn run_examples() -> anyhow::Result<()> {
    Output::header("Examples");
    for (command, what) in EXAMPLES {
        println!("  {}", command);
        println!("      {}", what);
    }
    Ok(())
}
