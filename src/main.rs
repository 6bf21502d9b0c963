//! dugit CLI entry point

use std::process::ExitCode;

use clap::Parser;

use dugit::cli::commands::{commit, info, sync};
use dugit::cli::output::Output;
use dugit::cli::prompts::{DialoguerPrompter, PromptError};
use dugit::cli::{Cli, Command};
use dugit::core::session::{CleanupReport, Session, SessionError, SessionOptions};
use dugit::telemetry::{init_telemetry, TelemetryConfig};
use dugit::util::signal;

const EXIT_FATAL: u8 = 1;
const EXIT_INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    // clap prints its own message and exits with 2 on a bad command line.
    let cli = Cli::parse();

    if let Err(e) = init_telemetry(&TelemetryConfig::for_cli(cli.verbose)) {
        eprintln!("warning: logging unavailable: {}", e);
    }
    signal::install_watcher();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if is_interrupt(&e) => {
            Output::error("interrupted");
            ExitCode::from(EXIT_INTERRUPTED)
        }
        Err(e) => {
            eprintln!("fatal: {:#}", e);
            ExitCode::from(EXIT_FATAL)
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let request = cli.request();
    tracing::debug!(command = ?request.command, flags = ?request.flags, "request");

    match request.command {
        Command::Help => info::run_help(),
        Command::Version => info::run_version(cli.git.clone()),
        Command::Examples => info::run_examples(),
        Command::Commit | Command::Sync => {
            let options = SessionOptions::new(request.flags, Box::new(DialoguerPrompter::new()))
                .git_binary(cli.git.clone());
            let mut session = Session::start(options)?;

            let result = match request.command {
                Command::Commit => commit::run_commit(&mut session),
                _ => sync::run_sync(&mut session),
            };

            report_cleanup(&session.cleanup());
            result
        }
    }
}

fn report_cleanup(report: &CleanupReport) {
    if let Some(message) = &report.stash_popped {
        Output::info(&format!("Restored stashed changes ({})", message));
    }
    for warning in &report.warnings {
        Output::warning(warning);
    }
}

fn is_interrupt(err: &anyhow::Error) -> bool {
    signal::interrupted()
        || err
            .downcast_ref::<SessionError>()
            .is_some_and(SessionError::is_interrupt)
        || matches!(
            err.downcast_ref::<PromptError>(),
            Some(PromptError::Interrupted)
        )
}
