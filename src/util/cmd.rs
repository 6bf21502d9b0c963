//! Process runner for external commands.
//!
//! Every external invocation in dugit goes through [`run_command`]: the
//! child is spawned with piped stdout/stderr, the calling thread blocks
//! until it exits, and the captured text is sanitized before anyone
//! parses it.

use std::io;
use std::process::Command;
use thiserror::Error;
use tracing::debug;

/// Errors from running an external command.
#[derive(Debug, Error)]
pub enum CmdError {
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("`{command}` exited with status {code}: {stderr}")]
    Failed {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("`{command}` produced no output, expected exactly one line")]
    NoOutput { command: String },

    #[error("`{command}` produced {lines} lines, expected exactly one")]
    TooManyLines { command: String, lines: usize },
}

/// Captured output of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CmdOutput {
    pub stdout: String,
    pub stderr: String,
    pub code: i32,
}

impl CmdOutput {
    /// Stdout split into lines (zero or more).
    pub fn lines(&self) -> Vec<String> {
        split_lines(&self.stdout)
    }

    /// Stdout as exactly one line.
    pub fn single_line(&self, command: &str) -> Result<String, CmdError> {
        let mut lines = self.lines();
        match lines.len() {
            0 => Err(CmdError::NoOutput {
                command: command.to_string(),
            }),
            1 => Ok(lines.remove(0)),
            n => Err(CmdError::TooManyLines {
                command: command.to_string(),
                lines: n,
            }),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.stdout.trim().is_empty()
    }
}

/// Log a command just before execution.
///
/// Emits a `tracing::debug!` event with the program name, arguments, and
/// working directory. Visible with `--verbose` or
/// `RUST_LOG=dugit::cmd=debug`.
pub fn log_cmd(cmd: &Command) {
    let program = cmd.get_program().to_string_lossy();
    let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy()).collect();
    let cwd = cmd
        .get_current_dir()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    debug!(
        target: "dugit::cmd",
        %program,
        ?args,
        %cwd,
        "exec"
    );
}

/// Render a command as a single display string (`git branch -r`).
pub fn describe(cmd: &Command) -> String {
    let mut parts = vec![cmd.get_program().to_string_lossy().into_owned()];
    parts.extend(cmd.get_args().map(|a| a.to_string_lossy().into_owned()));
    parts.join(" ")
}

/// Run a command to completion and capture its output.
///
/// Returns [`CmdError::Failed`] on a non-zero exit code. Output is passed
/// through [`sanitize`] before being returned.
pub fn run_command(cmd: &mut Command) -> Result<CmdOutput, CmdError> {
    log_cmd(cmd);
    let output = cmd.output().map_err(|source| CmdError::Spawn {
        program: cmd.get_program().to_string_lossy().into_owned(),
        source,
    })?;

    // Killed by a signal: no exit code.
    let code = output.status.code().unwrap_or(-1);
    let stdout = sanitize(&String::from_utf8_lossy(&output.stdout));
    let stderr = sanitize(&String::from_utf8_lossy(&output.stderr));

    debug!(target: "dugit::cmd", code, "exit");

    if !output.status.success() {
        return Err(CmdError::Failed {
            command: describe(cmd),
            code,
            stderr: stderr.trim().to_string(),
        });
    }

    Ok(CmdOutput {
        stdout,
        stderr,
        code,
    })
}

/// Strip control characters other than newline.
pub fn sanitize(text: &str) -> String {
    text.chars().filter(|c| *c == '\n' || !c.is_control()).collect()
}

/// Split text into lines, dropping a trailing empty line.
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines().map(str::to_string).collect()
}
