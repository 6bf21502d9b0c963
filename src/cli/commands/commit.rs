//! Commit command implementation

use crate::cli::args::Flag;
use crate::cli::output::Output;
use crate::core::session::{Session, SessionError, SessionState};
use crate::git::parse::summarize_files;

/// File names listed in an automatic commit message.
const AUTO_MESSAGE_FILE_LIMIT: usize = 5;

/// Run the commit command
pub fn run_commit(session: &mut Session) -> anyhow::Result<()> {
    session.enter(SessionState::Committing);
    let committed = commit_changes(session)?;
    if !committed {
        Output::info("Nothing to commit");
    }
    session.enter(SessionState::Idle);
    Ok(())
}

/// Stage and commit local changes. Returns whether a commit was made.
///
/// Untracked files are staged with `--stage-all`, or after confirmation
/// unless `--no-warning` is set. A merge in progress is committed even
/// when nothing is staged.
pub fn commit_changes(session: &mut Session) -> Result<bool, SessionError> {
    session.ensure_not_interrupted()?;

    let untracked = session.git().untracked_files()?;
    let include_untracked = if untracked.is_empty() {
        false
    } else if session.has_flag(Flag::StageAll) {
        true
    } else if session.has_flag(Flag::NoWarning) {
        false
    } else {
        Output::header("Repository status");
        Output::block(&session.git().status_text()?);
        let question = format!("Stage {} untracked file(s) as well?", untracked.len());
        session.prompter().confirm(&question, false)?
    };

    session.ensure_not_interrupted()?;
    if include_untracked {
        session.git().stage_all()?;
    } else if !session.git().diff_unstaged()?.is_empty() {
        session.git().stage_tracked()?;
    }

    let staged = session.git().staged_file_names()?;
    let merging = session.git().merge_in_progress()?;
    if staged.is_empty() && !merging {
        return Ok(false);
    }

    let message = if session.has_flag(Flag::AutoMessage) {
        auto_message(&session.config().commit_message_prefix, &staged, merging)
    } else {
        session.prompter().input("Commit message")?
    };

    session.ensure_not_interrupted()?;
    session.git().commit(&message)?;
    Output::success(&format!(
        "Committed {} file(s) on {}",
        staged.len(),
        Output::branch_name(&session.model().current_branch().name)
    ));
    Ok(true)
}

/// Commit message built from the staged file names.
pub fn auto_message(prefix: &str, staged: &[String], merging: bool) -> String {
    let what = if merging { "merge" } else { "update" };
    let mut message = format!("{} {}", prefix, what);
    if !staged.is_empty() {
        message.push(' ');
        message.push_str(&summarize_files(staged, AUTO_MESSAGE_FILE_LIMIT));
    }
    message.trim().to_string()
}
