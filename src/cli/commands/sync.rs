//! Sync command implementation
//!
//! Fetch the current branch from every remote that carries it, merge
//! what is new, commit the merge, then push wherever the local branch is
//! ahead. Local changes are stashed first (or committed with `--commit`).

use std::collections::BTreeSet;

use tracing::{info, warn};

use crate::cli::args::Flag;
use crate::cli::commands::commit::commit_changes;
use crate::cli::output::Output;
use crate::cli::prompts::MergeReview;
use crate::core::session::{Session, SessionError, SessionState};
use crate::git::remote::tracking_ref;
use crate::git::MergePolicy;

/// Run the sync command
pub fn run_sync(session: &mut Session) -> anyhow::Result<()> {
    session.enter(SessionState::Syncing);

    if session.has_flag(Flag::CommitLocal) {
        commit_changes(session)?;
    } else {
        stash_local_changes(session)?;
    }

    let branch = session.model().current_branch().name.clone();
    let remotes: Vec<String> = session
        .model()
        .current_branch()
        .remote_names()
        .map(str::to_string)
        .collect();

    if remotes.is_empty() {
        Output::warning(&format!(
            "{} is not on any remote; nothing to sync",
            Output::branch_name(&branch)
        ));
        session.enter(SessionState::Idle);
        return Ok(());
    }

    Output::header(&format!(
        "Syncing {} with {} remote(s)",
        Output::branch_name(&branch),
        remotes.len()
    ));

    let unreachable = merge_from_remotes(session, &branch, &remotes)?;

    if session.git().merge_in_progress()? {
        conclude_merge(session, &branch)?;
    }

    push_to_remotes(session, &branch, &remotes, &unreachable)?;

    session.enter(SessionState::Idle);
    Ok(())
}

/// Stash uncommitted tracked changes before syncing.
///
/// During an unfinished merge nothing can be stashed; the merge has to be
/// committed first (after confirmation unless `--no-warning`). With
/// `--keep-index` the staged changes stay behind and are committed here,
/// since git will not merge into an index that differs from `HEAD`.
pub fn stash_local_changes(session: &mut Session) -> Result<(), SessionError> {
    session.ensure_not_interrupted()?;
    if !session.git().has_uncommitted_changes()? {
        return Ok(());
    }

    if session.git().merge_in_progress()? {
        let commit = session.has_flag(Flag::NoWarning)
            || session
                .prompter()
                .confirm("A merge is in progress. Commit it before syncing?", true)?;
        if !commit {
            return Err(SessionError::Workflow(
                "a merge is in progress; commit or abort it before syncing".to_string(),
            ));
        }
        commit_changes(session)?;
        return Ok(());
    }

    let message = session.stash_changes()?;
    Output::info(&format!("Stashed local changes as {}", message));

    if session.has_flag(Flag::KeepIndex) && !session.git().staged_file_names()?.is_empty() {
        Output::info("Committing the kept index before merging");
        commit_changes(session)?;
    }
    Ok(())
}

/// Fetch each remote and merge what it has that we lack.
///
/// A failed fetch is reported and that remote skipped; a failed merge
/// stops the sync. Returns the remotes that could not be fetched.
fn merge_from_remotes(
    session: &mut Session,
    branch: &str,
    remotes: &[String],
) -> Result<BTreeSet<String>, SessionError> {
    let mut unreachable = BTreeSet::new();
    let policy = if session.has_flag(Flag::FastForward) {
        MergePolicy::FastForward
    } else {
        MergePolicy::NoFastForward
    };

    for remote in remotes {
        session.ensure_not_interrupted()?;

        let spinner = Output::spinner(&format!("Fetching {}...", Output::remote_name(remote)));
        let fetched = session.git().fetch(remote, branch);
        spinner.finish_and_clear();
        if let Err(e) = fetched {
            Output::error(&format!("fetch from {} failed: {}", remote, e));
            warn!(remote = %remote, error = %e, "fetch failed");
            unreachable.insert(remote.clone());
            continue;
        }

        let tracking = tracking_ref(remote, branch);
        let incoming = session.git().log_between("HEAD", &tracking)?;
        if incoming.is_empty() {
            Output::info(&format!("{}: nothing to merge", Output::remote_name(remote)));
            continue;
        }

        Output::info(&format!(
            "{}: {} new commit(s)",
            Output::remote_name(remote),
            incoming.len()
        ));
        for line in &incoming {
            Output::list_item(line);
        }

        session.ensure_not_interrupted()?;
        if let Err(e) = session.git().merge_no_commit(&tracking, policy) {
            Output::error(&format!("merge of {} failed: {}", tracking, e));
            abort_or_leave_merge(session)?;
            return Err(SessionError::Workflow(format!("merge of {} failed", tracking)));
        }
        info!(%tracking, ?policy, "merged");

        // A second merge cannot start on top of an uncommitted one.
        if session.git().merge_in_progress()? {
            conclude_merge(session, &tracking)?;
        } else {
            Output::success(&format!("Fast-forwarded to {}", tracking));
        }
    }

    Ok(unreachable)
}

/// Confirm and commit a merge that is ready.
///
/// Without `--no-warning` the status is shown and the user may look at
/// the diff before deciding. Anything other than commit cancels.
fn conclude_merge(session: &mut Session, source: &str) -> Result<(), SessionError> {
    session.ensure_not_interrupted()?;

    if !session.has_flag(Flag::NoWarning) {
        Output::header("Merge ready");
        Output::block(&session.git().status_text()?);
        let question = format!("Commit the merge of {}?", source);
        loop {
            match session.prompter().review_merge(&question)? {
                MergeReview::Commit => break,
                MergeReview::ShowDiff => Output::diff(&session.git().diff_head()?),
                MergeReview::Cancel => {
                    abort_or_leave_merge(session)?;
                    return Err(SessionError::Workflow(format!(
                        "merge of {} not committed",
                        source
                    )));
                }
            }
        }
    }

    commit_changes(session)?;
    Ok(())
}

fn abort_or_leave_merge(session: &mut Session) -> Result<(), SessionError> {
    if !session.git().merge_in_progress()? {
        return Ok(());
    }
    if session.has_flag(Flag::AbortMerge) {
        session.git().merge_abort()?;
        Output::warning("Merge aborted");
    } else {
        Output::warning("Merge left in progress; resolve it and commit, or run `git merge --abort`");
    }
    Ok(())
}

/// Push the branch to every reachable remote it is ahead of.
fn push_to_remotes(
    session: &mut Session,
    branch: &str,
    remotes: &[String],
    unreachable: &BTreeSet<String>,
) -> Result<(), SessionError> {
    for remote in remotes.iter().filter(|r| !unreachable.contains(*r)) {
        session.ensure_not_interrupted()?;

        let tracking = tracking_ref(remote, branch);
        let outgoing = session.git().log_between(&tracking, "HEAD")?;
        if outgoing.is_empty() {
            Output::info(&format!("{}: nothing to push", Output::remote_name(remote)));
            info!(remote = %remote, "nothing to push");
            continue;
        }

        let spinner = Output::spinner(&format!("Pushing to {}...", Output::remote_name(remote)));
        let pushed = session.git().push(remote, branch);
        spinner.finish_and_clear();
        match pushed {
            Ok(()) => Output::success(&format!(
                "Pushed {} commit(s) to {}",
                outgoing.len(),
                Output::remote_name(remote)
            )),
            Err(e) => {
                Output::error(&format!("push to {} failed: {}", remote, e));
                return Err(SessionError::Workflow(format!("push to {} failed", remote)));
            }
        }
    }
    Ok(())
}
