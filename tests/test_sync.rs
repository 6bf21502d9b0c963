//! Integration tests for the sync command.

mod common;

use std::fs;

use dugit::cli::args::{Flag, Flags};
use dugit::cli::commands::sync::run_sync;
use dugit::cli::prompts::{Answer, MergeReview};
use dugit::core::session::SessionState;

use common::assertions::{assert_file_exists, assert_no_merge, assert_remote_at_head};
use common::fixtures::RepoBuilder;
use common::git_helpers;

fn unattended() -> Flags {
    Flags::new().with(Flag::NoWarning).with(Flag::AutoMessage)
}

#[test]
fn test_sync_merges_and_pushes_remote_change() {
    let fx = RepoBuilder::new().build();
    let upstream = fx.push_upstream_change("origin", "upstream.txt", "from elsewhere\n");

    let mut session = fx.session(unattended(), vec![]).unwrap();
    run_sync(&mut session).unwrap();
    assert_eq!(session.state(), SessionState::Idle);
    let report = session.cleanup();
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);

    assert_file_exists(&fx.work.join("upstream.txt"));
    assert_no_merge(&fx.work);
    assert!(git_helpers::log_contains(&fx.work, "dugit: merge upstream.txt"));
    // Merge commit on top of the upstream commit, pushed back.
    assert_eq!(
        git_helpers::ref_sha(&fx.work, "HEAD^2"),
        upstream
    );
    assert_remote_at_head(&fx.remote_path("origin"), &fx.work);
}

#[test]
fn test_sync_without_changes_is_a_no_op() {
    let fx = RepoBuilder::new().build();
    let before = git_helpers::head_sha(&fx.work);
    let remote_before = fx.remote_head("origin");

    let mut session = fx.session(unattended(), vec![]).unwrap();
    run_sync(&mut session).unwrap();
    session.cleanup();

    assert_eq!(git_helpers::head_sha(&fx.work), before);
    assert_eq!(fx.remote_head("origin"), remote_before);
}

#[test]
fn test_sync_pushes_only_where_behind() {
    let fx = RepoBuilder::new().add_remote("backup").build();
    git_helpers::commit_file(&fx.work, "local.txt", "mine\n", "Local work");
    git_helpers::push_branch(&fx.work, "origin", "main");
    let origin_before = fx.remote_head("origin");

    let mut session = fx.session(unattended(), vec![]).unwrap();
    run_sync(&mut session).unwrap();
    session.cleanup();

    // origin already had the commit and is left alone.
    assert_eq!(fx.remote_head("origin"), origin_before);
    assert_remote_at_head(&fx.remote_path("backup"), &fx.work);
}

#[test]
fn test_sync_fast_forward() {
    let fx = RepoBuilder::new().build();
    let upstream = fx.push_upstream_change("origin", "upstream.txt", "ff\n");

    let flags = unattended().with(Flag::FastForward);
    let mut session = fx.session(flags, vec![]).unwrap();
    run_sync(&mut session).unwrap();
    session.cleanup();

    assert_eq!(git_helpers::head_sha(&fx.work), upstream);
    assert_remote_at_head(&fx.remote_path("origin"), &fx.work);
}

#[test]
fn test_sync_stashes_and_restores_local_edits() {
    let fx = RepoBuilder::new().build();
    fx.push_upstream_change("origin", "upstream.txt", "from elsewhere\n");
    fs::write(fx.work.join("README.md"), "# unfinished\n").unwrap();

    let mut session = fx.session(unattended(), vec![]).unwrap();
    run_sync(&mut session).unwrap();
    assert!(session.stash_message().is_some());
    let report = session.cleanup();

    assert!(report.stash_popped.is_some());
    assert_eq!(
        fs::read_to_string(fx.work.join("README.md")).unwrap(),
        "# unfinished\n"
    );
    assert_file_exists(&fx.work.join("upstream.txt"));
    assert_eq!(git_helpers::stash_count(&fx.work), 0);
    assert_remote_at_head(&fx.remote_path("origin"), &fx.work);
}

#[test]
fn test_sync_commit_local_first() {
    let fx = RepoBuilder::new().build();
    fs::write(fx.work.join("README.md"), "# committed by sync\n").unwrap();

    let flags = unattended().with(Flag::CommitLocal);
    let mut session = fx.session(flags, vec![]).unwrap();
    run_sync(&mut session).unwrap();
    assert!(session.stash_message().is_none());
    session.cleanup();

    assert!(git_helpers::log_contains(&fx.work, "dugit: update README.md"));
    assert_remote_at_head(&fx.remote_path("origin"), &fx.work);
}

#[test]
fn test_cancelled_merge_is_aborted_with_flag() {
    let fx = RepoBuilder::new().build();
    fx.push_upstream_change("origin", "upstream.txt", "from elsewhere\n");
    let before = git_helpers::head_sha(&fx.work);

    let flags = Flags::new().with(Flag::AbortMerge);
    let answers = vec![Answer::Review(MergeReview::Cancel)];
    let mut session = fx.session(flags, answers).unwrap();
    assert!(run_sync(&mut session).is_err());
    session.cleanup();

    assert_no_merge(&fx.work);
    assert_eq!(git_helpers::head_sha(&fx.work), before);
    assert!(!fx.work.join("upstream.txt").exists());
}

#[test]
fn test_merge_reviewed_then_committed() {
    let fx = RepoBuilder::new().build();
    fx.push_upstream_change("origin", "upstream.txt", "from elsewhere\n");

    let answers = vec![
        Answer::Review(MergeReview::ShowDiff),
        Answer::Review(MergeReview::Commit),
        // .gitignore gained the metadata entry and is untracked.
        Answer::Confirm(false),
        Answer::Input("Merge upstream work".to_string()),
    ];
    let mut session = fx.session(Flags::new(), answers).unwrap();
    run_sync(&mut session).unwrap();
    session.cleanup();

    assert!(git_helpers::log_contains(&fx.work, "Merge upstream work"));
    assert_remote_at_head(&fx.remote_path("origin"), &fx.work);
}

#[test]
fn test_conflicting_merge_left_for_user() {
    let fx = RepoBuilder::new().build();
    fx.push_upstream_change("origin", "README.md", "# theirs\n");
    git_helpers::commit_file(&fx.work, "README.md", "# ours\n", "Local edit");

    let mut session = fx.session(unattended(), vec![]).unwrap();
    assert!(run_sync(&mut session).is_err());
    let report = session.cleanup();

    assert!(git_helpers::merge_in_progress(&fx.work));
    assert!(!report.warnings.is_empty());
}

#[test]
fn test_keep_index_commits_staged_changes_before_merge() {
    let fx = RepoBuilder::new().add_file("notes.txt", "first\n").build();
    fx.push_upstream_change("origin", "upstream.txt", "from elsewhere\n");
    fs::write(fx.work.join("README.md"), "# staged\n").unwrap();
    git_helpers::git(&fx.work, &["add", "README.md"]);
    fs::write(fx.work.join("notes.txt"), "unstaged\n").unwrap();

    let flags = unattended().with(Flag::KeepIndex);
    let mut session = fx.session(flags, vec![]).unwrap();
    run_sync(&mut session).unwrap();
    let report = session.cleanup();

    assert!(report.stash_popped.is_some());
    assert!(git_helpers::log_contains(&fx.work, "dugit: update README.md"));
    assert_file_exists(&fx.work.join("upstream.txt"));
    assert_eq!(
        fs::read_to_string(fx.work.join("notes.txt")).unwrap(),
        "unstaged\n"
    );
    assert_eq!(git_helpers::stash_count(&fx.work), 0);
    assert_remote_at_head(&fx.remote_path("origin"), &fx.work);
}

#[test]
fn test_unreachable_remote_is_skipped() {
    let fx = RepoBuilder::new().add_remote("backup").build();
    let backup_before = fx.remote_head("backup");
    git_helpers::git(
        &fx.work,
        &["remote", "set-url", "backup", "file:///nonexistent/backup.git"],
    );
    fx.push_upstream_change("origin", "upstream.txt", "from elsewhere\n");
    git_helpers::commit_file(&fx.work, "local.txt", "mine\n", "Local work");

    let mut session = fx.session(unattended(), vec![]).unwrap();
    run_sync(&mut session).unwrap();
    assert_eq!(session.state(), SessionState::Idle);
    session.cleanup();

    assert_file_exists(&fx.work.join("upstream.txt"));
    assert_remote_at_head(&fx.remote_path("origin"), &fx.work);
    // Never fetched, so never pushed to.
    assert_eq!(fx.remote_head("backup"), backup_before);
}
