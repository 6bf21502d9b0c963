//! Custom assertion helpers for dugit integration tests.

use std::path::Path;

use super::git_helpers;

/// Assert that a file exists at the given path.
pub fn assert_file_exists(path: &Path) {
    assert!(path.exists(), "Expected file to exist: {}", path.display());
}

/// Assert that no merge is in progress.
pub fn assert_no_merge(repo_path: &Path) {
    assert!(
        !git_helpers::merge_in_progress(repo_path),
        "Expected no merge in progress in {}",
        repo_path.display()
    );
}

/// Assert that `path` is listed as untracked.
pub fn assert_untracked(repo_path: &Path, path: &str) {
    let status = git_helpers::porcelain_status(repo_path);
    assert!(
        status.lines().any(|l| l == format!("?? {}", path)),
        "Expected {} to be untracked in {}, status:\n{}",
        path,
        repo_path.display(),
        status
    );
}

/// Assert that a bare remote's `main` equals the local HEAD.
pub fn assert_remote_at_head(remote_path: &Path, repo_path: &Path) {
    let remote = git_helpers::ref_sha(remote_path, "main");
    let local = git_helpers::head_sha(repo_path);
    assert_eq!(
        remote,
        local,
        "Expected {} main to be at local HEAD",
        remote_path.display()
    );
}
