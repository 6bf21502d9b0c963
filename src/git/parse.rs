//! Parsers for git's human-readable output.
//!
//! These encode column assumptions about `git branch`, `git branch -r`,
//! `git remote -v`, `git --version` and `git stash list`. They are the
//! compatibility contract with the installed git and are tested against
//! captured output rather than a live binary.

use once_cell::sync::Lazy;
use regex::Regex;

use super::GitError;

/// Width of the marker column in `git branch` output (`* `, `  `, `+ `).
pub const BRANCH_MARKER_WIDTH: usize = 2;

/// Marker git prints for a remote's symbolic HEAD (`origin/HEAD -> origin/main`).
pub const SYMBOLIC_REF_MARKER: &str = " -> ";

static VERSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^git version (\d+(?:\.\d+)*)").expect("valid regex"));

static STASH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(stash@\{\d+\}): (.*)$").expect("valid regex"));

/// Extract the version number from `git version X.Y.Z[ (vendor)]`.
pub fn parse_version(line: &str) -> Result<String, GitError> {
    VERSION_RE
        .captures(line.trim())
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| GitError::Parse(format!("unrecognised version line: {:?}", line)))
}

/// Strip the marker column from each `git branch` line.
///
/// Exactly [`BRANCH_MARKER_WIDTH`] characters are removed from every
/// line. A shorter line means the format changed under us and is an
/// error. Detached-HEAD pseudo entries (`(HEAD detached at ...)`) are not
/// branches and are skipped.
pub fn parse_local_branches(lines: &[String]) -> Result<Vec<String>, GitError> {
    let mut names = Vec::with_capacity(lines.len());
    for line in lines {
        let name = trim_front(line, BRANCH_MARKER_WIDTH)?;
        if name.starts_with('(') {
            continue;
        }
        names.push(name.to_string());
    }
    Ok(names)
}

/// Pick the branches of `remote` out of `git branch -r` output.
///
/// Lines look like `  origin/main`. The indent plus `<remote>/` prefix is
/// removed, i.e. `remote.len() + 3` characters. Symbolic HEAD entries are
/// skipped, as are lines belonging to other remotes.
pub fn parse_remote_branches(lines: &[String], remote: &str) -> Result<Vec<String>, GitError> {
    let prefix = format!("{}/", remote);
    let mut names = Vec::new();
    for line in lines {
        if line.contains(SYMBOLIC_REF_MARKER) {
            continue;
        }
        let entry = trim_front(line, BRANCH_MARKER_WIDTH)?;
        if let Some(name) = entry.strip_prefix(&prefix) {
            if !name.is_empty() {
                names.push(name.to_string());
            }
        }
    }
    Ok(names)
}

/// Filter candidate URLs of `remote` against `git remote -v` output.
///
/// A candidate is kept if some verbose line starts with the remote name,
/// carries the direction marker (`(fetch)`/`(push)`) and names the URL.
/// The separator between name and URL is a tab, which output
/// sanitization removes, so the remainder after the name is matched
/// after trimming any leftover whitespace.
pub fn filter_remote_links(
    verbose: &[String],
    remote: &str,
    candidates: &[String],
    marker: &str,
) -> Vec<String> {
    let mut links = Vec::new();
    for url in candidates {
        let listed = verbose.iter().any(|line| {
            let Some(rest) = line.strip_prefix(remote) else {
                return false;
            };
            let Some(body) = rest.trim().strip_suffix(marker) else {
                return false;
            };
            body.trim_end() == url
        });
        if listed && !links.contains(url) {
            links.push(url.clone());
        }
    }
    links
}

/// Find the `stash@{n}` reference of the entry whose message ends with `message`.
pub fn find_stash(lines: &[String], message: &str) -> Option<String> {
    lines.iter().find_map(|line| {
        let caps = STASH_RE.captures(line)?;
        let text = caps.get(2)?.as_str();
        if text.ends_with(message) {
            caps.get(1).map(|m| m.as_str().to_string())
        } else {
            None
        }
    })
}

/// Build a short commit summary from staged file names.
pub fn summarize_files(names: &[String], limit: usize) -> String {
    let shown: Vec<&str> = names.iter().take(limit).map(String::as_str).collect();
    let mut summary = shown.join(", ");
    if names.len() > limit {
        summary.push_str(&format!(" and {} more", names.len() - limit));
    }
    summary
}

fn trim_front(line: &str, width: usize) -> Result<&str, GitError> {
    match line.char_indices().nth(width) {
        Some((idx, _)) => Ok(&line[idx..]),
        None if line.chars().count() == width => Ok(""),
        None => Err(GitError::Parse(format!(
            "line shorter than the expected {}-character prefix: {:?}",
            width, line
        ))),
    }
}
