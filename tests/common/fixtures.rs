//! Test fixtures for creating repositories with remotes.
//!
//! A `RepoBuilder` creates bare remotes seeded with one commit on `main`
//! and a working clone of the first one, with every other remote added
//! and fetched -- all offline.

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use dugit::cli::args::Flags;
use dugit::cli::prompts::{Answer, ScriptedPrompter};
use dugit::core::session::{Session, SessionError, SessionOptions};

use super::git_helpers;

/// A working clone plus its bare remotes, removed on drop.
pub struct RepoFixture {
    /// Kept alive for the lifetime of the fixture.
    pub _temp: TempDir,
    /// Canonical path of the working clone.
    pub work: PathBuf,
    /// Directory holding bare remotes and scratch clones.
    pub base: PathBuf,
    pub remote_names: Vec<String>,
}

impl RepoFixture {
    /// Path to a bare remote.
    pub fn remote_path(&self, name: &str) -> PathBuf {
        self.base.join("remotes").join(format!("{}.git", name))
    }

    /// file:// URL of a bare remote.
    pub fn remote_url(&self, name: &str) -> String {
        format!("file://{}", self.remote_path(name).display())
    }

    /// Clone `remote` into a scratch directory, e.g. to act as another user.
    pub fn scratch_clone(&self, remote: &str, dir_name: &str) -> PathBuf {
        let dest = self.base.join(dir_name);
        git_helpers::clone_repo(&self.remote_url(remote), &dest);
        dest
    }

    /// Commit a file in a scratch clone of `remote` and push it there.
    pub fn push_upstream_change(&self, remote: &str, filename: &str, content: &str) -> String {
        let dir_name = format!("upstream-{}-{}", remote, filename.replace('/', "_"));
        let clone = self.scratch_clone(remote, &dir_name);
        let sha = git_helpers::commit_file(&clone, filename, content, &format!("Add {}", filename));
        git_helpers::push_branch(&clone, "origin", "main");
        sha
    }

    /// Independent repository inside the working clone, with one commit
    /// and no remotes. The outer clone excludes it.
    pub fn nested_repo(&self, dir_name: &str) -> PathBuf {
        let inner = self.work.join(dir_name);
        git_helpers::init_repo(&inner);
        git_helpers::commit_file(&inner, "TOOL.md", "# vendored\n", "Add TOOL.md");
        let exclude = self.work.join(".git").join("info").join("exclude");
        let mut patterns = fs::read_to_string(&exclude).unwrap_or_default();
        patterns.push_str(&format!("{}/\n", dir_name));
        fs::write(&exclude, patterns).unwrap();
        inner
    }

    /// Head of `main` on a bare remote.
    pub fn remote_head(&self, name: &str) -> String {
        git_helpers::ref_sha(&self.remote_path(name), "main")
    }

    /// Start a session in the working clone with scripted answers.
    pub fn session(&self, flags: Flags, answers: Vec<Answer>) -> Result<Session, SessionError> {
        let options = SessionOptions::new(flags, Box::new(ScriptedPrompter::new(answers)))
            .working_dir(&self.work);
        Session::start(options)
    }
}

/// Builder for repository fixtures.
pub struct RepoBuilder {
    remotes: Vec<String>,
    files: Vec<(String, String)>,
}

impl RepoBuilder {
    pub fn new() -> Self {
        Self {
            remotes: vec!["origin".to_string()],
            files: vec![("README.md".to_string(), "# fixture\n".to_string())],
        }
    }

    /// Add another remote carrying the same initial history.
    pub fn add_remote(mut self, name: &str) -> Self {
        self.remotes.push(name.to_string());
        self
    }

    /// Add a file to the initial commit set.
    pub fn add_file(mut self, name: &str, content: &str) -> Self {
        self.files.push((name.to_string(), content.to_string()));
        self
    }

    pub fn build(self) -> RepoFixture {
        let temp = TempDir::new().expect("failed to create temp dir");
        let base = fs::canonicalize(temp.path()).unwrap();
        let remotes_dir = base.join("remotes");
        fs::create_dir_all(&remotes_dir).unwrap();

        let seed = base.join("seed");
        git_helpers::init_repo(&seed);
        for (name, content) in &self.files {
            git_helpers::commit_file(&seed, name, content, &format!("Add {}", name));
        }

        for name in &self.remotes {
            let bare = remotes_dir.join(format!("{}.git", name));
            git_helpers::init_bare_repo(&bare);
            let url = format!("file://{}", bare.display());
            git_helpers::add_remote(&seed, name, &url);
            git_helpers::push_branch(&seed, name, "main");
        }

        let work = base.join("work");
        let first_url = format!("file://{}", remotes_dir.join("origin.git").display());
        git_helpers::clone_repo(&first_url, &work);
        for name in self.remotes.iter().filter(|n| n.as_str() != "origin") {
            let url = format!("file://{}", remotes_dir.join(format!("{}.git", name)).display());
            git_helpers::add_remote(&work, name, &url);
            git_helpers::fetch(&work, name);
        }

        RepoFixture {
            _temp: temp,
            work,
            base,
            remote_names: self.remotes,
        }
    }
}

impl Default for RepoBuilder {
    fn default() -> Self {
        Self::new()
    }
}
