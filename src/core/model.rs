//! Repository model: branches and remotes.
//!
//! The model is an arena keyed by name. Branches refer to remotes by
//! name only; the model owns both collections.
//!
//! # Build order
//!
//! 1. local branches
//! 2. remotes, with push and fetch URLs
//! 3. remote branches per remote
//! 4. reconcile remote branches onto local ones (or create remote-only
//!    branches)
//! 5. resolve the current branch
//!
//! Any failing step aborts the build; a partial model is never returned.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;
use tracing::debug;

use crate::git::{Direction, Git, GitError};

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("could not {step}: {source}")]
    Git {
        step: &'static str,
        #[source]
        source: GitError,
    },

    #[error("current branch '{0}' not found among local or remote branches")]
    CurrentBranchMissing(String),
}

fn step(step: &'static str) -> impl FnOnce(GitError) -> ModelError {
    move |source| ModelError::Git { step, source }
}

/// A configured remote repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remote {
    pub name: String,
    pub push_links: Vec<String>,
    pub fetch_links: Vec<String>,
}

/// A named line of work, local and/or present on remotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub name: String,
    pub is_local: bool,
    remotes: BTreeSet<String>,
}

impl Branch {
    fn local(name: &str) -> Self {
        Self {
            name: name.to_string(),
            is_local: true,
            remotes: BTreeSet::new(),
        }
    }

    fn remote_only(name: &str, remote: &str) -> Self {
        Self {
            name: name.to_string(),
            is_local: false,
            remotes: BTreeSet::from([remote.to_string()]),
        }
    }

    /// Names of remotes carrying a same-named branch.
    pub fn remote_names(&self) -> impl Iterator<Item = &str> {
        self.remotes.iter().map(String::as_str)
    }

    pub fn is_on_remote(&self, remote: &str) -> bool {
        self.remotes.contains(remote)
    }

    pub fn remote_count(&self) -> usize {
        self.remotes.len()
    }
}

/// In-memory picture of the repository's branches and remotes.
#[derive(Debug, Clone)]
pub struct Model {
    branches: BTreeMap<String, Branch>,
    remotes: BTreeMap<String, Remote>,
    current: String,
}

impl Model {
    /// Query git and assemble the model.
    pub fn build(git: &Git) -> Result<Self, ModelError> {
        let local = git
            .local_branch_names()
            .map_err(step("list local branches"))?;

        let mut remotes = Vec::new();
        let mut remote_branches = Vec::new();
        for name in git.remote_names().map_err(step("list remotes"))? {
            let push_links = git
                .remote_links(&name, Direction::Push)
                .map_err(step("list remote push URLs"))?;
            let fetch_links = git
                .remote_links(&name, Direction::Fetch)
                .map_err(step("list remote fetch URLs"))?;
            remotes.push(Remote {
                name: name.clone(),
                push_links,
                fetch_links,
            });
        }
        for remote in &remotes {
            let branches = git
                .remote_branch_names(&remote.name)
                .map_err(step("list remote branches"))?;
            remote_branches.push((remote.name.clone(), branches));
        }

        let current = git
            .current_branch_name()
            .map_err(step("determine the current branch"))?;

        let model = Self::from_parts(&local, remotes, &remote_branches, &current)?;
        debug!(
            branches = model.branches.len(),
            remotes = model.remotes.len(),
            current = %model.current,
            "repository model built"
        );
        Ok(model)
    }

    /// Reconcile already-enumerated pieces into a model.
    pub fn from_parts(
        local: &[String],
        remotes: Vec<Remote>,
        remote_branches: &[(String, Vec<String>)],
        current: &str,
    ) -> Result<Self, ModelError> {
        let mut branches: BTreeMap<String, Branch> = local
            .iter()
            .map(|name| (name.clone(), Branch::local(name)))
            .collect();

        for (remote, names) in remote_branches {
            for name in names {
                branches
                    .entry(name.clone())
                    .and_modify(|b| {
                        b.remotes.insert(remote.clone());
                    })
                    .or_insert_with(|| Branch::remote_only(name, remote));
            }
        }

        if !branches.contains_key(current) {
            return Err(ModelError::CurrentBranchMissing(current.to_string()));
        }

        Ok(Self {
            branches,
            remotes: remotes.into_iter().map(|r| (r.name.clone(), r)).collect(),
            current: current.to_string(),
        })
    }

    pub fn current_branch(&self) -> &Branch {
        // Presence is checked in `from_parts` and the map is never mutated.
        &self.branches[&self.current]
    }

    pub fn branch(&self, name: &str) -> Option<&Branch> {
        self.branches.get(name)
    }

    pub fn branches(&self) -> impl Iterator<Item = &Branch> {
        self.branches.values()
    }

    pub fn remote(&self, name: &str) -> Option<&Remote> {
        self.remotes.get(name)
    }

    pub fn remotes(&self) -> impl Iterator<Item = &Remote> {
        self.remotes.values()
    }

    /// Remotes on which `branch` exists.
    pub fn remotes_of<'a>(&'a self, branch: &'a Branch) -> impl Iterator<Item = &'a Remote> + 'a {
        branch.remote_names().filter_map(move |r| self.remotes.get(r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::testing::{git, ScriptedRunner};

    fn two_branch_fixture(current: &str) -> ScriptedRunner {
        let branch_listing = if current == "main" {
            "  feature\n* main\n"
        } else {
            "* feature\n  main\n"
        };
        ScriptedRunner::new()
            .ok("branch --no-color", branch_listing)
            .ok("remote", "origin\n")
            .ok("remote get-url --push --all origin", "/srv/app.git\n")
            .ok("remote get-url --all origin", "/srv/app.git\n")
            .ok(
                "remote -v",
                "origin\t/srv/app.git (fetch)\norigin\t/srv/app.git (push)\n",
            )
            .ok(
                "branch -r --no-color",
                "  origin/HEAD -> origin/main\n  origin/main\n",
            )
            .ok("branch --show-current", &format!("{}\n", current))
    }

    #[test]
    fn build_reconciles_local_and_remote_branches() {
        let model = Model::build(&git(two_branch_fixture("main"))).unwrap();

        let main = model.branch("main").unwrap();
        assert!(main.is_local);
        assert_eq!(main.remote_names().collect::<Vec<_>>(), vec!["origin"]);

        let feature = model.branch("feature").unwrap();
        assert!(feature.is_local);
        assert_eq!(feature.remote_count(), 0);

        assert_eq!(model.current_branch().name, "main");

        let origin = model.remote("origin").unwrap();
        assert_eq!(origin.fetch_links, vec!["/srv/app.git"]);
        assert_eq!(origin.push_links, vec!["/srv/app.git"]);
    }

    #[test]
    fn build_resolves_checked_out_branch() {
        let model = Model::build(&git(two_branch_fixture("feature"))).unwrap();
        assert_eq!(model.current_branch().name, "feature");
    }

    #[test]
    fn remote_only_branches_are_created() {
        let model = Model::from_parts(
            &["main".to_string()],
            vec![Remote {
                name: "origin".into(),
                push_links: vec![],
                fetch_links: vec![],
            }],
            &[(
                "origin".to_string(),
                vec!["main".to_string(), "release".to_string()],
            )],
            "main",
        )
        .unwrap();

        let release = model.branch("release").unwrap();
        assert!(!release.is_local);
        assert!(release.is_on_remote("origin"));
        assert!(model
            .branches()
            .all(|b| b.is_local || b.remote_count() > 0));
    }

    #[test]
    fn missing_current_branch_is_fatal() {
        let result = Model::from_parts(&["main".to_string()], vec![], &[], "ghost");
        assert!(matches!(result, Err(ModelError::CurrentBranchMissing(_))));
    }

    #[test]
    fn failing_enumeration_aborts_build() {
        let runner = ScriptedRunner::new()
            .ok("branch --no-color", "* main\n")
            .fail("remote", 128);
        let err = Model::build(&git(runner)).unwrap_err();
        assert!(matches!(err, ModelError::Git { step: "list remotes", .. }));
    }

    #[test]
    fn remotes_of_follows_names() {
        let model = Model::build(&git(two_branch_fixture("main"))).unwrap();
        let names: Vec<_> = model
            .remotes_of(model.current_branch())
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(names, vec!["origin"]);
    }
}
