//! Optional per-repository configuration.
//!
//! Read from `<metadata-dir>/config.yaml`. Every key is optional:
//!
//! ```yaml
//! git: /usr/local/bin/git
//! default_flags: [no-warning, fast-forward]
//! stash_message_prefix: dugit
//! commit_message_prefix: "dugit:"
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::cli::args::Flag;

/// File name of the configuration inside the metadata directory.
pub const CONFIG_FILE_NAME: &str = "config.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DugitConfig {
    /// git binary override. `DUGIT_GIT` takes precedence.
    pub git: Option<PathBuf>,
    /// Flags switched on for every invocation.
    pub default_flags: Vec<Flag>,
    /// Prefix of stash entry messages.
    pub stash_message_prefix: String,
    /// Prefix of automatic commit messages.
    pub commit_message_prefix: String,
}

impl Default for DugitConfig {
    fn default() -> Self {
        Self {
            git: None,
            default_flags: Vec::new(),
            stash_message_prefix: "dugit".to_string(),
            commit_message_prefix: "dugit:".to_string(),
        }
    }
}

impl DugitConfig {
    /// Parse YAML content.
    pub fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `config.yaml` from the metadata directory; absent means defaults.
    pub fn load(metadata_dir: &Path) -> Result<Self, ConfigError> {
        let path = metadata_dir.join(CONFIG_FILE_NAME);
        match std::fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content, &path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read { path, source }),
        }
    }
}
