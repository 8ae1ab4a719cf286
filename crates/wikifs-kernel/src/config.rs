//! wikifs configuration.
//!
//! A TOML file lists the workspace folders a host offers and where the wiki
//! lives inside each of them:
//!
//! ```toml
//! wiki_dir = ".vscode/.wiki"
//!
//! [[workspace]]
//! name = "notes"
//! path = "~/src/notes"
//!
//! [[workspace]]
//! name = "work"
//! path = "/srv/work"
//! index = 0
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::vfs::{DEFAULT_WIKI_DIR, WikiHost, WorkspaceFolder};

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("cannot expand workspace path {path:?}: {message}")]
    Expand { path: String, message: String },
}

/// One `[[workspace]]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkspaceEntry {
    pub name: String,
    /// Workspace directory; `~` and `$VARS` are expanded.
    pub path: String,
    /// Ordering; defaults to the entry's position in the file.
    #[serde(default)]
    pub index: Option<usize>,
    /// URI scheme; defaults to `file`.
    #[serde(default)]
    pub scheme: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WikiConfig {
    /// Wiki directory relative to each workspace.
    #[serde(default = "default_wiki_dir")]
    pub wiki_dir: PathBuf,

    #[serde(default, rename = "workspace")]
    pub workspaces: Vec<WorkspaceEntry>,
}

fn default_wiki_dir() -> PathBuf {
    PathBuf::from(DEFAULT_WIKI_DIR)
}

impl Default for WikiConfig {
    fn default() -> Self {
        Self {
            wiki_dir: default_wiki_dir(),
            workspaces: Vec::new(),
        }
    }
}

impl WikiConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(
            path = %path.display(),
            workspaces = config.workspaces.len(),
            "loaded config"
        );
        Ok(config)
    }

    /// A single workspace rooted at `dir`, named after its last component.
    pub fn for_directory(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            wiki_dir: default_wiki_dir(),
            workspaces: vec![WorkspaceEntry {
                name,
                path: dir.to_string_lossy().into_owned(),
                index: Some(0),
                scheme: None,
            }],
        }
    }

    /// Workspace folders with paths expanded and indexes filled in.
    pub fn folders(&self) -> Result<Vec<WorkspaceFolder>, ConfigError> {
        self.workspaces
            .iter()
            .enumerate()
            .map(|(position, entry)| {
                let expanded = shellexpand::full(&entry.path).map_err(|e| ConfigError::Expand {
                    path: entry.path.clone(),
                    message: e.to_string(),
                })?;
                let mut folder = WorkspaceFolder::new(
                    entry.name.clone(),
                    entry.index.unwrap_or(position),
                    PathBuf::from(expanded.as_ref()),
                );
                if let Some(scheme) = &entry.scheme {
                    folder = folder.with_scheme(scheme.clone());
                }
                Ok(folder)
            })
            .collect()
    }

    /// Build the host view the router serves.
    pub fn host(&self) -> Result<WikiHost, ConfigError> {
        Ok(WikiHost::new(self.folders()?).with_wiki_dir(self.wiki_dir.clone()))
    }
}
