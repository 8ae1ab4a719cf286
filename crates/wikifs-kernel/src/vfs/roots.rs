//! Workspace → root directory selection.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;

use super::error::{WikiError, WikiResult};
use super::paths::Root;

/// Default location of the wiki inside a workspace.
pub const DEFAULT_WIKI_DIR: &str = ".vscode/.wiki";

/// A workspace folder offered by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceFolder {
    /// Display name; matched case-insensitively against the URI authority.
    pub name: String,
    /// Host ordering; lower comes first.
    pub index: usize,
    /// URI scheme of the folder. Only local folders (`""` or `file`) can back a wiki.
    #[serde(default = "default_scheme")]
    pub scheme: String,
    /// Real directory of the workspace.
    pub path: PathBuf,
}

fn default_scheme() -> String {
    "file".to_string()
}

impl WorkspaceFolder {
    /// A local workspace folder.
    pub fn new(name: impl Into<String>, index: usize, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            index,
            scheme: default_scheme(),
            path: path.into(),
        }
    }

    /// Override the folder's URI scheme.
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn is_local(&self) -> bool {
        matches!(normalize(&self.scheme).as_str(), "" | "file")
    }
}

/// What the host offers to every store: its workspace folders and where
/// the wiki lives inside each of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikiHost {
    pub folders: Vec<WorkspaceFolder>,
    /// Relative directory joined onto a workspace to form its root.
    pub wiki_dir: PathBuf,
}

impl WikiHost {
    pub fn new(folders: Vec<WorkspaceFolder>) -> Self {
        Self {
            folders,
            wiki_dir: PathBuf::from(DEFAULT_WIKI_DIR),
        }
    }

    pub fn with_wiki_dir(mut self, wiki_dir: impl Into<PathBuf>) -> Self {
        self.wiki_dir = wiki_dir.into();
        self
    }

    /// Select the root for `authority`.
    pub fn select_root(&self, authority: &str) -> WikiResult<Root> {
        RootSelector::select(authority, &self.folders, &self.wiki_dir)
    }
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Picks the root backing a URI authority.
pub struct RootSelector;

impl RootSelector {
    /// Select the root for `authority` among `folders`.
    ///
    /// Local folders are ordered by `(index, lowercase name)`. An empty
    /// authority takes the first; otherwise exactly one folder must match
    /// by lowercase name. The root directory is `<folder>/<wiki_dir>`.
    pub fn select(authority: &str, folders: &[WorkspaceFolder], wiki_dir: &Path) -> WikiResult<Root> {
        let mut local: Vec<&WorkspaceFolder> = folders.iter().filter(|f| f.is_local()).collect();
        if local.is_empty() {
            return Err(WikiError::NoRootAvailable);
        }
        local.sort_by_cached_key(|f| (f.index, normalize(&f.name)));

        let wanted = normalize(authority);
        let selected = if wanted.is_empty() {
            local[0]
        } else {
            let mut matches = local.iter().filter(|f| normalize(&f.name) == wanted);
            match (matches.next(), matches.next()) {
                (Some(folder), None) => *folder,
                (Some(_), Some(_)) => {
                    tracing::warn!(authority, "workspace name matches more than one folder");
                    return Err(WikiError::root_not_found(authority));
                }
                (None, _) => return Err(WikiError::root_not_found(authority)),
            }
        };

        Ok(Root::new(
            selected.name.clone(),
            selected.path.join(wiki_dir),
        ))
    }

    /// Make sure the root directory exists, creating it with parents.
    pub async fn provision(root: &Root) -> WikiResult<()> {
        let dir = &root.real_directory;
        match fs::metadata(dir).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(WikiError::RootNotADirectory(dir.display().to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                fs::create_dir_all(dir).await?;
                tracing::info!(root = %dir.display(), workspace = %root.id, "created wiki root");
                Ok(())
            }
            Err(e) => Err(WikiError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::error::WikiErrorKind;
    use tempfile::TempDir;

    fn folders() -> Vec<WorkspaceFolder> {
        vec![
            WorkspaceFolder::new("Zeta", 1, "/w/zeta"),
            WorkspaceFolder::new("beta", 0, "/w/beta"),
            WorkspaceFolder::new("Alpha", 0, "/w/alpha"),
            WorkspaceFolder::new("remote", 0, "/w/remote").with_scheme("vscode-remote"),
        ]
    }

    fn wiki_dir() -> PathBuf {
        PathBuf::from(DEFAULT_WIKI_DIR)
    }

    #[test]
    fn test_empty_authority_takes_lowest_index_then_name() {
        let root = RootSelector::select("", &folders(), &wiki_dir()).unwrap();
        assert_eq!(root.id, "Alpha");
        assert_eq!(root.real_directory, PathBuf::from("/w/alpha/.vscode/.wiki"));
    }

    #[test]
    fn test_authority_matches_case_insensitively() {
        let root = RootSelector::select("ZETA", &folders(), &wiki_dir()).unwrap();
        assert_eq!(root.id, "Zeta");
    }

    #[test]
    fn test_unknown_authority() {
        let err = RootSelector::select("nope", &folders(), &wiki_dir()).unwrap_err();
        assert_eq!(err.kind(), WikiErrorKind::RootNotFound);
    }

    #[test]
    fn test_remote_folders_are_not_candidates() {
        let err = RootSelector::select("remote", &folders(), &wiki_dir()).unwrap_err();
        assert_eq!(err.kind(), WikiErrorKind::RootNotFound);

        let only_remote = vec![WorkspaceFolder::new("r", 0, "/r").with_scheme("ssh")];
        let err = RootSelector::select("", &only_remote, &wiki_dir()).unwrap_err();
        assert_eq!(err.kind(), WikiErrorKind::NoRootAvailable);
    }

    #[test]
    fn test_no_folders() {
        let err = RootSelector::select("", &[], &wiki_dir()).unwrap_err();
        assert_eq!(err.kind(), WikiErrorKind::NoRootAvailable);
    }

    #[test]
    fn test_duplicate_names_are_ambiguous() {
        let dupes = vec![
            WorkspaceFolder::new("docs", 0, "/a"),
            WorkspaceFolder::new("DOCS", 1, "/b"),
        ];
        let err = RootSelector::select("docs", &dupes, &wiki_dir()).unwrap_err();
        assert_eq!(err.kind(), WikiErrorKind::RootNotFound);
    }

    #[tokio::test]
    async fn test_provision_creates_and_tolerates_existing() {
        let dir = TempDir::new().unwrap();
        let root = Root::new("ws", dir.path().join(".vscode/.wiki"));

        RootSelector::provision(&root).await.unwrap();
        assert!(root.real_directory.is_dir());
        RootSelector::provision(&root).await.unwrap();
    }

    #[tokio::test]
    async fn test_provision_rejects_file_root() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wiki");
        std::fs::write(&path, b"not a dir").unwrap();

        let err = RootSelector::provision(&Root::new("ws", &path)).await.unwrap_err();
        assert_eq!(err.kind(), WikiErrorKind::RootNotADirectory);
    }
}
