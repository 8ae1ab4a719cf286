//! Virtual path → real path mapping.
//!
//! [`PathResolver`] joins a virtual path onto a [`Root`] and enforces the
//! containment invariant; [`ExtensionMapper`] translates between document
//! names and their `.md` files on disk.

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use super::error::{WikiError, WikiResult};

/// Suffix carried by every document on disk.
pub const DOCUMENT_SUFFIX: &str = ".md";

/// A real directory backing one virtual authority.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Root {
    /// Workspace name the root was selected for.
    pub id: String,
    /// Absolute real directory.
    pub real_directory: PathBuf,
}

impl Root {
    pub fn new(id: impl Into<String>, real_directory: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            real_directory: real_directory.into(),
        }
    }
}

/// A virtual path mapped onto its root.
///
/// `real_path` is always the root directory or a descendant of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Real path, without any document suffix.
    pub real_path: PathBuf,
    /// The root it was resolved against.
    pub root: Root,
    /// The virtual path as addressed, for error messages.
    pub virtual_path: String,
}

impl ResolvedPath {
    /// True when this addresses the root directory itself.
    pub fn is_root(&self) -> bool {
        self.real_path == self.root.real_directory
    }
}

/// Maps virtual paths onto roots.
pub struct PathResolver;

impl PathResolver {
    /// Resolve `virtual_path` against `root`.
    ///
    /// `.` segments are dropped and `..` pops a component, lexically, while
    /// joining onto the root directory. A result that is neither the root nor
    /// below it fails with `PathEscape`.
    pub fn resolve(root: &Root, virtual_path: &str) -> WikiResult<ResolvedPath> {
        let real_path = Self::join_lexically(&root.real_directory, virtual_path);

        if !Self::is_contained(&root.real_directory, &real_path) {
            tracing::warn!(
                root = %root.real_directory.display(),
                path = virtual_path,
                "rejected virtual path escaping its root"
            );
            return Err(WikiError::path_escape(virtual_path));
        }

        Ok(ResolvedPath {
            real_path,
            root: root.clone(),
            virtual_path: virtual_path.to_string(),
        })
    }

    /// Containment check: `path` equals `root` or descends from it.
    ///
    /// Comparison is component-wise, so `/wiki-other` is not under `/wiki`.
    pub fn is_contained(root: &Path, path: &Path) -> bool {
        path.starts_with(root)
    }

    fn join_lexically(base: &Path, virtual_path: &str) -> PathBuf {
        let mut result = base.to_path_buf();
        for component in Path::new(virtual_path).components() {
            match component {
                Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
                Component::ParentDir => {
                    result.pop();
                }
                Component::Normal(segment) => result.push(segment),
            }
        }
        result
    }

    /// Verify that `target` does not leave the root once symlinks are followed.
    ///
    /// The deepest existing ancestor of the probed path is canonicalized and
    /// must lie under the canonicalized root. With `follow_target` the target
    /// itself is probed (reads and writes go through it); otherwise only its
    /// parent is, so a link entry can still be listed, renamed or removed.
    pub fn confine(resolved: &ResolvedPath, target: &Path, follow_target: bool) -> WikiResult<()> {
        let root = &resolved.root.real_directory;
        let canonical_root = dunce::canonicalize(root)
            .map_err(|e| WikiError::from_io(e, resolved.virtual_path.clone()))?;

        let mut probe = if follow_target || target == root.as_path() {
            target.to_path_buf()
        } else {
            target.parent().map(Path::to_path_buf).unwrap_or_else(|| root.clone())
        };

        let canonical = loop {
            match dunce::canonicalize(&probe) {
                Ok(canonical) => break canonical,
                Err(e)
                    if matches!(
                        e.kind(),
                        std::io::ErrorKind::NotFound | std::io::ErrorKind::NotADirectory
                    ) =>
                {
                    if probe == *root || !probe.pop() {
                        break canonical_root.clone();
                    }
                }
                Err(e) => return Err(WikiError::from_io(e, resolved.virtual_path.clone())),
            }
        };

        if !Self::is_contained(&canonical_root, &canonical) {
            tracing::warn!(
                root = %canonical_root.display(),
                path = %resolved.virtual_path,
                resolved = %canonical.display(),
                "rejected path leaving its root through a symlink"
            );
            return Err(WikiError::path_escape(resolved.virtual_path.clone()));
        }
        Ok(())
    }
}

/// Translates between virtual document names and real file names.
///
/// Only documents carry the suffix; directories keep their literal names.
pub struct ExtensionMapper;

impl ExtensionMapper {
    /// `name` → `name.md`.
    pub fn to_real_file_name(virtual_name: &str) -> String {
        format!("{virtual_name}{DOCUMENT_SUFFIX}")
    }

    /// `name.md` → `name`; `None` for names without the suffix.
    pub fn to_virtual_name(real_file_name: &str) -> Option<&str> {
        real_file_name.strip_suffix(DOCUMENT_SUFFIX)
    }

    /// Append the suffix to a real path.
    pub fn with_suffix(path: &Path) -> PathBuf {
        let mut os: OsString = path.as_os_str().to_owned();
        os.push(DOCUMENT_SUFFIX);
        PathBuf::from(os)
    }

    /// Real document file for a resolved path.
    ///
    /// The root is always a directory, so it never gets a suffix.
    pub fn document_path(resolved: &ResolvedPath) -> WikiResult<PathBuf> {
        if resolved.is_root() {
            return Err(WikiError::is_a_directory(resolved.virtual_path.clone()));
        }
        Ok(Self::with_suffix(&resolved.real_path))
    }
}
