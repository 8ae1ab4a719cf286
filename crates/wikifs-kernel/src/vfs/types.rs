//! Core wiki filesystem types.
//!
//! These mirror the shapes an editor's filesystem-provider boundary expects
//! and serialize cleanly for hosts that print or forward them.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Kind of a virtual entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    /// Directory.
    Directory,
    /// Markdown document.
    File,
    /// Symbolic link.
    SymbolicLink,
    /// Anything else (sockets, fifos, devices).
    Unknown,
}

impl EntryKind {
    /// Classify a real entry from its (non-following) file type.
    pub fn from_file_type(ft: &std::fs::FileType) -> Self {
        if ft.is_dir() {
            EntryKind::Directory
        } else if ft.is_file() {
            EntryKind::File
        } else if ft.is_symlink() {
            EntryKind::SymbolicLink
        } else {
            EntryKind::Unknown
        }
    }

    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, EntryKind::Directory)
    }

    /// Returns true if this is a document.
    pub fn is_file(&self) -> bool {
        matches!(self, EntryKind::File)
    }

    /// Returns true if this is a symbolic link.
    pub fn is_symlink(&self) -> bool {
        matches!(self, EntryKind::SymbolicLink)
    }
}

/// Directory entry as seen through the virtual view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    /// Virtual name (`.md` stripped for documents).
    pub name: String,
    /// Entry type.
    pub kind: EntryKind,
}

impl DirectoryEntry {
    /// Create a new directory entry.
    pub fn new(name: impl Into<String>, kind: EntryKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Create a document entry.
    pub fn file(name: impl Into<String>) -> Self {
        Self::new(name, EntryKind::File)
    }

    /// Create a directory entry.
    pub fn directory(name: impl Into<String>) -> Self {
        Self::new(name, EntryKind::Directory)
    }
}

/// Entry metadata. Times are UTC Unix seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStat {
    /// Creation time.
    pub created_at: u64,
    /// Last modification time.
    pub modified_at: u64,
    /// Size in bytes (0 for directories).
    pub size: u64,
    /// Entry type.
    pub kind: EntryKind,
}

impl FileStat {
    /// The synthetic stat reported for a virtual root.
    pub fn synthetic_root() -> Self {
        Self {
            created_at: 0,
            modified_at: 0,
            size: 0,
            kind: EntryKind::Directory,
        }
    }

    /// Build a stat from `lstat` metadata.
    pub fn from_metadata(meta: &std::fs::Metadata) -> Self {
        let kind = EntryKind::from_file_type(&meta.file_type());
        let modified_at = meta.modified().map(unix_seconds).unwrap_or(0);
        // Not every filesystem records birth time.
        let created_at = meta.created().map(unix_seconds).unwrap_or(modified_at);
        let size = match kind {
            EntryKind::File | EntryKind::SymbolicLink => meta.len(),
            EntryKind::Directory | EntryKind::Unknown => 0,
        };

        Self {
            created_at,
            modified_at,
            size,
            kind,
        }
    }
}

/// Truncate a timestamp to whole UTC seconds; pre-epoch times clamp to 0.
pub fn unix_seconds(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Options for `delete`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteOptions {
    /// Remove non-empty directories too.
    pub recursive: bool,
}

/// Options for `rename`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenameOptions {
    /// Overwrite an existing target.
    pub overwrite: bool,
}

/// Options for `write_file`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteFileOptions {
    /// Create the document if it does not exist.
    pub create: bool,
    /// Replace the document if it exists.
    pub overwrite: bool,
}

impl Default for WriteFileOptions {
    fn default() -> Self {
        Self {
            create: true,
            overwrite: true,
        }
    }
}

impl WriteFileOptions {
    /// Create only; fail if the document exists.
    pub fn create_new() -> Self {
        Self {
            create: true,
            overwrite: false,
        }
    }

    /// Overwrite only; fail if the document is missing.
    pub fn overwrite_existing() -> Self {
        Self {
            create: false,
            overwrite: true,
        }
    }
}
