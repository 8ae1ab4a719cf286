//! # wikifs-kernel
//!
//! A folder of markdown notes, served as a virtual filesystem.
//!
//! Editors open `wiki://<workspace>/<path>` URIs; the kernel maps them onto
//! `<workspace>/.vscode/.wiki/<path>.md`, keeps every real path inside its
//! root, and serializes all I/O per root.

pub mod config;
pub mod vfs;

pub use config::{ConfigError, WikiConfig, WorkspaceEntry};
pub use vfs::{
    DeleteOptions, DirectoryEntry, EntryKind, FileStat, RenameOptions, Router, VirtualUri,
    WikiError, WikiErrorKind, WikiFs, WikiHost, WikiResult, WorkspaceFolder, WriteFileOptions,
};
