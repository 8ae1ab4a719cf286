//! Markdown wiki as a virtual filesystem.
//!
//! Editors address notes through URIs like `wiki://workspace/path?source=ws`;
//! this module maps them onto `*.md` files under a per-workspace root.
//! Key components:
//!
//! - [`WikiFs`] - The verb set a host drives
//! - [`Router`] - Picks a store per call from the URI's `source` selector
//! - [`WorkspaceStore`] - Wiki under `<workspace>/.vscode/.wiki`
//! - [`PathResolver`] / [`ExtensionMapper`] - Sandboxed path mapping
//! - [`RootSelector`] - Workspace → root directory
//! - [`OperationQueue`] - Per-root FIFO lane for all I/O
//!
//! ## Design Decisions
//!
//! - **Containment first**: a virtual path that resolves outside its root
//!   is rejected before any I/O, lexically and again after following links.
//! - **Suffix only on documents**: `page` ↔ `page.md`; directories keep
//!   their literal names, and plain files without the suffix are invisible.
//! - **One lane per root**: operations on a root never interleave; roots do
//!   not block each other.
//! - **No change events**: external edits are not watched.

pub mod backends;
mod error;
mod ops;
mod paths;
mod queue;
mod roots;
mod router;
mod types;
mod uri;

pub use backends::WorkspaceStore;
pub use error::{WikiError, WikiErrorKind, WikiResult};
pub use ops::WikiFs;
pub use paths::{DOCUMENT_SUFFIX, ExtensionMapper, PathResolver, ResolvedPath, Root};
pub use queue::{OperationQueue, QueueRegistry};
pub use roots::{DEFAULT_WIKI_DIR, RootSelector, WikiHost, WorkspaceFolder};
pub use router::{Router, SourceKind, Store, StoreGuard};
pub use types::{
    DeleteOptions, DirectoryEntry, EntryKind, FileStat, RenameOptions, WriteFileOptions,
};
pub use uri::{SOURCE_PARAM, VirtualUri};
