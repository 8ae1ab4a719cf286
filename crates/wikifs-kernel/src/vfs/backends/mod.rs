//! Wiki stores.
//!
//! Each store implements [`WikiFs`](crate::vfs::WikiFs) against one kind of
//! backing storage. The router picks one per call from the URI's `source`.

mod workspace;

pub use workspace::WorkspaceStore;
