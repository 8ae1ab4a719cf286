//! The virtual filesystem verb set.
//!
//! This is the boundary an editor host drives: seven URI-addressed verbs,
//! mirroring a file-system-provider interface. No change events are ever
//! reported.

use async_trait::async_trait;

use super::types::{DeleteOptions, DirectoryEntry, FileStat, RenameOptions, WriteFileOptions};
use super::uri::VirtualUri;
use super::WikiResult;

/// Filesystem verbs over virtual URIs.
#[async_trait]
pub trait WikiFs: Send + Sync {
    /// Create a directory and any missing parents.
    async fn create_directory(&self, uri: &VirtualUri) -> WikiResult<()>;

    /// Delete a document or directory.
    async fn delete(&self, uri: &VirtualUri, options: DeleteOptions) -> WikiResult<()>;

    /// List a directory: directories first, then case-insensitive by name.
    async fn read_directory(&self, uri: &VirtualUri) -> WikiResult<Vec<DirectoryEntry>>;

    /// Read a whole document.
    async fn read_file(&self, uri: &VirtualUri) -> WikiResult<Vec<u8>>;

    /// Move a document or directory within the same root.
    async fn rename(
        &self,
        old_uri: &VirtualUri,
        new_uri: &VirtualUri,
        options: RenameOptions,
    ) -> WikiResult<()>;

    /// Entry metadata.
    async fn stat(&self, uri: &VirtualUri) -> WikiResult<FileStat>;

    /// Replace a document's content.
    async fn write_file(
        &self,
        uri: &VirtualUri,
        content: &[u8],
        options: WriteFileOptions,
    ) -> WikiResult<()>;

    // ========================================================================
    // Convenience methods (default implementations)
    // ========================================================================

    /// Check if a virtual path exists.
    async fn exists(&self, uri: &VirtualUri) -> bool {
        self.stat(uri).await.is_ok()
    }
}
