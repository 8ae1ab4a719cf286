//! Source routing.
//!
//! The [`Router`] is what a host registers for the wiki scheme. For every
//! call it reads the URI's `source` selector, opens the matching store,
//! runs the verb and drops the store again, whichever way the call ends.

use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use super::backends::WorkspaceStore;
use super::error::{WikiError, WikiResult};
use super::ops::WikiFs;
use super::queue::QueueRegistry;
use super::roots::WikiHost;
use super::types::{DeleteOptions, DirectoryEntry, FileStat, RenameOptions, WriteFileOptions};
use super::uri::VirtualUri;

/// Kinds of backing store, selected by the `source` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Wiki directory inside a local workspace folder.
    Workspace,
}

impl SourceKind {
    /// Map a normalized selector to a store kind.
    pub fn from_selector(selector: &str) -> WikiResult<Self> {
        match selector {
            "" | "p" | "project" | "workspace" | "ws" => Ok(SourceKind::Workspace),
            other => Err(WikiError::unsupported_source(other)),
        }
    }

    /// The store kind addressed by `uri`.
    pub fn of(uri: &VirtualUri) -> WikiResult<Self> {
        Self::from_selector(&uri.source())
    }
}

/// A store opened for one call.
#[derive(Debug)]
pub enum Store {
    Workspace(WorkspaceStore),
}

#[async_trait]
impl WikiFs for Store {
    async fn create_directory(&self, uri: &VirtualUri) -> WikiResult<()> {
        match self {
            Store::Workspace(store) => store.create_directory(uri).await,
        }
    }

    async fn delete(&self, uri: &VirtualUri, options: DeleteOptions) -> WikiResult<()> {
        match self {
            Store::Workspace(store) => store.delete(uri, options).await,
        }
    }

    async fn read_directory(&self, uri: &VirtualUri) -> WikiResult<Vec<DirectoryEntry>> {
        match self {
            Store::Workspace(store) => store.read_directory(uri).await,
        }
    }

    async fn read_file(&self, uri: &VirtualUri) -> WikiResult<Vec<u8>> {
        match self {
            Store::Workspace(store) => store.read_file(uri).await,
        }
    }

    async fn rename(
        &self,
        old_uri: &VirtualUri,
        new_uri: &VirtualUri,
        options: RenameOptions,
    ) -> WikiResult<()> {
        match self {
            Store::Workspace(store) => store.rename(old_uri, new_uri, options).await,
        }
    }

    async fn stat(&self, uri: &VirtualUri) -> WikiResult<FileStat> {
        match self {
            Store::Workspace(store) => store.stat(uri).await,
        }
    }

    async fn write_file(
        &self,
        uri: &VirtualUri,
        content: &[u8],
        options: WriteFileOptions,
    ) -> WikiResult<()> {
        match self {
            Store::Workspace(store) => store.write_file(uri, content, options).await,
        }
    }
}

/// Keeps a store alive for exactly one call; dropping it releases the store.
#[derive(Debug)]
pub struct StoreGuard {
    store: Store,
    live: Arc<AtomicUsize>,
}

impl Deref for StoreGuard {
    type Target = Store;

    fn deref(&self) -> &Store {
        &self.store
    }
}

impl Drop for StoreGuard {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
        tracing::trace!("released store");
    }
}

/// Dispatches verbs to per-call stores.
///
/// Owns the lane registry shared by every store it opens, so operations on
/// the same root serialize across calls.
#[derive(Debug, Clone)]
pub struct Router {
    host: Arc<WikiHost>,
    queues: Arc<QueueRegistry>,
    live: Arc<AtomicUsize>,
}

impl Router {
    pub fn new(host: WikiHost) -> Self {
        Self {
            host: Arc::new(host),
            queues: Arc::new(QueueRegistry::new()),
            live: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn host(&self) -> &WikiHost {
        &self.host
    }

    /// Lanes created so far (one per root touched).
    pub fn lanes(&self) -> usize {
        self.queues.len()
    }

    /// Stores currently open. Zero whenever no call is in flight.
    pub fn live_stores(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Open the store `uri` selects.
    pub fn open(&self, uri: &VirtualUri, verb: &'static str) -> WikiResult<StoreGuard> {
        let kind = SourceKind::of(uri).inspect_err(|_| {
            tracing::warn!(uri = %uri, verb, "unsupported wiki source");
        })?;
        tracing::debug!(uri = %uri, verb, ?kind, "dispatch");

        let store = match kind {
            SourceKind::Workspace => Store::Workspace(WorkspaceStore::new(
                Arc::clone(&self.host),
                Arc::clone(&self.queues),
                uri,
            )),
        };

        self.live.fetch_add(1, Ordering::SeqCst);
        Ok(StoreGuard {
            store,
            live: Arc::clone(&self.live),
        })
    }
}

#[async_trait]
impl WikiFs for Router {
    async fn create_directory(&self, uri: &VirtualUri) -> WikiResult<()> {
        let store = self.open(uri, "create_directory")?;
        store.create_directory(uri).await
    }

    async fn delete(&self, uri: &VirtualUri, options: DeleteOptions) -> WikiResult<()> {
        let store = self.open(uri, "delete")?;
        store.delete(uri, options).await
    }

    async fn read_directory(&self, uri: &VirtualUri) -> WikiResult<Vec<DirectoryEntry>> {
        let store = self.open(uri, "read_directory")?;
        store.read_directory(uri).await
    }

    async fn read_file(&self, uri: &VirtualUri) -> WikiResult<Vec<u8>> {
        let store = self.open(uri, "read_file")?;
        store.read_file(uri).await
    }

    async fn rename(
        &self,
        old_uri: &VirtualUri,
        new_uri: &VirtualUri,
        options: RenameOptions,
    ) -> WikiResult<()> {
        let store = self.open(old_uri, "rename")?;
        store.rename(old_uri, new_uri, options).await
    }

    async fn stat(&self, uri: &VirtualUri) -> WikiResult<FileStat> {
        let store = self.open(uri, "stat")?;
        store.stat(uri).await
    }

    async fn write_file(
        &self,
        uri: &VirtualUri,
        content: &[u8],
        options: WriteFileOptions,
    ) -> WikiResult<()> {
        let store = self.open(uri, "write_file")?;
        store.write_file(uri, content, options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::error::WikiErrorKind;
    use crate::vfs::roots::WorkspaceFolder;
    use tempfile::TempDir;

    #[test]
    fn test_selectors() {
        for selector in ["", "p", "project", "workspace", "ws"] {
            assert_eq!(SourceKind::from_selector(selector).unwrap(), SourceKind::Workspace);
        }
        let err = SourceKind::from_selector("git").unwrap_err();
        assert_eq!(err.kind(), WikiErrorKind::UnsupportedSource);
    }

    #[test]
    fn test_selector_is_normalized_from_uri() {
        let uri = VirtualUri::new("wiki", "", "/").with_param("source", "  WorkSpace ");
        assert_eq!(SourceKind::of(&uri).unwrap(), SourceKind::Workspace);
    }

    #[tokio::test]
    async fn test_unsupported_source_is_not_not_found() {
        let dir = TempDir::new().unwrap();
        let router = Router::new(WikiHost::new(vec![WorkspaceFolder::new("ws", 0, dir.path())]));

        let uri = VirtualUri::new("wiki", "", "/missing").with_param("source", "cloud");
        let err = router.read_file(&uri).await.unwrap_err();
        assert_eq!(err.kind(), WikiErrorKind::UnsupportedSource);
        assert_eq!(router.live_stores(), 0);
    }

    #[tokio::test]
    async fn test_stores_released_on_success_and_error() {
        let dir = TempDir::new().unwrap();
        let router = Router::new(WikiHost::new(vec![WorkspaceFolder::new("ws", 0, dir.path())]));

        let ok = VirtualUri::new("wiki", "", "/");
        router.read_directory(&ok).await.unwrap();
        assert_eq!(router.live_stores(), 0);

        let missing = VirtualUri::new("wiki", "", "/nope");
        assert!(router.stat(&missing).await.is_err());
        assert_eq!(router.live_stores(), 0);

        let unknown_ws = VirtualUri::new("wiki", "elsewhere", "/");
        let err = router.stat(&unknown_ws).await.unwrap_err();
        assert_eq!(err.kind(), WikiErrorKind::RootNotFound);
        assert_eq!(router.live_stores(), 0);
    }

    #[tokio::test]
    async fn test_guard_counts_open_stores() {
        let router = Router::new(WikiHost::new(Vec::new()));
        let uri = VirtualUri::new("wiki", "", "/");

        let first = router.open(&uri, "test").unwrap();
        let second = router.open(&uri, "test").unwrap();
        assert_eq!(router.live_stores(), 2);
        drop(first);
        assert_eq!(router.live_stores(), 1);
        drop(second);
        assert_eq!(router.live_stores(), 0);
    }
}
