//! Workspace-backed wiki store.
//!
//! Documents live as `*.md` files under `<workspace>/.vscode/.wiki`. Virtual
//! paths hide the suffix on documents; directories keep their names.
//!
//! Every verb runs through [`WorkspaceStore::with_resolved_path`]: select
//! the root, then on the root's lane provision it, resolve the path and do
//! the I/O. Nothing here holds state between calls.

use std::fs::Metadata;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs;
use uuid::Uuid;

use crate::vfs::error::{WikiError, WikiResult};
use crate::vfs::ops::WikiFs;
use crate::vfs::paths::{ExtensionMapper, PathResolver, ResolvedPath};
use crate::vfs::queue::QueueRegistry;
use crate::vfs::roots::{RootSelector, WikiHost};
use crate::vfs::types::{
    DeleteOptions, DirectoryEntry, EntryKind, FileStat, RenameOptions, WriteFileOptions,
};
use crate::vfs::uri::VirtualUri;

/// Store over a workspace folder's wiki directory.
///
/// The root is chosen by the authority of the URI the store was opened for;
/// every call made through this store, rename destinations included, lands
/// on that root.
#[derive(Debug, Clone)]
pub struct WorkspaceStore {
    host: Arc<WikiHost>,
    queues: Arc<QueueRegistry>,
    authority: String,
}

/// What a virtual path addresses on disk.
#[derive(Debug)]
enum Located {
    Directory(PathBuf),
    Document(PathBuf),
    Link(PathBuf),
}

impl WorkspaceStore {
    /// Open a store for `uri`.
    pub fn new(host: Arc<WikiHost>, queues: Arc<QueueRegistry>, uri: &VirtualUri) -> Self {
        Self {
            host,
            queues,
            authority: uri.authority().to_string(),
        }
    }

    /// Select and provision the root, resolve `uri`'s path and run `action`
    /// on the root's lane.
    async fn with_resolved_path<T, F, Fut>(&self, uri: &VirtualUri, action: F) -> WikiResult<T>
    where
        F: FnOnce(ResolvedPath) -> Fut + Send + 'static,
        Fut: Future<Output = WikiResult<T>> + Send + 'static,
        T: Send + 'static,
    {
        let root = self.host.select_root(&self.authority)?;
        let lane = self.queues.lane(&root);
        let virtual_path = uri.path().to_string();

        lane.enqueue(async move {
            RootSelector::provision(&root).await?;
            let resolved = PathResolver::resolve(&root, &virtual_path)?;
            action(resolved).await
        })
        .await
    }
}

/// A lookup that failed because the path, or an ancestor of it, is not there.
///
/// An ancestor that is a plain file reports `ENOTDIR`; that file is invisible
/// in the wiki, so the path is simply missing.
fn is_missing(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}

/// `lstat`, with "missing" as `None`.
async fn lstat(path: &Path) -> io::Result<Option<Metadata>> {
    match fs::symlink_metadata(path).await {
        Ok(meta) => Ok(Some(meta)),
        Err(e) if is_missing(&e) => Ok(None),
        Err(e) => Err(e),
    }
}

/// `stat` (following links), with "missing" as `None`.
async fn stat_following(path: &Path) -> io::Result<Option<Metadata>> {
    match fs::metadata(path).await {
        Ok(meta) => Ok(Some(meta)),
        Err(e) if is_missing(&e) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Find the real entry behind a virtual path: a directory, else a document,
/// else a bare symlink. Files without the suffix are invisible.
async fn locate(resolved: &ResolvedPath) -> WikiResult<Option<Located>> {
    let io_err = |e| WikiError::from_io(e, resolved.virtual_path.clone());
    let entry = lstat(&resolved.real_path).await.map_err(io_err)?;

    if entry.as_ref().is_some_and(Metadata::is_dir) {
        return Ok(Some(Located::Directory(resolved.real_path.clone())));
    }

    if !resolved.is_root() {
        let document = ExtensionMapper::with_suffix(&resolved.real_path);
        if let Some(meta) = lstat(&document).await.map_err(io_err)? {
            if !meta.is_dir() {
                return Ok(Some(Located::Document(document)));
            }
        }
    }

    if entry.is_some_and(|meta| meta.file_type().is_symlink()) {
        return Ok(Some(Located::Link(resolved.real_path.clone())));
    }

    Ok(None)
}

async fn directory_has_entries(dir: &Path) -> io::Result<bool> {
    let mut entries = fs::read_dir(dir).await?;
    Ok(entries.next_entry().await?.is_some())
}

/// Where a document write lands: the link target for a symlinked document,
/// the document itself otherwise. Dangling links are replaced.
async fn write_destination(document: &Path) -> io::Result<PathBuf> {
    match lstat(document).await? {
        Some(meta) if meta.file_type().is_symlink() => match dunce::canonicalize(document) {
            Ok(target) => Ok(target),
            Err(e) if is_missing(&e) => Ok(document.to_path_buf()),
            Err(e) => Err(e),
        },
        _ => Ok(document.to_path_buf()),
    }
}

/// Write `content` beside `target` and move it into place.
async fn write_atomically(target: &Path, content: &[u8]) -> io::Result<()> {
    let parent = target
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "document has no parent"))?;
    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    // No document suffix, so never listed.
    let temp = parent.join(format!(".{file_name}.{}.tmp", Uuid::new_v4().simple()));

    fs::write(&temp, content).await?;
    if let Err(e) = fs::rename(&temp, target).await {
        let _ = fs::remove_file(&temp).await;
        return Err(e);
    }
    Ok(())
}

fn sort_entries(entries: &mut [DirectoryEntry]) {
    entries.sort_by_cached_key(|e| (!e.kind.is_dir(), e.name.to_lowercase(), e.name.clone()));
}

#[async_trait]
impl WikiFs for WorkspaceStore {
    async fn create_directory(&self, uri: &VirtualUri) -> WikiResult<()> {
        self.with_resolved_path(uri, |p| async move {
            PathResolver::confine(&p, &p.real_path, false)?;
            let io_err = |e| WikiError::from_io(e, p.virtual_path.clone());

            if lstat(&p.real_path).await.map_err(io_err)?.is_some() {
                return Err(WikiError::already_exists(p.virtual_path.clone()));
            }
            fs::create_dir_all(&p.real_path).await.map_err(io_err)
        })
        .await
    }

    async fn delete(&self, uri: &VirtualUri, options: DeleteOptions) -> WikiResult<()> {
        self.with_resolved_path(uri, move |p| async move {
            if p.is_root() {
                return Err(WikiError::permission_denied(p.virtual_path.clone()));
            }
            let io_err = |e| WikiError::from_io(e, p.virtual_path.clone());

            match locate(&p).await? {
                None => Err(WikiError::not_found(p.virtual_path.clone())),
                Some(Located::Directory(dir)) => {
                    PathResolver::confine(&p, &dir, false)?;
                    if options.recursive {
                        fs::remove_dir_all(&dir).await.map_err(io_err)
                    } else if directory_has_entries(&dir).await.map_err(io_err)? {
                        Err(WikiError::permission_denied(p.virtual_path.clone()))
                    } else {
                        fs::remove_dir(&dir).await.map_err(io_err)
                    }
                }
                Some(Located::Document(file)) | Some(Located::Link(file)) => {
                    PathResolver::confine(&p, &file, false)?;
                    fs::remove_file(&file).await.map_err(io_err)
                }
            }
        })
        .await
    }

    async fn read_directory(&self, uri: &VirtualUri) -> WikiResult<Vec<DirectoryEntry>> {
        self.with_resolved_path(uri, |p| async move {
            PathResolver::confine(&p, &p.real_path, true)?;
            let io_err = |e| WikiError::from_io(e, p.virtual_path.clone());

            match stat_following(&p.real_path).await.map_err(io_err)? {
                None => return Err(WikiError::not_found(p.virtual_path.clone())),
                Some(meta) if !meta.is_dir() => {
                    return Err(WikiError::not_a_directory(p.virtual_path.clone()));
                }
                Some(_) => {}
            }

            let mut entries = Vec::new();
            let mut dir = fs::read_dir(&p.real_path).await.map_err(io_err)?;
            while let Some(entry) = dir.next_entry().await.map_err(io_err)? {
                let kind = EntryKind::from_file_type(&entry.file_type().await.map_err(io_err)?);
                let real_name = entry.file_name().to_string_lossy().into_owned();

                let name = match kind {
                    EntryKind::File => match ExtensionMapper::to_virtual_name(&real_name) {
                        Some(name) => name.to_string(),
                        None => continue,
                    },
                    _ => real_name,
                };
                entries.push(DirectoryEntry::new(name, kind));
            }

            sort_entries(&mut entries);
            Ok(entries)
        })
        .await
    }

    async fn read_file(&self, uri: &VirtualUri) -> WikiResult<Vec<u8>> {
        self.with_resolved_path(uri, |p| async move {
            let document = ExtensionMapper::document_path(&p)?;
            PathResolver::confine(&p, &document, true)?;
            let io_err = |e| WikiError::from_io(e, p.virtual_path.clone());

            match stat_following(&document).await.map_err(io_err)? {
                None => Err(WikiError::not_found(p.virtual_path.clone())),
                Some(meta) if meta.is_dir() => Err(WikiError::is_a_directory(p.virtual_path.clone())),
                Some(_) => fs::read(&document).await.map_err(io_err),
            }
        })
        .await
    }

    async fn rename(
        &self,
        old_uri: &VirtualUri,
        new_uri: &VirtualUri,
        _options: RenameOptions,
    ) -> WikiResult<()> {
        // Overwrite handling is left to the rename primitive.
        let new_path = new_uri.path().to_string();

        self.with_resolved_path(old_uri, move |p| async move {
            if p.is_root() {
                return Err(WikiError::permission_denied(p.virtual_path.clone()));
            }

            // The destination always lands on the source's root. Leaving it
            // reports the destination as not found.
            let dest = PathResolver::resolve(&p.root, &new_path)
                .map_err(|_| WikiError::not_found(new_path.clone()))?;

            let (from, to) = match locate(&p).await? {
                None => return Err(WikiError::not_found(p.virtual_path.clone())),
                Some(Located::Directory(dir)) => (dir, dest.real_path.clone()),
                Some(Located::Link(link)) => (link, dest.real_path.clone()),
                Some(Located::Document(file)) => {
                    (file, ExtensionMapper::with_suffix(&dest.real_path))
                }
            };

            if !PathResolver::is_contained(&dest.root.real_directory, &to) {
                tracing::warn!(
                    root = %dest.root.real_directory.display(),
                    path = %new_path,
                    "rejected rename destination outside its root"
                );
                return Err(WikiError::not_found(new_path.clone()));
            }
            PathResolver::confine(&p, &from, false)?;
            PathResolver::confine(&dest, &to, false)
                .map_err(|_| WikiError::not_found(new_path.clone()))?;

            fs::rename(&from, &to)
                .await
                .map_err(|e| WikiError::from_io(e, new_path.clone()))
        })
        .await
    }

    async fn stat(&self, uri: &VirtualUri) -> WikiResult<FileStat> {
        self.with_resolved_path(uri, |p| async move {
            if p.is_root() {
                return Ok(FileStat::synthetic_root());
            }
            let io_err = |e| WikiError::from_io(e, p.virtual_path.clone());

            let target = if stat_following(&p.real_path)
                .await
                .map_err(io_err)?
                .is_some_and(|meta| meta.is_dir())
            {
                p.real_path.clone()
            } else {
                match locate(&p).await? {
                    Some(Located::Document(file)) => file,
                    Some(Located::Link(link)) => link,
                    Some(Located::Directory(dir)) => dir,
                    None => return Err(WikiError::not_found(p.virtual_path.clone())),
                }
            };

            PathResolver::confine(&p, &target, false)?;
            let meta = fs::symlink_metadata(&target).await.map_err(io_err)?;
            Ok(FileStat::from_metadata(&meta))
        })
        .await
    }

    async fn write_file(
        &self,
        uri: &VirtualUri,
        content: &[u8],
        options: WriteFileOptions,
    ) -> WikiResult<()> {
        let content = content.to_vec();

        self.with_resolved_path(uri, move |p| async move {
            let document = ExtensionMapper::document_path(&p)?;
            PathResolver::confine(&p, &document, true)?;
            let io_err = |e| WikiError::from_io(e, p.virtual_path.clone());

            match stat_following(&document).await.map_err(io_err)? {
                Some(meta) if meta.is_dir() => {
                    return Err(WikiError::is_a_directory(p.virtual_path.clone()));
                }
                Some(_) if !options.overwrite => {
                    return Err(WikiError::already_exists(p.virtual_path.clone()));
                }
                None if !options.create => {
                    return Err(WikiError::not_found(p.virtual_path.clone()));
                }
                _ => {}
            }

            if let Some(parent) = document.parent() {
                fs::create_dir_all(parent).await.map_err(io_err)?;
            }
            let target = write_destination(&document).await.map_err(io_err)?;
            write_atomically(&target, &content).await.map_err(io_err)
        })
        .await
    }
}
