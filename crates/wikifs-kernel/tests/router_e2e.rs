//! End-to-end tests through the router: URI in, files on disk out.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;
use wikifs_kernel::{
    DeleteOptions, EntryKind, RenameOptions, Router, VirtualUri, WikiErrorKind, WikiFs, WikiHost,
    WorkspaceFolder, WriteFileOptions,
};

// ============================================================================
// Shared test setup
// ============================================================================

struct Env {
    router: Router,
    dir: TempDir,
}

impl Env {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("alpha")).unwrap();
        std::fs::create_dir_all(dir.path().join("beta")).unwrap();

        let host = WikiHost::new(vec![
            WorkspaceFolder::new("Alpha", 0, dir.path().join("alpha")),
            WorkspaceFolder::new("Beta", 1, dir.path().join("beta")),
        ]);
        Self {
            router: Router::new(host),
            dir,
        }
    }

    fn wiki(&self, workspace: &str) -> PathBuf {
        self.dir.path().join(workspace).join(".vscode/.wiki")
    }
}

fn uri(s: &str) -> VirtualUri {
    VirtualUri::parse(s).unwrap()
}

fn listing(entries: &[wikifs_kernel::DirectoryEntry]) -> Vec<(String, EntryKind)> {
    entries.iter().map(|e| (e.name.clone(), e.kind)).collect()
}

async fn write(router: &Router, target: &str, content: &[u8]) {
    router
        .write_file(&uri(target), content, WriteFileOptions::default())
        .await
        .unwrap();
}

// ============================================================================
// Properties
// ============================================================================

#[tokio::test]
async fn extension_round_trip() {
    let env = Env::new();
    for name in ["plain", "with space", "dotted.name", "Ünïcode"] {
        let target = format!("wiki:///{name}");
        let content = format!("# {name}\n").into_bytes();
        write(&env.router, &target, &content).await;

        assert_eq!(env.router.read_file(&uri(&target)).await.unwrap(), content);
        assert!(env.wiki("alpha").join(format!("{name}.md")).is_file());
    }

    let entries = env.router.read_directory(&uri("wiki:///")).await.unwrap();
    assert!(entries.iter().all(|e| e.kind == EntryKind::File));
    assert!(entries.iter().all(|e| !e.name.ends_with(".md")));
    assert_eq!(entries.len(), 4);
}

#[tokio::test]
async fn directory_opacity() {
    let env = Env::new();
    let wiki = env.wiki("alpha");
    std::fs::create_dir_all(&wiki).unwrap();
    std::fs::write(wiki.join("x"), b"not a note").unwrap();

    let entries = env.router.read_directory(&uri("wiki:///")).await.unwrap();
    assert!(entries.is_empty());

    let err = env.router.stat(&uri("wiki:///x")).await.unwrap_err();
    assert_eq!(err.kind(), WikiErrorKind::NotFound);
    let err = env.router.read_file(&uri("wiki:///x")).await.unwrap_err();
    assert_eq!(err.kind(), WikiErrorKind::NotFound);

    // Nothing below the hidden file gives it away either.
    let nested = uri("wiki:///x/y");
    let err = env.router.stat(&nested).await.unwrap_err();
    assert_eq!(err.kind(), WikiErrorKind::NotFound);
    let err = env.router.read_file(&nested).await.unwrap_err();
    assert_eq!(err.kind(), WikiErrorKind::NotFound);
    let err = env.router.read_directory(&nested).await.unwrap_err();
    assert_eq!(err.kind(), WikiErrorKind::NotFound);
    let err = env
        .router
        .delete(&nested, DeleteOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), WikiErrorKind::NotFound);
}

#[tokio::test]
async fn listing_order() {
    let env = Env::new();
    let wiki = env.wiki("alpha");
    std::fs::create_dir_all(wiki.join("A")).unwrap();
    std::fs::create_dir_all(wiki.join("z-dir")).unwrap();
    std::fs::write(wiki.join("b.md"), b"").unwrap();
    std::fs::write(wiki.join("a.md"), b"").unwrap();
    std::fs::write(wiki.join("C.md"), b"").unwrap();

    let entries = env.router.read_directory(&uri("wiki:///")).await.unwrap();
    assert_eq!(
        listing(&entries),
        vec![
            ("A".to_string(), EntryKind::Directory),
            ("z-dir".to_string(), EntryKind::Directory),
            ("a".to_string(), EntryKind::File),
            ("b".to_string(), EntryKind::File),
            ("C".to_string(), EntryKind::File),
        ]
    );
}

#[tokio::test]
async fn non_empty_delete_guard() {
    let env = Env::new();
    write(&env.router, "wiki:///dir/only", b"x").await;

    let err = env
        .router
        .delete(&uri("wiki:///dir"), DeleteOptions { recursive: false })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), WikiErrorKind::PermissionDenied);

    env.router
        .delete(&uri("wiki:///dir"), DeleteOptions { recursive: true })
        .await
        .unwrap();
    assert!(!env.wiki("alpha").join("dir").exists());
}

#[tokio::test]
async fn concurrent_writes_never_interleave() {
    let env = Env::new();
    let router = Arc::new(env.router.clone());
    let size = 512 * 1024;

    for round in 0..4 {
        let a = vec![b'a'; size];
        let b = vec![b'b'; size + round];
        let target = uri("wiki:///contended");

        let (ra, rb) = tokio::join!(
            router.write_file(&target, &a, WriteFileOptions::default()),
            router.write_file(&target, &b, WriteFileOptions::default()),
        );
        ra.unwrap();
        rb.unwrap();

        let content = router.read_file(&target).await.unwrap();
        assert!(content == a || content == b, "round {round}: mixed content");
    }
}

#[tokio::test]
async fn root_auto_provision() {
    let env = Env::new();
    assert!(!env.wiki("beta").exists());

    let stat = env.router.stat(&uri("wiki://beta/")).await.unwrap();
    assert!(stat.kind.is_dir());
    assert!(env.wiki("beta").is_dir());

    // Second call sees the existing directory and still succeeds.
    env.router.read_directory(&uri("wiki://beta/")).await.unwrap();
}

#[tokio::test]
async fn containment_through_router() {
    let env = Env::new();
    std::fs::write(env.dir.path().join("alpha/secret.md"), b"outside the wiki").unwrap();

    for target in [
        "wiki:///../secret",
        "wiki:///../../alpha/secret",
        "wiki:///a/../../secret",
        "wiki:///../../../../../../etc/passwd",
    ] {
        let err = env.router.read_file(&uri(target)).await.unwrap_err();
        assert_eq!(err.kind(), WikiErrorKind::PathEscape, "{target}");
    }

    let err = env
        .router
        .write_file(&uri("wiki:///../secret"), b"pwned", WriteFileOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), WikiErrorKind::PathEscape);
    assert_eq!(
        std::fs::read(env.dir.path().join("alpha/secret.md")).unwrap(),
        b"outside the wiki"
    );

    // Normalizes safely when it stays inside.
    write(&env.router, "wiki:///a/../inside", b"ok").await;
    assert!(env.wiki("alpha").join("inside.md").is_file());
}

// ============================================================================
// Routing
// ============================================================================

#[tokio::test]
async fn authority_selects_workspace() {
    let env = Env::new();
    write(&env.router, "wiki://alpha/note", b"in alpha").await;
    write(&env.router, "wiki://BETA/note?source=project", b"in beta").await;

    assert_eq!(
        std::fs::read(env.wiki("alpha").join("note.md")).unwrap(),
        b"in alpha"
    );
    assert_eq!(
        std::fs::read(env.wiki("beta").join("note.md")).unwrap(),
        b"in beta"
    );
    assert_eq!(env.router.lanes(), 2);

    let err = env.router.stat(&uri("wiki://gamma/")).await.unwrap_err();
    assert_eq!(err.kind(), WikiErrorKind::RootNotFound);
}

#[tokio::test]
async fn unsupported_source_is_typed() {
    let env = Env::new();
    let err = env
        .router
        .read_file(&uri("wiki:///note?source=dropbox"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), WikiErrorKind::UnsupportedSource);
    assert_eq!(env.router.live_stores(), 0);
}

#[tokio::test]
async fn rename_stays_on_source_root() {
    let env = Env::new();
    write(&env.router, "wiki://alpha/draft", b"text").await;

    // The destination authority is ignored; the move happens inside alpha.
    env.router
        .rename(
            &uri("wiki://alpha/draft"),
            &uri("wiki://beta/final"),
            RenameOptions::default(),
        )
        .await
        .unwrap();

    assert!(env.wiki("alpha").join("final.md").is_file());
    assert!(!env.wiki("beta").join("final.md").exists());
    assert_eq!(
        env.router.read_file(&uri("wiki://alpha/final")).await.unwrap(),
        b"text"
    );
}

#[tokio::test]
async fn no_workspaces_at_all() {
    let router = Router::new(WikiHost::new(Vec::new()));
    let err = router.stat(&uri("wiki:///")).await.unwrap_err();
    assert_eq!(err.kind(), WikiErrorKind::NoRootAvailable);
    assert_eq!(router.live_stores(), 0);
}

#[tokio::test]
async fn root_that_is_a_file() {
    let dir = TempDir::new().unwrap();
    let workspace = dir.path().join("ws");
    std::fs::create_dir_all(workspace.join(".vscode")).unwrap();
    std::fs::write(workspace.join(".vscode/.wiki"), b"oops").unwrap();

    let router = Router::new(WikiHost::new(vec![WorkspaceFolder::new("ws", 0, &workspace)]));
    let err = router.read_directory(&uri("wiki:///")).await.unwrap_err();
    assert_eq!(err.kind(), WikiErrorKind::RootNotADirectory);
    assert!(Path::new(&workspace.join(".vscode/.wiki")).is_file());
}
