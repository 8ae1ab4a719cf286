//! Wiki filesystem error types.

use std::io;
use thiserror::Error;

/// Wiki filesystem error type.
#[derive(Debug, Error)]
pub enum WikiError {
    /// No backing entry for the virtual path.
    #[error("not found: {0}")]
    NotFound(String),

    /// Conflicting create or write.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Expected a directory.
    #[error("not a directory: {0}")]
    NotADirectory(String),

    /// Expected a file.
    #[error("is a directory: {0}")]
    IsADirectory(String),

    /// Permission denied (e.g. non-recursive delete of a non-empty directory).
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Path escapes its root (security violation).
    #[error("path escapes root: {0}")]
    PathEscape(String),

    /// No workspace matches the URI authority.
    #[error("no matching workspace found: {0}")]
    RootNotFound(String),

    /// The host has no local workspaces at all.
    #[error("no workspace available")]
    NoRootAvailable,

    /// The root's backing path exists but is not a directory.
    #[error("root is not a directory: {0}")]
    RootNotADirectory(String),

    /// Unknown `source` selector.
    #[error("wiki source not supported: {0}")]
    UnsupportedSource(String),

    /// Malformed URI string.
    #[error("invalid uri: {0}")]
    InvalidUri(String),

    /// The operation lane for a root stopped before running the action.
    #[error("operation queue closed for root: {0}")]
    QueueClosed(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Discriminant of [`WikiError`], handy for matching without payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WikiErrorKind {
    NotFound,
    AlreadyExists,
    NotADirectory,
    IsADirectory,
    PermissionDenied,
    PathEscape,
    RootNotFound,
    NoRootAvailable,
    RootNotADirectory,
    UnsupportedSource,
    InvalidUri,
    QueueClosed,
    Io,
}

impl WikiError {
    /// Create a NotFound error.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    /// Create an AlreadyExists error.
    pub fn already_exists(path: impl Into<String>) -> Self {
        Self::AlreadyExists(path.into())
    }

    /// Create a NotADirectory error.
    pub fn not_a_directory(path: impl Into<String>) -> Self {
        Self::NotADirectory(path.into())
    }

    /// Create an IsADirectory error.
    pub fn is_a_directory(path: impl Into<String>) -> Self {
        Self::IsADirectory(path.into())
    }

    /// Create a PermissionDenied error.
    pub fn permission_denied(path: impl Into<String>) -> Self {
        Self::PermissionDenied(path.into())
    }

    /// Create a PathEscape error.
    pub fn path_escape(path: impl Into<String>) -> Self {
        Self::PathEscape(path.into())
    }

    /// Create a RootNotFound error.
    pub fn root_not_found(authority: impl Into<String>) -> Self {
        Self::RootNotFound(authority.into())
    }

    /// Create an UnsupportedSource error.
    pub fn unsupported_source(source: impl Into<String>) -> Self {
        Self::UnsupportedSource(source.into())
    }

    /// Create an InvalidUri error.
    pub fn invalid_uri(uri: impl Into<String>) -> Self {
        Self::InvalidUri(uri.into())
    }

    /// Map a raw I/O error onto the typed variants, tagging it with the
    /// virtual path the caller addressed.
    pub fn from_io(err: io::Error, path: impl Into<String>) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.into()),
            io::ErrorKind::AlreadyExists => Self::AlreadyExists(path.into()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.into()),
            io::ErrorKind::NotADirectory => Self::NotADirectory(path.into()),
            io::ErrorKind::IsADirectory => Self::IsADirectory(path.into()),
            _ => Self::Io(err),
        }
    }

    /// The payload-free kind of this error.
    pub fn kind(&self) -> WikiErrorKind {
        match self {
            Self::NotFound(_) => WikiErrorKind::NotFound,
            Self::AlreadyExists(_) => WikiErrorKind::AlreadyExists,
            Self::NotADirectory(_) => WikiErrorKind::NotADirectory,
            Self::IsADirectory(_) => WikiErrorKind::IsADirectory,
            Self::PermissionDenied(_) => WikiErrorKind::PermissionDenied,
            Self::PathEscape(_) => WikiErrorKind::PathEscape,
            Self::RootNotFound(_) => WikiErrorKind::RootNotFound,
            Self::NoRootAvailable => WikiErrorKind::NoRootAvailable,
            Self::RootNotADirectory(_) => WikiErrorKind::RootNotADirectory,
            Self::UnsupportedSource(_) => WikiErrorKind::UnsupportedSource,
            Self::InvalidUri(_) => WikiErrorKind::InvalidUri,
            Self::QueueClosed(_) => WikiErrorKind::QueueClosed,
            Self::Io(_) => WikiErrorKind::Io,
        }
    }
}

/// Convert WikiError to std::io::Error for hosts that speak io errors.
impl From<WikiError> for io::Error {
    fn from(e: WikiError) -> Self {
        match e {
            WikiError::NotFound(msg) => io::Error::new(io::ErrorKind::NotFound, msg),
            WikiError::AlreadyExists(msg) => io::Error::new(io::ErrorKind::AlreadyExists, msg),
            WikiError::NotADirectory(msg) => io::Error::new(io::ErrorKind::NotADirectory, msg),
            WikiError::IsADirectory(msg) => io::Error::new(io::ErrorKind::IsADirectory, msg),
            WikiError::PermissionDenied(msg) => {
                io::Error::new(io::ErrorKind::PermissionDenied, msg)
            }
            WikiError::PathEscape(msg) => io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("path escapes root: {msg}"),
            ),
            WikiError::RootNotFound(msg) => io::Error::new(
                io::ErrorKind::NotFound,
                format!("no matching workspace found: {msg}"),
            ),
            WikiError::NoRootAvailable => {
                io::Error::new(io::ErrorKind::NotFound, "no workspace available")
            }
            WikiError::RootNotADirectory(msg) => io::Error::new(io::ErrorKind::NotADirectory, msg),
            WikiError::UnsupportedSource(msg) => io::Error::new(
                io::ErrorKind::Unsupported,
                format!("wiki source not supported: {msg}"),
            ),
            WikiError::InvalidUri(msg) => io::Error::new(io::ErrorKind::InvalidInput, msg),
            WikiError::QueueClosed(msg) => io::Error::other(format!("operation queue closed: {msg}")),
            WikiError::Io(e) => e,
        }
    }
}

/// Wiki filesystem result type.
pub type WikiResult<T> = Result<T, WikiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_io_maps_known_kinds() {
        let err = WikiError::from_io(io::Error::from(io::ErrorKind::NotFound), "/a");
        assert!(matches!(err, WikiError::NotFound(ref p) if p == "/a"));

        let err = WikiError::from_io(io::Error::from(io::ErrorKind::AlreadyExists), "/b");
        assert_eq!(err.kind(), WikiErrorKind::AlreadyExists);

        let err = WikiError::from_io(io::Error::other("disk on fire"), "/c");
        assert_eq!(err.kind(), WikiErrorKind::Io);
    }

    #[test]
    fn test_security_errors_stay_distinct_as_io() {
        let io_err: io::Error = WikiError::path_escape("/../etc").into();
        assert_eq!(io_err.kind(), io::ErrorKind::PermissionDenied);

        let io_err: io::Error = WikiError::unsupported_source("git").into();
        assert_eq!(io_err.kind(), io::ErrorKind::Unsupported);
    }
}
