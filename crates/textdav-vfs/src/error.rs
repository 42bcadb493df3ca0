//! VFS error types.

use std::io;
use thiserror::Error;

/// A malformed manifest line. Every variant carries the 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManifestError {
    /// Fewer than two `#`-separated fields.
    #[error("line {line}: expected path#size[#displayname]")]
    MissingSize { line: usize },

    /// Size field is not a non-negative integer.
    #[error("line {line}: invalid size {value:?}")]
    InvalidSize { line: usize, value: String },

    /// Path field is empty.
    #[error("line {line}: path must not be empty")]
    EmptyPath { line: usize },

    /// Display name field present but blank.
    #[error("line {line}: display name must not be empty")]
    EmptyDisplayName { line: usize },

    /// Path could not be normalized.
    #[error("line {line}: invalid path {path:?}")]
    InvalidPath { line: usize, path: String },
}

impl ManifestError {
    /// Line the error was found on.
    pub fn line(&self) -> usize {
        match self {
            ManifestError::MissingSize { line }
            | ManifestError::InvalidSize { line, .. }
            | ManifestError::EmptyPath { line }
            | ManifestError::EmptyDisplayName { line }
            | ManifestError::InvalidPath { line, .. } => *line,
        }
    }
}

/// VFS error type.
#[derive(Debug, Error)]
pub enum VfsError {
    /// Path absent and not implied by any descendant.
    #[error("not found: {0}")]
    NotFound(String),

    /// Path already exists.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Mutation refused by the read-only policy or open mode.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Operation does not apply to this kind of entry.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Bad seek, bad path or other malformed input.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Operation on a closed session handle.
    #[error("handle closed")]
    HandleClosed,

    /// Bulk-load manifest could not be parsed.
    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// I/O error (reading a manifest from disk).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl VfsError {
    /// Create a NotFound error.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    /// Create an AlreadyExists error.
    pub fn already_exists(path: impl Into<String>) -> Self {
        Self::AlreadyExists(path.into())
    }

    /// Create a PermissionDenied error.
    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::PermissionDenied(msg.into())
    }

    /// Create an InvalidOperation error.
    pub fn invalid_operation(msg: impl Into<String>) -> Self {
        Self::InvalidOperation(msg.into())
    }

    /// Create an InvalidArgument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// HTTP status a protocol engine would answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            VfsError::NotFound(_) => 404,
            VfsError::AlreadyExists(_) => 409,
            VfsError::PermissionDenied(_) => 403,
            VfsError::InvalidOperation(_)
            | VfsError::InvalidArgument(_)
            | VfsError::HandleClosed
            | VfsError::Manifest(_) => 400,
            VfsError::Io(_) => 500,
        }
    }
}

/// Convert VfsError to std::io::Error for compatibility.
impl From<VfsError> for io::Error {
    fn from(e: VfsError) -> Self {
        match e {
            VfsError::NotFound(msg) => io::Error::new(io::ErrorKind::NotFound, msg),
            VfsError::AlreadyExists(msg) => io::Error::new(io::ErrorKind::AlreadyExists, msg),
            VfsError::PermissionDenied(msg) => {
                io::Error::new(io::ErrorKind::PermissionDenied, msg)
            }
            VfsError::InvalidOperation(msg) => io::Error::new(io::ErrorKind::Unsupported, msg),
            VfsError::InvalidArgument(msg) => io::Error::new(io::ErrorKind::InvalidInput, msg),
            VfsError::HandleClosed => io::Error::other("handle closed"),
            VfsError::Manifest(e) => io::Error::new(io::ErrorKind::InvalidData, e),
            VfsError::Io(e) => e,
        }
    }
}

/// VFS result type.
pub type VfsResult<T> = Result<T, VfsError>;
