//! Engine error type.

use thiserror::Error;

/// Failure returned by an engine operation.
///
/// Every variant maps to exactly one failing [`Status`](crate::Status); the
/// mapping lives in `status.rs` so the dispatcher applies it in one place.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FsError {
    /// The final path component does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// An intermediate path component does not exist.
    #[error("path not found: {0}")]
    PathNotFound(String),

    /// An intermediate path component is not a directory.
    #[error("not a directory: {0}")]
    NotADirectory(String),

    /// The target name is already taken.
    #[error("name collision: {0}")]
    NameCollision(String),

    /// The directory still has children.
    #[error("directory not empty: {0}")]
    DirectoryNotEmpty(String),

    /// Node count or byte quota exhausted.
    #[error("disk full")]
    DiskFull,

    /// A buffer could not be allocated.
    #[error("insufficient resources")]
    InsufficientResources,

    /// Operation refused for this node.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// Read offset at or past end of file.
    #[error("end of file")]
    EndOfFile,

    /// Node carries no reparse payload.
    #[error("not a reparse point: {0}")]
    NotAReparsePoint(String),

    /// Replacement reparse payload has a different tag or GUID.
    #[error("reparse tag mismatch")]
    ReparseTagMismatch,

    /// Malformed argument.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

impl FsError {
    /// Create a NotFound error.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    /// Create a PathNotFound error.
    pub fn path_not_found(path: impl Into<String>) -> Self {
        Self::PathNotFound(path.into())
    }

    /// Create a NotADirectory error.
    pub fn not_a_directory(path: impl Into<String>) -> Self {
        Self::NotADirectory(path.into())
    }

    /// Create a NameCollision error.
    pub fn name_collision(path: impl Into<String>) -> Self {
        Self::NameCollision(path.into())
    }

    /// Create a DirectoryNotEmpty error.
    pub fn directory_not_empty(path: impl Into<String>) -> Self {
        Self::DirectoryNotEmpty(path.into())
    }

    /// Create an AccessDenied error.
    pub fn access_denied(path: impl Into<String>) -> Self {
        Self::AccessDenied(path.into())
    }

    /// Create a NotAReparsePoint error.
    pub fn not_a_reparse_point(path: impl Into<String>) -> Self {
        Self::NotAReparsePoint(path.into())
    }

    /// Create an InvalidParameter error.
    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }
}

/// Engine result type.
pub type FsResult<T> = Result<T, FsError>;
