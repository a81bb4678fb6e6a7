//! Dispatcher-facing status codes.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::error::{FsError, FsResult};

/// Completion code handed back to the dispatcher.
///
/// `Success` and `Pending` are the only non-failure codes. `Pending` is never
/// produced by the engine itself, only by the deferred-completion layer, and
/// means the real outcome arrives later through a completion callback.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, EnumString,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Status {
    Success,
    Pending,
    /// The path crosses a reparse point the dispatcher must resolve.
    Reparse,
    NotFound,
    PathNotFound,
    NotADirectory,
    NameCollision,
    DirectoryNotEmpty,
    DiskFull,
    InsufficientResources,
    AccessDenied,
    EndOfFile,
    NotAReparsePoint,
    ReparseTagMismatch,
    InvalidParameter,
}

impl Status {
    /// Parse from string (case-insensitive).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        <Self as FromStr>::from_str(s).ok()
    }

    /// Status of a finished operation.
    pub fn of<T>(result: &FsResult<T>) -> Self {
        match result {
            Ok(_) => Status::Success,
            Err(e) => Status::from(e),
        }
    }

    /// Check if this status means the operation succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, Status::Success)
    }

    /// Check if this status is final (everything but `Pending`).
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Status::Pending)
    }

    /// NTSTATUS value for this code.
    pub fn ntstatus(&self) -> u32 {
        match self {
            Status::Success => 0x0000_0000,
            Status::Pending => 0x0000_0103,
            Status::Reparse => 0x0000_0104,
            Status::NotFound => 0xC000_0034,
            Status::PathNotFound => 0xC000_003A,
            Status::NotADirectory => 0xC000_0103,
            Status::NameCollision => 0xC000_0035,
            Status::DirectoryNotEmpty => 0xC000_0101,
            Status::DiskFull => 0xC000_007F,
            Status::InsufficientResources => 0xC000_009A,
            Status::AccessDenied => 0xC000_0022,
            Status::EndOfFile => 0xC000_0011,
            Status::NotAReparsePoint => 0xC000_0275,
            Status::ReparseTagMismatch => 0xC000_0277,
            Status::InvalidParameter => 0xC000_000D,
        }
    }
}

impl From<&FsError> for Status {
    fn from(e: &FsError) -> Self {
        match e {
            FsError::NotFound(_) => Status::NotFound,
            FsError::PathNotFound(_) => Status::PathNotFound,
            FsError::NotADirectory(_) => Status::NotADirectory,
            FsError::NameCollision(_) => Status::NameCollision,
            FsError::DirectoryNotEmpty(_) => Status::DirectoryNotEmpty,
            FsError::DiskFull => Status::DiskFull,
            FsError::InsufficientResources => Status::InsufficientResources,
            FsError::AccessDenied(_) => Status::AccessDenied,
            FsError::EndOfFile => Status::EndOfFile,
            FsError::NotAReparsePoint(_) => Status::NotAReparsePoint,
            FsError::ReparseTagMismatch => Status::ReparseTagMismatch,
            FsError::InvalidParameter(_) => Status::InvalidParameter,
        }
    }
}

impl From<FsError> for Status {
    fn from(e: FsError) -> Self {
        Status::from(&e)
    }
}
