//! Request and reply shapes for engine operations.

use serde::{Deserialize, Serialize};

use crate::ea::EaEntry;
use crate::flags::{CreateOptions, FileAttributes};
use crate::info::FileInfo;

/// Payload attached to a new node at creation time.
///
/// A create request carries either extended attributes or a reparse buffer,
/// never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreateExtra {
    Ea(Vec<EaEntry>),
    Reparse(Vec<u8>),
}

/// Everything `create` needs besides the path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRequest {
    pub create_options: CreateOptions,
    pub file_attributes: FileAttributes,
    /// Opaque security descriptor.
    pub security: Vec<u8>,
    pub allocation_size: u64,
    pub extra: Option<CreateExtra>,
}

impl CreateRequest {
    /// Request for a regular file (or named stream).
    pub fn file() -> Self {
        Self::default()
    }

    /// Request for a directory.
    pub fn directory() -> Self {
        Self {
            create_options: CreateOptions::DIRECTORY_FILE,
            file_attributes: FileAttributes::DIRECTORY,
            ..Default::default()
        }
    }

    pub fn with_attributes(mut self, attributes: FileAttributes) -> Self {
        self.file_attributes |= attributes;
        self
    }

    pub fn with_security(mut self, security: impl Into<Vec<u8>>) -> Self {
        self.security = security.into();
        self
    }

    pub fn with_allocation_size(mut self, allocation_size: u64) -> Self {
        self.allocation_size = allocation_size;
        self
    }

    pub fn with_ea(mut self, entries: Vec<EaEntry>) -> Self {
        self.extra = Some(CreateExtra::Ea(entries));
        self
    }

    pub fn with_reparse(mut self, buffer: impl Into<Vec<u8>>) -> Self {
        self.extra = Some(CreateExtra::Reparse(buffer.into()));
        self
    }

    pub fn is_directory(&self) -> bool {
        self.create_options.contains(CreateOptions::DIRECTORY_FILE)
    }
}

/// Result of a name-based security lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameLookup {
    /// The node exists.
    Found {
        file_attributes: FileAttributes,
        security: Vec<u8>,
    },
    /// An ancestor along the path is a reparse point.
    Reparse,
}

/// Reply to a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Written {
    pub bytes_written: u32,
    pub info: FileInfo,
}
