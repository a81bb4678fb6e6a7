//! File and volume metadata.

use serde::{Deserialize, Serialize};

use crate::flags::FileAttributes;

/// Metadata snapshot of one node.
///
/// Timestamps are FILETIME values (see [`crate::time`]).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub file_attributes: FileAttributes,
    /// Tag of the attached reparse payload, 0 when there is none.
    pub reparse_tag: u32,
    /// Bytes reserved for the data buffer.
    pub allocation_size: u64,
    /// Logical length of the data.
    pub file_size: u64,
    pub creation_time: u64,
    pub last_access_time: u64,
    pub last_write_time: u64,
    pub change_time: u64,
    /// Unique per engine, assigned at creation.
    pub index_number: u64,
    /// Always 0; hard links are not supported.
    pub hard_links: u32,
    /// Packed size of all extended attributes.
    pub ea_size: u32,
}

impl FileInfo {
    /// Fresh metadata with all four timestamps set to `now`.
    pub fn new(file_attributes: FileAttributes, index_number: u64, now: u64) -> Self {
        Self {
            file_attributes,
            creation_time: now,
            last_access_time: now,
            last_write_time: now,
            change_time: now,
            index_number,
            ..Default::default()
        }
    }

    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        self.file_attributes.contains(FileAttributes::DIRECTORY)
    }

    /// Returns true if a reparse payload is attached.
    pub fn is_reparse_point(&self) -> bool {
        self.file_attributes.contains(FileAttributes::REPARSE_POINT)
    }

    /// Update the three mutable timestamps.
    pub fn touch(&mut self, now: u64) {
        self.last_access_time = now;
        self.last_write_time = now;
        self.change_time = now;
    }
}

/// Fields for `set_basic_info`; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicInfo {
    pub file_attributes: Option<FileAttributes>,
    pub creation_time: Option<u64>,
    pub last_access_time: Option<u64>,
    pub last_write_time: Option<u64>,
    pub change_time: Option<u64>,
}

impl BasicInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attributes(mut self, attributes: FileAttributes) -> Self {
        self.file_attributes = Some(attributes);
        self
    }

    pub fn with_creation_time(mut self, filetime: u64) -> Self {
        self.creation_time = Some(filetime);
        self
    }

    pub fn with_last_access_time(mut self, filetime: u64) -> Self {
        self.last_access_time = Some(filetime);
        self
    }

    pub fn with_last_write_time(mut self, filetime: u64) -> Self {
        self.last_write_time = Some(filetime);
        self
    }

    pub fn with_change_time(mut self, filetime: u64) -> Self {
        self.change_time = Some(filetime);
        self
    }

    /// Apply the set fields to `info`.
    pub fn apply(&self, info: &mut FileInfo) {
        if let Some(attributes) = self.file_attributes {
            info.file_attributes = attributes;
        }
        if let Some(t) = self.creation_time {
            info.creation_time = t;
        }
        if let Some(t) = self.last_access_time {
            info.last_access_time = t;
        }
        if let Some(t) = self.last_write_time {
            info.last_write_time = t;
        }
        if let Some(t) = self.change_time {
            info.change_time = t;
        }
    }
}

/// Directory listing row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    /// Leaf name (not full path), or `.`/`..`.
    pub name: String,
    pub info: FileInfo,
}

impl DirEntry {
    pub fn new(name: impl Into<String>, info: FileInfo) -> Self {
        Self {
            name: name.into(),
            info,
        }
    }
}

/// One data stream of a file. The unnamed (main) stream has an empty name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamEntry {
    pub name: String,
    pub size: u64,
    pub allocation_size: u64,
}

/// Volume statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeInfo {
    pub total_size: u64,
    pub free_size: u64,
    pub volume_label: String,
}
