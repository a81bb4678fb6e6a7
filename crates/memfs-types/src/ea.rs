//! Extended attributes.

use serde::{Deserialize, Serialize};

use crate::error::{FsError, FsResult};

/// Longest EA name the wire format can carry (one length byte).
pub const MAX_EA_NAME_LEN: usize = 255;

/// Longest EA value the wire format can carry (two length bytes).
pub const MAX_EA_VALUE_LEN: usize = 65_535;

/// Flags, name length, value length and the name terminator.
const PACKED_OVERHEAD: u32 = 5;

/// A single extended attribute.
///
/// An empty `value` in a set request deletes the attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EaEntry {
    pub name: String,
    pub value: Vec<u8>,
    /// The file cannot be interpreted without this attribute.
    pub need_ea: bool,
}

impl EaEntry {
    pub fn new(name: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            need_ea: false,
        }
    }

    /// Mark the attribute as required for interpreting the file.
    pub fn needed(mut self) -> Self {
        self.need_ea = true;
        self
    }

    /// Bytes this entry contributes to a file's EA size.
    pub fn packed_size(&self) -> u32 {
        PACKED_OVERHEAD + self.name.len() as u32 + self.value.len() as u32
    }

    /// Case-folded lookup key; EA names compare case-insensitively.
    pub fn key(&self) -> String {
        self.name.to_ascii_uppercase()
    }

    pub fn validate(&self) -> FsResult<()> {
        if self.name.is_empty() {
            return Err(FsError::invalid_parameter("empty EA name"));
        }
        if self.name.len() > MAX_EA_NAME_LEN {
            return Err(FsError::invalid_parameter(format!(
                "EA name is {} bytes (max {MAX_EA_NAME_LEN})",
                self.name.len()
            )));
        }
        if self.value.len() > MAX_EA_VALUE_LEN {
            return Err(FsError::invalid_parameter(format!(
                "EA value for {} is {} bytes (max {MAX_EA_VALUE_LEN})",
                self.name,
                self.value.len()
            )));
        }
        Ok(())
    }
}
