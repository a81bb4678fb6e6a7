//! Reparse buffer header parsing.
//!
//! A reparse buffer starts with a little-endian `u32` tag, a `u16` data
//! length and a reserved `u16`. Tags without the Microsoft bit are followed
//! by a 16-byte GUID that identifies the owner.

use crate::error::{FsError, FsResult};

pub const REPARSE_HEADER_SIZE: usize = 8;
pub const REPARSE_GUID_HEADER_SIZE: usize = 24;

pub const IO_REPARSE_TAG_MOUNT_POINT: u32 = 0xA000_0003;
pub const IO_REPARSE_TAG_SYMLINK: u32 = 0xA000_000C;

/// Tags owned by Microsoft carry the high bit.
pub fn is_microsoft_tag(tag: u32) -> bool {
    tag & 0x8000_0000 != 0
}

/// Read the tag from a reparse buffer, checking the header fits.
pub fn reparse_tag(buffer: &[u8]) -> FsResult<u32> {
    let header: [u8; 4] = buffer
        .get(..4)
        .and_then(|b| b.try_into().ok())
        .filter(|_| buffer.len() >= REPARSE_HEADER_SIZE)
        .ok_or_else(|| {
            FsError::invalid_parameter(format!(
                "reparse buffer is {} bytes, header needs {REPARSE_HEADER_SIZE}",
                buffer.len()
            ))
        })?;
    let tag = u32::from_le_bytes(header);
    if !is_microsoft_tag(tag) && buffer.len() < REPARSE_GUID_HEADER_SIZE {
        return Err(FsError::invalid_parameter(format!(
            "third-party reparse buffer is {} bytes, header needs {REPARSE_GUID_HEADER_SIZE}",
            buffer.len()
        )));
    }
    Ok(tag)
}

fn reparse_guid(buffer: &[u8]) -> Option<&[u8]> {
    buffer.get(REPARSE_HEADER_SIZE..REPARSE_GUID_HEADER_SIZE)
}

/// Check that `replacement` may replace (or delete) the `current` payload.
///
/// Tags must match; third-party tags must also carry the same GUID.
pub fn can_replace(current: &[u8], replacement: &[u8]) -> FsResult<()> {
    let current_tag = reparse_tag(current)?;
    let replacement_tag = reparse_tag(replacement)?;
    if current_tag != replacement_tag {
        return Err(FsError::ReparseTagMismatch);
    }
    if !is_microsoft_tag(current_tag) && reparse_guid(current) != reparse_guid(replacement) {
        return Err(FsError::ReparseTagMismatch);
    }
    Ok(())
}

/// Build a reparse buffer from a tag and payload, for tests and tooling.
pub fn build_reparse_buffer(tag: u32, guid: Option<[u8; 16]>, payload: &[u8]) -> Vec<u8> {
    let mut buffer = Vec::with_capacity(REPARSE_GUID_HEADER_SIZE + payload.len());
    buffer.extend_from_slice(&tag.to_le_bytes());
    buffer.extend_from_slice(&(payload.len() as u16).to_le_bytes());
    buffer.extend_from_slice(&[0, 0]);
    if let Some(guid) = guid {
        buffer.extend_from_slice(&guid);
    }
    buffer.extend_from_slice(payload);
    buffer
}
