//! Flag words carried by requests and metadata.
//!
//! Bit values match the Windows definitions so a dispatcher can pass the raw
//! words through with `from_bits_retain`.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// File attribute bits (`FILE_ATTRIBUTE_*`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct FileAttributes: u32 {
        const READONLY = 0x0000_0001;
        const HIDDEN = 0x0000_0002;
        const SYSTEM = 0x0000_0004;
        const DIRECTORY = 0x0000_0010;
        const ARCHIVE = 0x0000_0020;
        const NORMAL = 0x0000_0080;
        const TEMPORARY = 0x0000_0100;
        const SPARSE_FILE = 0x0000_0200;
        const REPARSE_POINT = 0x0000_0400;
        const COMPRESSED = 0x0000_0800;
        const OFFLINE = 0x0000_1000;
        const NOT_CONTENT_INDEXED = 0x0000_2000;
        const ENCRYPTED = 0x0000_4000;

        const _ = !0;
    }
}

bitflags! {
    /// Create/open option bits (`FILE_*` create options).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct CreateOptions: u32 {
        const DIRECTORY_FILE = 0x0000_0001;
        const WRITE_THROUGH = 0x0000_0002;
        const NON_DIRECTORY_FILE = 0x0000_0040;
        /// Caller cannot interpret extended attributes.
        const NO_EA_KNOWLEDGE = 0x0000_0200;
        const DELETE_ON_CLOSE = 0x0000_1000;
        const OPEN_REPARSE_POINT = 0x0020_0000;

        const _ = !0;
    }
}

bitflags! {
    /// Work requested by the dispatcher when the last handle is cleaned up.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct CleanupFlags: u32 {
        const DELETE = 0x01;
        const SET_ALLOCATION_SIZE = 0x02;
        const SET_ARCHIVE_BIT = 0x10;
        const SET_LAST_ACCESS_TIME = 0x20;
        const SET_LAST_WRITE_TIME = 0x40;
        const SET_CHANGE_TIME = 0x80;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_attribute_bits_survive() {
        let raw = 0x0008_0000 | FileAttributes::HIDDEN.bits();
        let attrs = FileAttributes::from_bits_retain(raw);
        assert!(attrs.contains(FileAttributes::HIDDEN));
        assert_eq!(attrs.bits(), raw);
    }

    #[test]
    fn test_cleanup_flags_compose() {
        let flags = CleanupFlags::DELETE | CleanupFlags::SET_LAST_WRITE_TIME;
        assert!(flags.contains(CleanupFlags::DELETE));
        assert!(!flags.contains(CleanupFlags::SET_ARCHIVE_BIT));
        assert_eq!(flags.bits(), 0x41);
    }
}
