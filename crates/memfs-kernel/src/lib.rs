//! # memfs-kernel
//!
//! In-memory filesystem engine answering synchronous calls from an external
//! dispatcher.
//!
//! The engine is a volatile mapping from `\`-separated paths to nodes:
//! - Owns `\` and every node below it in a single ordered index
//! - Answers child, stream and subtree queries by range scan over that index
//! - Supports named streams (`\file:name`), extended attributes and reparse
//!   points
//! - Defers physical deletion to cleanup and relocates whole subtrees on
//!   rename
//! - Can simulate asynchronous driver completion through [`SlowIo`]

pub mod config;
pub mod slowio;
pub mod vfs;

pub use config::{ConfigError, MemFsConfig};
pub use slowio::{CompletionSink, InFlight, IoOutcome, RequestToken, SlowIo, SlowIoConfig};
pub use vfs::{FileHandle, FileNode, FileSystemOps, MemFs, NamespaceIndex, NodeTree, Opened};

pub use memfs_types::{
    BasicInfo, CleanupFlags, CreateExtra, CreateOptions, CreateRequest, DirEntry, EaEntry,
    FileAttributes, FileInfo, FsError, FsResult, NameLookup, Status, StreamEntry, VolumeInfo,
    Written,
};
