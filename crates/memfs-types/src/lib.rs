//! Shared vocabulary for the memfs engine.
//!
//! This crate is the leaf the engine and any dispatcher build on: status
//! codes, the error type engine operations return, file metadata, and the
//! flag words that travel with create/open/cleanup requests. It has **no
//! internal memfs dependencies**.
//!
//! # Key Types
//!
//! |-------------------|----------------------------------------------|
//! | Type              | Purpose                                      |
//! |-------------------|----------------------------------------------|
//! | [`Status`]        | Dispatcher-facing completion code            |
//! | [`FsError`]       | Failure returned by engine operations        |
//! | [`FileInfo`]      | Metadata snapshot of one node                |
//! | [`DirEntry`]      | One directory listing row (name + info)      |
//! | [`StreamEntry`]   | One named data stream of a file              |
//! | [`EaEntry`]       | One extended attribute                       |
//! | [`CreateRequest`] | Everything `create` needs besides the path   |
//! |-------------------|----------------------------------------------|

pub mod ea;
pub mod error;
pub mod flags;
pub mod info;
pub mod reparse;
pub mod request;
pub mod status;
pub mod time;

pub use ea::EaEntry;
pub use error::{FsError, FsResult};
pub use flags::{CleanupFlags, CreateOptions, FileAttributes};
pub use info::{BasicInfo, DirEntry, FileInfo, StreamEntry, VolumeInfo};
pub use request::{CreateExtra, CreateRequest, NameLookup, Written};
pub use status::Status;
pub use time::{filetime_from_system_time, filetime_now, system_time_from_filetime};
