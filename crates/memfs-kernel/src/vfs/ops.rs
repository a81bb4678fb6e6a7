//! Filesystem operations trait.
//!
//! The fixed operation set an external dispatcher calls. Every method is
//! synchronous and may be called concurrently from many threads.

use memfs_types::{
    BasicInfo, CleanupFlags, CreateOptions, CreateRequest, DirEntry, EaEntry, FileAttributes,
    FileInfo, FsResult, NameLookup, StreamEntry, VolumeInfo, Written,
};

/// Reply to `create` and `open`.
#[derive(Debug, Clone)]
pub struct Opened<H> {
    pub handle: H,
    pub info: FileInfo,
    /// The path with each existing component in its stored case.
    pub normalized_path: String,
}

/// Core filesystem operations.
///
/// Paths are absolute and `\`-separated; named streams are addressed as
/// `\dir\file:name`. A handle stays valid after the node is deleted or
/// renamed and always refers to the same node.
pub trait FileSystemOps: Send + Sync {
    type Handle: Clone + Send + Sync + 'static;

    // ========================================================================
    // Volume
    // ========================================================================

    fn get_volume_info(&self) -> FsResult<VolumeInfo>;

    /// Set the label, truncated to 32 UTF-16 units.
    fn set_volume_label(&self, label: &str) -> FsResult<VolumeInfo>;

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Attributes and security of `path` before it is opened.
    ///
    /// Answers [`NameLookup::Reparse`] when an ancestor is a reparse point.
    fn get_security_by_name(&self, path: &str) -> FsResult<NameLookup>;

    /// Create a new file, directory or named stream and open it.
    fn create(&self, path: &str, request: CreateRequest) -> FsResult<Opened<Self::Handle>>;

    /// Open an existing node.
    fn open(&self, path: &str, create_options: CreateOptions) -> FsResult<Opened<Self::Handle>>;

    /// Truncate an open file for reuse.
    ///
    /// Unopened named streams are dropped, EAs are replaced by `ea`, and the
    /// attributes are merged (or replaced when `replace_attributes`).
    fn overwrite(
        &self,
        handle: &Self::Handle,
        file_attributes: FileAttributes,
        replace_attributes: bool,
        allocation_size: u64,
        ea: Option<&[EaEntry]>,
    ) -> FsResult<FileInfo>;

    /// Last handle for an open instance is being closed.
    ///
    /// The only operation that physically removes nodes.
    fn cleanup(&self, handle: &Self::Handle, flags: CleanupFlags);

    fn close(&self, handle: Self::Handle);

    // ========================================================================
    // Data
    // ========================================================================

    /// Read up to `length` bytes at `offset`.
    ///
    /// Fails with `EndOfFile` when `offset` is at or past the end.
    fn read(&self, handle: &Self::Handle, offset: u64, length: u32) -> FsResult<Vec<u8>>;

    /// Write `data` at `offset` (or at the end when `write_to_end_of_file`).
    ///
    /// A constrained write never extends the file.
    fn write(
        &self,
        handle: &Self::Handle,
        offset: u64,
        data: &[u8],
        write_to_end_of_file: bool,
        constrained_io: bool,
    ) -> FsResult<Written>;

    /// `None` flushes the volume and returns no info.
    fn flush(&self, handle: Option<&Self::Handle>) -> FsResult<Option<FileInfo>>;

    // ========================================================================
    // Metadata
    // ========================================================================

    fn get_file_info(&self, handle: &Self::Handle) -> FsResult<FileInfo>;

    fn set_basic_info(&self, handle: &Self::Handle, basic: BasicInfo) -> FsResult<FileInfo>;

    fn set_file_size(
        &self,
        handle: &Self::Handle,
        new_size: u64,
        set_allocation: bool,
    ) -> FsResult<FileInfo>;

    fn get_security(&self, handle: &Self::Handle) -> FsResult<Vec<u8>>;

    fn set_security(&self, handle: &Self::Handle, security: &[u8]) -> FsResult<()>;

    // ========================================================================
    // Namespace
    // ========================================================================

    /// Fails with `DirectoryNotEmpty` when the node has children.
    fn can_delete(&self, handle: &Self::Handle) -> FsResult<()>;

    /// Move the node and its whole subtree from `old_path` to `new_path`.
    fn rename(
        &self,
        handle: &Self::Handle,
        old_path: &str,
        new_path: &str,
        replace_if_exists: bool,
    ) -> FsResult<()>;

    /// List a directory, resuming strictly after the leaf name `marker`.
    fn read_directory(
        &self,
        handle: &Self::Handle,
        marker: Option<&str>,
    ) -> FsResult<Vec<DirEntry>>;

    fn get_dir_info_by_name(&self, handle: &Self::Handle, name: &str) -> FsResult<DirEntry>;

    fn get_stream_info(&self, handle: &Self::Handle) -> FsResult<Vec<StreamEntry>>;

    // ========================================================================
    // Reparse points
    // ========================================================================

    fn get_reparse_point(&self, handle: &Self::Handle) -> FsResult<Vec<u8>>;

    fn get_reparse_point_by_name(&self, path: &str) -> FsResult<Vec<u8>>;

    fn set_reparse_point(&self, handle: &Self::Handle, buffer: &[u8]) -> FsResult<()>;

    /// `buffer` carries the tag (and GUID) of the payload being removed.
    fn delete_reparse_point(&self, handle: &Self::Handle, buffer: &[u8]) -> FsResult<()>;

    // ========================================================================
    // Extended attributes
    // ========================================================================

    fn get_ea(&self, handle: &Self::Handle) -> FsResult<Vec<EaEntry>>;

    fn set_ea(&self, handle: &Self::Handle, entries: &[EaEntry]) -> FsResult<FileInfo>;

    // ========================================================================
    // Convenience
    // ========================================================================

    /// Read the whole file.
    fn read_all(&self, handle: &Self::Handle) -> FsResult<Vec<u8>> {
        let size = self.get_file_info(handle)?.file_size;
        if size == 0 {
            return Ok(Vec::new());
        }
        let length = u32::try_from(size).unwrap_or(u32::MAX);
        self.read(handle, 0, length)
    }
}
