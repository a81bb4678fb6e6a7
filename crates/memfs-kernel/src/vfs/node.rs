//! Per-entry record: metadata, data buffer, EAs and reparse payload.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, MutexGuard};

use memfs_types::reparse::reparse_tag;
use memfs_types::{EaEntry, FileAttributes, FileInfo, FsError, FsResult};

/// Bounds applied when resizing a data buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeLimits {
    pub max_file_size: u64,
    pub allocation_unit: u64,
}

impl SizeLimits {
    /// Round `size` up to the next multiple of the allocation unit.
    pub fn round_up(&self, size: u64) -> FsResult<u64> {
        size.div_ceil(self.allocation_unit)
            .checked_mul(self.allocation_unit)
            .ok_or(FsError::DiskFull)
    }
}

/// Mutable part of a node, guarded by the node's lock.
#[derive(Debug)]
pub struct NodeState {
    /// Stored-case full path. Rewritten by rename.
    pub path: String,
    pub info: FileInfo,
    pub security: Vec<u8>,
    /// `len() == info.allocation_size`. `None` for directories.
    pub data: Option<Vec<u8>>,
    pub reparse_data: Option<Vec<u8>>,
    /// Keyed by the folded EA name.
    pub ea: Option<BTreeMap<String, EaEntry>>,
}

impl NodeState {
    pub fn set_allocation_size(&mut self, allocation_size: u64, limits: &SizeLimits) -> FsResult<()> {
        if allocation_size > limits.max_file_size {
            return Err(FsError::DiskFull);
        }
        let Some(data) = self.data.as_mut() else {
            if allocation_size == 0 {
                return Ok(());
            }
            return Err(FsError::invalid_parameter(format!(
                "{} is a directory and has no data",
                self.path
            )));
        };
        let new_len = usize::try_from(allocation_size).map_err(|_| FsError::DiskFull)?;
        if new_len > data.len() {
            data.try_reserve_exact(new_len - data.len())
                .map_err(|_| FsError::InsufficientResources)?;
            data.resize(new_len, 0);
        } else {
            data.truncate(new_len);
            data.shrink_to_fit();
        }
        self.info.allocation_size = allocation_size;
        self.info.file_size = self.info.file_size.min(allocation_size);
        Ok(())
    }

    /// Set the logical size, or the allocation size when `set_allocation`.
    ///
    /// Growing the logical size grows the allocation first and zero-fills the
    /// bytes between the old and new end of file.
    pub fn set_file_size(
        &mut self,
        new_size: u64,
        set_allocation: bool,
        limits: &SizeLimits,
    ) -> FsResult<()> {
        if set_allocation {
            return self.set_allocation_size(new_size, limits);
        }
        if self.data.is_none() {
            if new_size == 0 {
                return Ok(());
            }
            return Err(FsError::invalid_parameter(format!(
                "{} is a directory and has no data",
                self.path
            )));
        }

        if self.info.allocation_size < new_size {
            let rounded = limits.round_up(new_size)?;
            self.set_allocation_size(rounded, limits)?;
        }

        let old_size = self.info.file_size;
        if old_size < new_size {
            if let Some(data) = self.data.as_mut() {
                // allocation_size >= new_size here, and both fit in usize
                data[old_size as usize..new_size as usize].fill(0);
            }
        }
        self.info.file_size = new_size;
        Ok(())
    }

    /// The logical contents, `file_size` bytes long.
    pub fn contents(&self) -> &[u8] {
        match &self.data {
            Some(data) => &data[..self.info.file_size as usize],
            None => &[],
        }
    }

    pub fn ea_entries(&self) -> Vec<EaEntry> {
        self.ea
            .as_ref()
            .map(|map| map.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Add, replace, or (for an empty value) delete one EA.
    pub fn set_ea(&mut self, entry: &EaEntry) -> FsResult<()> {
        entry.validate()?;
        let map = self.ea.get_or_insert_with(BTreeMap::new);
        let key = entry.key();
        let old_cost = map.get(&key).map_or(0, EaEntry::packed_size);
        let new_cost = if entry.value.is_empty() {
            map.remove(&key);
            0
        } else {
            let cost = entry.packed_size();
            map.insert(key, entry.clone());
            cost
        };
        self.info.ea_size = self.info.ea_size - old_cost + new_cost;
        Ok(())
    }

    pub fn clear_ea(&mut self) {
        self.ea = None;
        self.info.ea_size = 0;
    }

    /// True if any EA is flagged as required to interpret the file.
    pub fn needs_ea(&self) -> bool {
        self.ea
            .as_ref()
            .is_some_and(|map| map.values().any(|entry| entry.need_ea))
    }

    pub fn set_reparse_data(&mut self, buffer: Vec<u8>) -> FsResult<()> {
        let tag = reparse_tag(&buffer)?;
        self.reparse_data = Some(buffer);
        self.info.reparse_tag = tag;
        self.info.file_attributes |= FileAttributes::REPARSE_POINT;
        Ok(())
    }

    pub fn clear_reparse_data(&mut self) {
        self.reparse_data = None;
        self.info.reparse_tag = 0;
        self.info.file_attributes.remove(FileAttributes::REPARSE_POINT);
    }
}

/// One namespace entry: file, directory or named stream.
///
/// Streams keep a weak link to the node named before the `:`. EAs,
/// security and timestamps of a stream live on that main node.
#[derive(Debug)]
pub struct FileNode {
    state: Mutex<NodeState>,
    main: Option<Weak<FileNode>>,
    open_count: AtomicU32,
}

impl FileNode {
    pub fn new(
        path: impl Into<String>,
        info: FileInfo,
        security: Vec<u8>,
        main: Option<&Arc<FileNode>>,
    ) -> Self {
        let data = if info.is_dir() { None } else { Some(Vec::new()) };
        Self {
            state: Mutex::new(NodeState {
                path: path.into(),
                info,
                security,
                data,
                reparse_data: None,
                ea: None,
            }),
            main: main.map(Arc::downgrade),
            open_count: AtomicU32::new(0),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, NodeState> {
        self.state.lock()
    }

    pub fn path(&self) -> String {
        self.state.lock().path.clone()
    }

    pub fn is_stream(&self) -> bool {
        self.main.is_some()
    }

    pub fn is_directory(&self) -> bool {
        self.state.lock().info.is_dir()
    }

    /// The main node of a stream, if it is still alive.
    pub fn main(&self) -> Option<Arc<FileNode>> {
        self.main.as_ref().and_then(Weak::upgrade)
    }

    /// The node that owns EAs, security and timestamps for this one.
    pub fn main_or_self(self: &Arc<Self>) -> Arc<FileNode> {
        self.main().unwrap_or_else(|| Arc::clone(self))
    }

    /// Returns the new open count.
    pub fn open(&self) -> u32 {
        self.open_count.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Returns the new open count. Never goes below zero.
    pub fn close(&self) -> u32 {
        let previous = self
            .open_count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                Some(n.saturating_sub(1))
            })
            .unwrap_or(0);
        previous.saturating_sub(1)
    }

    pub fn open_count(&self) -> u32 {
        self.open_count.load(Ordering::Acquire)
    }

    /// Metadata as the caller sees it.
    ///
    /// For a stream this is the main node's info with the directory bit
    /// cleared and the stream's own sizes substituted.
    pub fn file_info(&self) -> FileInfo {
        let own = self.state.lock().info.clone();
        let Some(main) = self.main() else {
            return own;
        };
        let mut info = main.lock().info.clone();
        info.file_attributes.remove(FileAttributes::DIRECTORY);
        info.allocation_size = own.allocation_size;
        info.file_size = own.file_size;
        info
    }
}
