//! In-memory filesystem engine.
//!
//! All data is ephemeral. One [`NamespaceIndex`] owns every node; handles
//! are shared references to nodes, so a handle survives rename and
//! deletion of its path.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::{debug, trace, warn};

use memfs_types::reparse::{can_replace, reparse_tag};
use memfs_types::{
    BasicInfo, CleanupFlags, CreateExtra, CreateOptions, CreateRequest, DirEntry, EaEntry,
    FileAttributes, FileInfo, FsError, FsResult, NameLookup, StreamEntry, VolumeInfo, Written,
    filetime_now,
};

use super::index::{NamespaceIndex, NodeTree};
use super::node::{FileNode, SizeLimits};
use super::ops::{FileSystemOps, Opened};
use super::path;
use crate::config::{ConfigError, MemFsConfig};

/// Longest volume label, in UTF-16 code units.
const MAX_VOLUME_LABEL_UNITS: usize = 32;

/// Index number of the root directory.
const ROOT_INDEX_NUMBER: u64 = 1;

/// An open reference to one node.
#[derive(Debug, Clone)]
pub struct FileHandle(Arc<FileNode>);

impl FileHandle {
    pub fn node(&self) -> &Arc<FileNode> {
        &self.0
    }

    /// The node's current path. Follows renames.
    pub fn path(&self) -> String {
        self.0.path()
    }

    pub fn same_node(&self, other: &FileHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// In-memory filesystem.
///
/// Thread-safe. The index lock is taken before any node lock, and no code
/// path holds two node locks at once.
#[derive(Debug)]
pub struct MemFs {
    config: MemFsConfig,
    limits: SizeLimits,
    index: NamespaceIndex,
    next_index_number: AtomicU64,
    volume_label: RwLock<String>,
}

impl MemFs {
    /// Create an engine holding only the root directory.
    pub fn new(config: MemFsConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let limits = SizeLimits {
            max_file_size: config.max_file_size,
            allocation_unit: config.allocation_unit(),
        };
        let index = NamespaceIndex::new(config.case_insensitive);
        let root = Arc::new(FileNode::new(
            path::ROOT,
            FileInfo::new(FileAttributes::DIRECTORY, ROOT_INDEX_NUMBER, filetime_now()),
            config.root_security.clone(),
            None,
        ));
        index
            .lock()
            .insert(root)
            .map_err(|err| ConfigError::Invalid(err.to_string()))?;

        debug!(
            case_insensitive = config.case_insensitive,
            max_file_nodes = config.max_file_nodes,
            max_file_size = config.max_file_size,
            "memfs created"
        );
        Ok(Self {
            volume_label: RwLock::new(truncate_label(&config.volume_label)),
            limits,
            index,
            next_index_number: AtomicU64::new(ROOT_INDEX_NUMBER + 1),
            config,
        })
    }

    pub fn index(&self) -> &NamespaceIndex {
        &self.index
    }

    /// Number of nodes, root included.
    pub fn node_count(&self) -> usize {
        self.index.lock().len()
    }

    fn next_index_number(&self) -> u64 {
        self.next_index_number.fetch_add(1, Ordering::Relaxed)
    }

    /// True if some existing ancestor of `path` is a reparse point.
    fn has_reparse_ancestor(tree: &NodeTree, path: &str) -> bool {
        let mut current = path::parent_path(path);
        while let Some(ancestor) = current {
            if let Some(node) = tree.get(ancestor) {
                if node.lock().info.is_reparse_point() {
                    return true;
                }
            }
            current = path::parent_path(ancestor);
        }
        false
    }

    /// True if `node` itself, not a later node with the same name, is
    /// indexed under its path.
    fn is_indexed(tree: &NodeTree, node: &Arc<FileNode>) -> bool {
        tree.get(&node.path())
            .is_some_and(|indexed| Arc::ptr_eq(&indexed, node))
    }

    /// Remove `node` if it is still indexed under its own path.
    fn remove_node(tree: &mut NodeTree, node: &Arc<FileNode>) -> Option<String> {
        if !Self::is_indexed(tree, node) {
            return None;
        }
        let node_path = node.path();
        tree.remove(&node_path);
        Some(node_path)
    }

    /// Remove every named stream of `path` that nobody has open.
    fn remove_idle_streams(tree: &mut NodeTree, path: &str) {
        let idle: Vec<String> = tree
            .streams_of(path)
            .filter(|stream| stream.open_count() == 0)
            .map(|stream| stream.path())
            .collect();
        for stream in idle {
            tree.remove(&stream);
            trace!(path = %stream, "removed idle stream");
        }
    }
}

fn truncate_label(label: &str) -> String {
    let mut units = 0;
    label
        .chars()
        .take_while(|c| {
            units += c.len_utf16();
            units <= MAX_VOLUME_LABEL_UNITS
        })
        .collect()
}

impl FileSystemOps for MemFs {
    type Handle = FileHandle;

    fn get_volume_info(&self) -> FsResult<VolumeInfo> {
        let max_nodes = self.config.max_file_nodes as u64;
        let used_nodes = self.index.lock().len() as u64;
        Ok(VolumeInfo {
            total_size: max_nodes.saturating_mul(self.config.max_file_size),
            free_size: max_nodes
                .saturating_sub(used_nodes)
                .saturating_mul(self.config.max_file_size),
            volume_label: self.volume_label.read().clone(),
        })
    }

    fn set_volume_label(&self, label: &str) -> FsResult<VolumeInfo> {
        *self.volume_label.write() = truncate_label(label);
        self.get_volume_info()
    }

    fn get_security_by_name(&self, path: &str) -> FsResult<NameLookup> {
        path::validate(path)?;
        let tree = self.index.lock();
        let Some(node) = tree.get(path) else {
            if Self::has_reparse_ancestor(&tree, path) {
                return Ok(NameLookup::Reparse);
            }
            tree.get_parent(path)?;
            return Err(FsError::not_found(path));
        };
        let file_attributes = node.file_info().file_attributes;
        let security = node.main_or_self().lock().security.clone();
        Ok(NameLookup::Found {
            file_attributes,
            security,
        })
    }

    fn create(&self, path: &str, request: CreateRequest) -> FsResult<Opened<FileHandle>> {
        path::validate(path)?;
        if path::is_root(path) {
            return Err(FsError::name_collision(path));
        }
        let is_directory = request.is_directory();
        let (ea, reparse) = match request.extra {
            Some(CreateExtra::Ea(entries)) => (entries, None),
            Some(CreateExtra::Reparse(buffer)) => (Vec::new(), Some(buffer)),
            None => (Vec::new(), None),
        };

        let mut tree = self.index.lock();
        if tree.get(path).is_some() {
            return Err(FsError::name_collision(path));
        }
        let parent = tree.get_parent(path)?;

        let main = match path::split_stream(path) {
            Some((main_path, _)) => {
                let main = tree
                    .get(main_path)
                    .ok_or_else(|| FsError::not_found(path))?;
                if is_directory {
                    return Err(FsError::invalid_parameter(format!(
                        "named stream {path} cannot be a directory"
                    )));
                }
                if reparse.is_some() {
                    return Err(FsError::invalid_parameter(format!(
                        "named stream {path} cannot be a reparse point"
                    )));
                }
                Some(main)
            }
            None => None,
        };

        let allocation_size = if is_directory {
            0
        } else {
            request.allocation_size
        };
        if tree.len() >= self.config.max_file_nodes {
            warn!(path = %path, nodes = tree.len(), "node limit reached");
            return Err(FsError::DiskFull);
        }
        if allocation_size > self.config.max_file_size {
            return Err(FsError::DiskFull);
        }
        for entry in &ea {
            entry.validate()?;
        }
        if let Some(buffer) = &reparse {
            reparse_tag(buffer)?;
        }

        let normalized_path = match (&main, path::split_stream(path)) {
            (Some(main), Some((_, stream))) => {
                format!("{}{}{stream}", main.path(), path::STREAM_SEPARATOR)
            }
            _ => path::join(&parent.path(), path::leaf_name(path)),
        };

        let mut file_attributes = request.file_attributes;
        if is_directory {
            file_attributes |= FileAttributes::DIRECTORY;
        } else {
            file_attributes.remove(FileAttributes::DIRECTORY);
            file_attributes |= FileAttributes::ARCHIVE;
        }

        let node = Arc::new(FileNode::new(
            normalized_path.clone(),
            FileInfo::new(file_attributes, self.next_index_number(), filetime_now()),
            request.security,
            main.as_ref(),
        ));
        {
            let mut state = node.lock();
            state.set_allocation_size(allocation_size, &self.limits)?;
            if let Some(buffer) = reparse {
                state.set_reparse_data(buffer)?;
            }
        }
        if !ea.is_empty() {
            let owner = node.main_or_self();
            let mut state = owner.lock();
            for entry in &ea {
                state.set_ea(entry)?;
            }
        }

        tree.insert(Arc::clone(&node))?;
        node.open();
        drop(tree);

        debug!(path = %normalized_path, directory = is_directory, "created");
        Ok(Opened {
            info: node.file_info(),
            handle: FileHandle(node),
            normalized_path,
        })
    }

    fn open(&self, path: &str, create_options: CreateOptions) -> FsResult<Opened<FileHandle>> {
        path::validate(path)?;
        let tree = self.index.lock();
        let Some(node) = tree.get(path) else {
            if !path::is_root(path) {
                tree.get_parent(path)?;
            }
            return Err(FsError::not_found(path));
        };
        if create_options.contains(CreateOptions::NO_EA_KNOWLEDGE)
            && !node.is_stream()
            && node.lock().needs_ea()
        {
            return Err(FsError::access_denied(path));
        }
        let open_count = node.open();
        drop(tree);

        let normalized_path = node.path();
        trace!(path = %normalized_path, open_count, "opened");
        Ok(Opened {
            info: node.file_info(),
            handle: FileHandle(node),
            normalized_path,
        })
    }

    fn overwrite(
        &self,
        handle: &FileHandle,
        file_attributes: FileAttributes,
        replace_attributes: bool,
        allocation_size: u64,
        ea: Option<&[EaEntry]>,
    ) -> FsResult<FileInfo> {
        let node = handle.node();
        if allocation_size > self.config.max_file_size {
            return Err(FsError::DiskFull);
        }
        for entry in ea.unwrap_or_default() {
            entry.validate()?;
        }

        let mut tree = self.index.lock();
        let node_path = node.path();
        Self::remove_idle_streams(&mut tree, &node_path);

        if !node.is_stream() || ea.is_some() {
            let owner = node.main_or_self();
            let mut state = owner.lock();
            if !node.is_stream() {
                state.clear_ea();
            }
            for entry in ea.unwrap_or_default() {
                state.set_ea(entry)?;
            }
        }

        {
            let mut state = node.lock();
            state.set_allocation_size(allocation_size, &self.limits)?;
            let attributes = file_attributes | FileAttributes::ARCHIVE;
            if replace_attributes {
                state.info.file_attributes = attributes;
            } else {
                state.info.file_attributes |= attributes;
            }
            state.info.file_size = 0;
            state.info.touch(filetime_now());
        }
        drop(tree);

        debug!(path = %node_path, "overwritten");
        Ok(node.file_info())
    }

    fn cleanup(&self, handle: &FileHandle, flags: CleanupFlags) {
        let node = handle.node();
        let now = filetime_now();

        {
            let owner = node.main_or_self();
            let mut state = owner.lock();
            if flags.contains(CleanupFlags::SET_ARCHIVE_BIT) && !state.info.is_dir() {
                state.info.file_attributes |= FileAttributes::ARCHIVE;
            }
            if flags.contains(CleanupFlags::SET_LAST_ACCESS_TIME) {
                state.info.last_access_time = now;
            }
            if flags.contains(CleanupFlags::SET_LAST_WRITE_TIME) {
                state.info.last_write_time = now;
            }
            if flags.contains(CleanupFlags::SET_CHANGE_TIME) {
                state.info.change_time = now;
            }
        }

        if flags.contains(CleanupFlags::SET_ALLOCATION_SIZE) {
            let mut state = node.lock();
            let result = self
                .limits
                .round_up(state.info.file_size)
                .and_then(|allocation| state.set_allocation_size(allocation, &self.limits));
            if let Err(err) = result {
                warn!(path = %state.path, error = %err, "cleanup could not trim allocation");
            }
        }

        if flags.contains(CleanupFlags::DELETE) {
            let mut tree = self.index.lock();
            let node_path = node.path();
            if path::is_root(&node_path) {
                warn!("refusing to delete the root");
                return;
            }
            if tree.has_child(&node_path) {
                debug!(path = %node_path, "delete skipped, directory not empty");
                return;
            }
            Self::remove_idle_streams(&mut tree, &node_path);
            if Self::remove_node(&mut tree, node).is_some() {
                debug!(path = %node_path, "deleted");
            }
        }
    }

    fn close(&self, handle: FileHandle) {
        let open_count = handle.node().close();
        trace!(path = %handle.path(), open_count, "closed");
    }

    fn read(&self, handle: &FileHandle, offset: u64, length: u32) -> FsResult<Vec<u8>> {
        let state = handle.node().lock();
        let file_size = state.info.file_size;
        if offset >= file_size {
            return Err(FsError::EndOfFile);
        }
        let end = offset.saturating_add(u64::from(length)).min(file_size);
        Ok(state.contents()[offset as usize..end as usize].to_vec())
    }

    fn write(
        &self,
        handle: &FileHandle,
        offset: u64,
        data: &[u8],
        write_to_end_of_file: bool,
        constrained_io: bool,
    ) -> FsResult<Written> {
        let node = handle.node();
        let length = u32::try_from(data.len())
            .map_err(|_| FsError::invalid_parameter("write larger than 4 GiB"))?;

        let bytes_written = {
            let mut state = node.lock();
            if state.data.is_none() {
                return Err(FsError::invalid_parameter(format!(
                    "{} is a directory",
                    state.path
                )));
            }
            let file_size = state.info.file_size;
            let (offset, end) = if constrained_io {
                if offset >= file_size {
                    (offset, offset)
                } else {
                    (offset, offset.saturating_add(u64::from(length)).min(file_size))
                }
            } else {
                let offset = if write_to_end_of_file { file_size } else { offset };
                let end = offset
                    .checked_add(u64::from(length))
                    .ok_or(FsError::DiskFull)?;
                if end > file_size {
                    state.set_file_size(end, false, &self.limits)?;
                }
                (offset, end)
            };
            let count = (end - offset) as usize;
            if count > 0 {
                if let Some(buffer) = state.data.as_mut() {
                    buffer[offset as usize..end as usize].copy_from_slice(&data[..count]);
                }
            }
            count as u32
        };

        Ok(Written {
            bytes_written,
            info: node.file_info(),
        })
    }

    fn flush(&self, handle: Option<&FileHandle>) -> FsResult<Option<FileInfo>> {
        Ok(handle.map(|handle| handle.node().file_info()))
    }

    fn get_file_info(&self, handle: &FileHandle) -> FsResult<FileInfo> {
        Ok(handle.node().file_info())
    }

    fn set_basic_info(&self, handle: &FileHandle, basic: BasicInfo) -> FsResult<FileInfo> {
        let node = handle.node();
        {
            let owner = node.main_or_self();
            let mut state = owner.lock();
            let directory = state.info.file_attributes & FileAttributes::DIRECTORY;
            basic.apply(&mut state.info);
            state.info.file_attributes.remove(FileAttributes::DIRECTORY);
            state.info.file_attributes |= directory;
        }
        Ok(node.file_info())
    }

    fn set_file_size(
        &self,
        handle: &FileHandle,
        new_size: u64,
        set_allocation: bool,
    ) -> FsResult<FileInfo> {
        let node = handle.node();
        node.lock()
            .set_file_size(new_size, set_allocation, &self.limits)?;
        Ok(node.file_info())
    }

    fn get_security(&self, handle: &FileHandle) -> FsResult<Vec<u8>> {
        Ok(handle.node().main_or_self().lock().security.clone())
    }

    fn set_security(&self, handle: &FileHandle, security: &[u8]) -> FsResult<()> {
        handle.node().main_or_self().lock().security = security.to_vec();
        Ok(())
    }

    fn can_delete(&self, handle: &FileHandle) -> FsResult<()> {
        let tree = self.index.lock();
        let node_path = handle.path();
        if path::is_root(&node_path) {
            return Err(FsError::access_denied(node_path));
        }
        if Self::is_indexed(&tree, handle.node()) && tree.has_child(&node_path) {
            return Err(FsError::directory_not_empty(node_path));
        }
        Ok(())
    }

    fn rename(
        &self,
        handle: &FileHandle,
        old_path: &str,
        new_path: &str,
        replace_if_exists: bool,
    ) -> FsResult<()> {
        path::validate(new_path)?;
        let node = handle.node();
        let mut tree = self.index.lock();
        let current = node.path();
        if tree.key(old_path) != tree.key(&current) || !Self::is_indexed(&tree, node) {
            return Err(FsError::not_found(old_path));
        }
        if path::is_root(&current) || path::is_root(new_path) {
            return Err(FsError::invalid_parameter("cannot rename the root"));
        }

        let target = tree
            .get(new_path)
            .filter(|target| !Arc::ptr_eq(target, node));
        if let Some(target) = &target {
            if target.is_directory() {
                return Err(FsError::access_denied(new_path));
            }
            if !replace_if_exists {
                return Err(FsError::name_collision(new_path));
            }
        }
        tree.get_parent(new_path)?;

        let old_key = tree.key(&current);
        let new_key = tree.key(new_path);
        if new_key.starts_with(&format!("{old_key}{}", path::SEPARATOR))
            || new_key.starts_with(&format!("{old_key}{}", path::STREAM_SEPARATOR))
        {
            return Err(FsError::invalid_parameter(format!(
                "cannot move {current} under itself"
            )));
        }
        match (path::split_stream(&current), path::split_stream(new_path)) {
            (None, None) => {}
            (Some((old_main, _)), Some((new_main, _)))
                if tree.key(old_main) == tree.key(new_main) => {}
            _ => {
                return Err(FsError::invalid_parameter(format!(
                    "cannot rename {current} to {new_path} across stream boundaries"
                )));
            }
        }

        let mut doomed: Vec<Arc<FileNode>> = Vec::new();
        if let Some(target) = &target {
            let target_path = target.path();
            doomed.extend(tree.streams_of(&target_path).cloned());
            doomed.push(Arc::clone(target));
        }
        let moved: Vec<Arc<FileNode>> = tree.descendants_of(&current).cloned().collect();
        let relocated: Vec<String> = moved
            .iter()
            .map(|n| {
                let suffix = n.path().get(current.len()..).unwrap_or_default().to_string();
                format!("{new_path}{suffix}")
            })
            .collect();

        // An open stream can outlive its main node and still hold a name.
        for new in &relocated {
            if let Some(existing) = tree.get(new) {
                let expected = moved
                    .iter()
                    .chain(doomed.iter())
                    .any(|n| Arc::ptr_eq(n, &existing));
                if !expected {
                    return Err(FsError::name_collision(new.clone()));
                }
            }
        }

        for gone in &doomed {
            let gone_path = gone.path();
            tree.remove(&gone_path);
            trace!(path = %gone_path, "replaced by rename");
        }
        for n in &moved {
            tree.remove(&n.path());
        }
        for (n, new) in moved.iter().zip(relocated) {
            n.lock().path = new;
        }
        for n in moved {
            tree.insert(n)?;
        }
        drop(tree);

        debug!(from = %current, to = %new_path, "renamed");
        Ok(())
    }

    fn read_directory(
        &self,
        handle: &FileHandle,
        marker: Option<&str>,
    ) -> FsResult<Vec<DirEntry>> {
        let node = handle.node();
        let tree = self.index.lock();
        let dir_path = node.path();
        if !node.is_directory() {
            return Err(FsError::not_a_directory(dir_path));
        }
        // A deleted directory lists nothing, even if its name was reused.
        if !Self::is_indexed(&tree, node) {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        let mut child_marker = marker;
        if !path::is_root(&dir_path) {
            let parent_info = || tree.get_parent(&dir_path).map(|parent| parent.file_info());
            match marker {
                None => {
                    entries.push(DirEntry::new(".", node.file_info()));
                    entries.push(DirEntry::new("..", parent_info()?));
                }
                Some(".") => {
                    entries.push(DirEntry::new("..", parent_info()?));
                    child_marker = None;
                }
                Some("..") => child_marker = None,
                Some(_) => {}
            }
        }

        for child in tree.children_of(&dir_path, child_marker) {
            let child_path = child.path();
            entries.push(DirEntry::new(path::leaf_name(&child_path), child.file_info()));
        }
        Ok(entries)
    }

    fn get_dir_info_by_name(&self, handle: &FileHandle, name: &str) -> FsResult<DirEntry> {
        let node = handle.node();
        let tree = self.index.lock();
        let dir_path = node.path();
        if !node.is_directory() {
            return Err(FsError::not_a_directory(dir_path));
        }
        let child_path = path::join(&dir_path, name);
        if name.is_empty()
            || name.contains([path::SEPARATOR, path::STREAM_SEPARATOR])
            || !Self::is_indexed(&tree, node)
        {
            return Err(FsError::not_found(child_path));
        }
        let child = tree
            .get(&child_path)
            .ok_or_else(|| FsError::not_found(&child_path))?;
        let stored = child.path();
        Ok(DirEntry::new(path::leaf_name(&stored), child.file_info()))
    }

    fn get_stream_info(&self, handle: &FileHandle) -> FsResult<Vec<StreamEntry>> {
        let owner = handle.node().main_or_self();
        let tree = self.index.lock();

        let mut streams = Vec::new();
        let owner_path = {
            let state = owner.lock();
            if !state.info.is_dir() {
                streams.push(StreamEntry {
                    name: String::new(),
                    size: state.info.file_size,
                    allocation_size: state.info.allocation_size,
                });
            }
            state.path.clone()
        };
        let named: Vec<&Arc<FileNode>> = if Self::is_indexed(&tree, &owner) {
            tree.streams_of(&owner_path).collect()
        } else {
            Vec::new()
        };
        for stream in named {
            let state = stream.lock();
            let name = path::split_stream(&state.path).map_or("", |(_, name)| name);
            streams.push(StreamEntry {
                name: name.to_string(),
                size: state.info.file_size,
                allocation_size: state.info.allocation_size,
            });
        }
        Ok(streams)
    }

    fn get_reparse_point(&self, handle: &FileHandle) -> FsResult<Vec<u8>> {
        let owner = handle.node().main_or_self();
        let state = owner.lock();
        state
            .reparse_data
            .clone()
            .ok_or_else(|| FsError::not_a_reparse_point(&state.path))
    }

    fn get_reparse_point_by_name(&self, path: &str) -> FsResult<Vec<u8>> {
        path::validate(path)?;
        let node = self
            .index
            .lock()
            .get(path)
            .ok_or_else(|| FsError::not_found(path))?;
        let owner = node.main_or_self();
        let state = owner.lock();
        state
            .reparse_data
            .clone()
            .ok_or_else(|| FsError::not_a_reparse_point(path))
    }

    fn set_reparse_point(&self, handle: &FileHandle, buffer: &[u8]) -> FsResult<()> {
        reparse_tag(buffer)?;
        let owner = handle.node().main_or_self();
        let tree = self.index.lock();
        let owner_path = owner.path();
        if Self::is_indexed(&tree, &owner) && tree.has_child(&owner_path) {
            return Err(FsError::directory_not_empty(owner_path));
        }
        let mut state = owner.lock();
        if let Some(current) = state.reparse_data.as_deref() {
            can_replace(current, buffer)?;
        }
        state.set_reparse_data(buffer.to_vec())?;
        debug!(path = %owner_path, tag = state.info.reparse_tag, "reparse point set");
        Ok(())
    }

    fn delete_reparse_point(&self, handle: &FileHandle, buffer: &[u8]) -> FsResult<()> {
        let owner = handle.node().main_or_self();
        let mut state = owner.lock();
        let Some(current) = state.reparse_data.as_deref() else {
            return Err(FsError::not_a_reparse_point(&state.path));
        };
        can_replace(current, buffer)?;
        state.clear_reparse_data();
        debug!(path = %state.path, "reparse point deleted");
        Ok(())
    }

    fn get_ea(&self, handle: &FileHandle) -> FsResult<Vec<EaEntry>> {
        Ok(handle.node().main_or_self().lock().ea_entries())
    }

    fn set_ea(&self, handle: &FileHandle, entries: &[EaEntry]) -> FsResult<FileInfo> {
        for entry in entries {
            entry.validate()?;
        }
        let node = handle.node();
        {
            let owner = node.main_or_self();
            let mut state = owner.lock();
            for entry in entries {
                state.set_ea(entry)?;
            }
        }
        Ok(node.file_info())
    }
}
