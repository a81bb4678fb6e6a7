//! Ordered path index.
//!
//! Hierarchy is never stored as pointers. Children, streams and subtrees
//! are all range scans over one `BTreeMap` keyed by the (optionally
//! case-folded) path. `\` is followed in byte order by `]` and `:` by `;`,
//! so `[X\, X])` holds everything under `X` and `[X:, X;)` holds its
//! streams.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use memfs_types::{FsError, FsResult, filetime_now};

use super::node::FileNode;
use super::path::{self, SEPARATOR, STREAM_SEPARATOR};

const CHILD_GUARD: char = ']';
const STREAM_GUARD: char = ';';

/// The set of all nodes, keyed by path.
#[derive(Debug)]
pub struct NodeTree {
    case_insensitive: bool,
    nodes: BTreeMap<String, Arc<FileNode>>,
}

impl NodeTree {
    pub fn new(case_insensitive: bool) -> Self {
        Self {
            case_insensitive,
            nodes: BTreeMap::new(),
        }
    }

    /// Comparison key for `path`.
    pub fn key(&self, path: &str) -> String {
        if self.case_insensitive {
            path.chars().flat_map(char::to_uppercase).collect()
        } else {
            path.to_string()
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<Arc<FileNode>> {
        self.nodes.get(&self.key(path)).cloned()
    }

    /// The node named before the `:` of a stream path.
    pub fn get_main(&self, path: &str) -> Option<Arc<FileNode>> {
        let (main, _) = path::split_stream(path)?;
        self.get(main)
    }

    pub fn get_parent(&self, path: &str) -> FsResult<Arc<FileNode>> {
        let parent = path::parent_path(path)
            .ok_or_else(|| FsError::invalid_parameter("the root has no parent"))?;
        match self.get(parent) {
            None => Err(FsError::path_not_found(path)),
            Some(node) if !node.is_directory() => Err(FsError::not_a_directory(path)),
            Some(node) => Ok(node),
        }
    }

    /// Insert `node` under its current path and touch its parent.
    pub fn insert(&mut self, node: Arc<FileNode>) -> FsResult<()> {
        let node_path = node.path();
        let key = self.key(&node_path);
        if self.nodes.contains_key(&key) {
            return Err(FsError::name_collision(node_path));
        }
        self.nodes.insert(key, node);
        self.touch_parent(&node_path);
        Ok(())
    }

    /// Remove the node at `path`; a no-op if there is none.
    pub fn remove(&mut self, path: &str) -> Option<Arc<FileNode>> {
        let removed = self.nodes.remove(&self.key(path))?;
        self.touch_parent(path);
        Some(removed)
    }

    fn touch_parent(&self, path: &str) {
        let Some(parent) = path::parent_path(path).and_then(|p| self.get(p)) else {
            return;
        };
        parent.lock().info.touch(filetime_now());
    }

    /// Direct children of the directory at `path`, in key order, resuming
    /// strictly after the leaf name `marker`.
    pub fn children_of<'a>(
        &'a self,
        path: &str,
        marker: Option<&str>,
    ) -> impl Iterator<Item = &'a Arc<FileNode>> + use<'a> {
        let (prefix, upper) = if path::is_root(path) {
            (path::ROOT.to_string(), CHILD_GUARD.to_string())
        } else {
            let key = self.key(path);
            (format!("{key}{SEPARATOR}"), format!("{key}{CHILD_GUARD}"))
        };
        let prefix_len = prefix.len();
        let lower = match marker {
            Some(marker) => Bound::Excluded(format!("{prefix}{}", self.key(marker))),
            None => Bound::Included(prefix),
        };
        self.nodes
            .range::<String, _>((lower, Bound::Excluded(upper)))
            .filter(move |(key, _)| {
                let rest = &key[prefix_len..];
                !rest.is_empty() && !rest.contains([SEPARATOR, STREAM_SEPARATOR])
            })
            .map(|(_, node)| node)
    }

    /// Named streams of the node at `path`.
    pub fn streams_of<'a>(
        &'a self,
        path: &str,
    ) -> impl Iterator<Item = &'a Arc<FileNode>> + use<'a> {
        let key = self.key(path);
        let lower = format!("{key}{STREAM_SEPARATOR}");
        let upper = format!("{key}{STREAM_GUARD}");
        self.nodes
            .range::<String, _>((Bound::Excluded(lower), Bound::Excluded(upper)))
            .map(|(_, node)| node)
    }

    /// The node at `path`, then its streams, then everything nested below.
    pub fn descendants_of<'a>(
        &'a self,
        path: &str,
    ) -> Box<dyn Iterator<Item = &'a Arc<FileNode>> + 'a> {
        if path::is_root(path) {
            return Box::new(self.nodes.values());
        }
        let key = self.key(path);
        let this = self.nodes.get(&key);
        let subtree = self
            .nodes
            .range::<String, _>((
                Bound::Excluded(format!("{key}{SEPARATOR}")),
                Bound::Excluded(format!("{key}{CHILD_GUARD}")),
            ))
            .map(|(_, node)| node);
        Box::new(this.into_iter().chain(self.streams_of(path)).chain(subtree))
    }

    pub fn has_child(&self, path: &str) -> bool {
        self.children_of(path, None).next().is_some()
    }
}

/// Thread-safe handle on the [`NodeTree`].
///
/// Take the lock before any node lock, and hold at most one node lock
/// while holding it.
#[derive(Debug)]
pub struct NamespaceIndex {
    tree: Mutex<NodeTree>,
}

impl NamespaceIndex {
    pub fn new(case_insensitive: bool) -> Self {
        Self {
            tree: Mutex::new(NodeTree::new(case_insensitive)),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, NodeTree> {
        self.tree.lock()
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use memfs_types::{FileAttributes, FileInfo};

    fn add(tree: &mut NodeTree, path: &str, dir: bool) -> Arc<FileNode> {
        let attrs = if dir {
            FileAttributes::DIRECTORY
        } else {
            FileAttributes::ARCHIVE
        };
        let main = tree.get_main(path);
        let node = Arc::new(FileNode::new(
            path,
            FileInfo::new(attrs, tree.len() as u64 + 1, 0),
            Vec::new(),
            main.as_ref(),
        ));
        tree.insert(Arc::clone(&node)).unwrap();
        node
    }

    fn sample(case_insensitive: bool) -> NodeTree {
        let mut tree = NodeTree::new(case_insensitive);
        add(&mut tree, "\\", true);
        add(&mut tree, "\\a", true);
        add(&mut tree, "\\a\\b.txt", false);
        add(&mut tree, "\\a\\b.txt:meta", false);
        add(&mut tree, "\\a\\c", true);
        add(&mut tree, "\\a\\c\\d", false);
        add(&mut tree, "\\a!", false);
        add(&mut tree, "\\a:s", false);
        add(&mut tree, "\\z", false);
        tree
    }

    fn paths<'a>(nodes: impl Iterator<Item = &'a Arc<FileNode>>) -> Vec<String> {
        nodes.map(|n| n.path()).collect()
    }

    #[test]
    fn test_children_of() {
        let tree = sample(false);
        assert_eq!(
            paths(tree.children_of("\\a", None)),
            vec!["\\a\\b.txt", "\\a\\c"]
        );
        assert_eq!(paths(tree.children_of("\\a", Some("b.txt"))), vec!["\\a\\c"]);
        assert_eq!(
            paths(tree.children_of("\\", None)),
            vec!["\\a", "\\a!", "\\z"]
        );
        assert!(tree.children_of("\\a\\c\\d", None).next().is_none());
    }

    #[test]
    fn test_streams_of() {
        let tree = sample(false);
        assert_eq!(paths(tree.streams_of("\\a\\b.txt")), vec!["\\a\\b.txt:meta"]);
        assert_eq!(paths(tree.streams_of("\\a")), vec!["\\a:s"]);
        assert!(tree.streams_of("\\a\\c").next().is_none());
    }

    #[test]
    fn test_descendants_of() {
        let tree = sample(false);
        assert_eq!(
            paths(tree.descendants_of("\\a")),
            vec![
                "\\a",
                "\\a:s",
                "\\a\\b.txt",
                "\\a\\b.txt:meta",
                "\\a\\c",
                "\\a\\c\\d"
            ]
        );
        assert_eq!(tree.descendants_of("\\").count(), tree.len());
    }

    #[test]
    fn test_get_parent_errors() {
        let tree = sample(false);
        assert!(tree.get_parent("\\a\\x").is_ok());
        assert!(matches!(
            tree.get_parent("\\nope\\x"),
            Err(FsError::PathNotFound(_))
        ));
        assert!(matches!(
            tree.get_parent("\\z\\x"),
            Err(FsError::NotADirectory(_))
        ));
        assert!(tree.get_parent("\\").is_err());
    }

    #[test]
    fn test_insert_duplicate_and_remove() {
        let mut tree = sample(false);
        let dup = Arc::new(FileNode::new(
            "\\z",
            FileInfo::default(),
            Vec::new(),
            None,
        ));
        assert!(matches!(tree.insert(dup), Err(FsError::NameCollision(_))));

        let before = tree.len();
        assert!(tree.remove("\\z").is_some());
        assert!(tree.remove("\\z").is_none());
        assert_eq!(tree.len(), before - 1);
    }

    #[test]
    fn test_insert_touches_parent() {
        let mut tree = sample(false);
        let parent = tree.get("\\a\\c").unwrap();
        parent.lock().info.last_write_time = 0;
        add(&mut tree, "\\a\\c\\e", false);
        assert!(parent.lock().info.last_write_time > 0);
    }

    #[test]
    fn test_case_insensitive_lookup_keeps_stored_case() {
        let mut tree = NodeTree::new(true);
        add(&mut tree, "\\", true);
        add(&mut tree, "\\Dir", true);
        add(&mut tree, "\\Dir\\File", false);

        let node = tree.get("\\DIR\\file").unwrap();
        assert_eq!(node.path(), "\\Dir\\File");
        assert_eq!(paths(tree.children_of("\\dir", None)), vec!["\\Dir\\File"]);
        assert!(tree.children_of("\\dir", Some("FILE")).next().is_none());
        assert!(tree.has_child("\\DIR"));
    }

    #[test]
    fn test_case_sensitive_distinguishes() {
        let tree = sample(false);
        assert!(tree.get("\\A").is_none());
        assert!(tree.get("\\a").is_some());
    }

    #[test]
    fn test_get_main() {
        let tree = sample(false);
        assert_eq!(tree.get_main("\\a\\b.txt:meta").unwrap().path(), "\\a\\b.txt");
        assert!(tree.get_main("\\a\\b.txt").is_none());
    }
}
