//! Path-addressed in-memory filesystem.
//!
//! Key components:
//!
//! - [`FileSystemOps`] - The operation set a dispatcher calls
//! - [`NamespaceIndex`] - Ordered path index answering hierarchy queries
//! - [`FileNode`] - One file, directory or named stream
//! - [`MemFs`] - The engine tying them together
//!
//! ## Design Decisions
//!
//! - **Hierarchy by range scan**: parents, children, streams and subtrees
//!   are derived from path prefixes over one ordered map, never from
//!   pointers between nodes.
//! - **Handles are nodes**: a handle is a shared reference to its node, so
//!   rename rewrites the node's path and every open handle follows.
//! - **Deletion at cleanup**: nodes leave the index only in `cleanup` with
//!   the delete flag, never in `close`.

mod index;
mod memfs;
mod node;
mod ops;
pub mod path;

pub use index::{NamespaceIndex, NodeTree};
pub use memfs::{FileHandle, MemFs};
pub use node::{FileNode, NodeState, SizeLimits};
pub use ops::{FileSystemOps, Opened};
