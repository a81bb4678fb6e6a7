//! Path string helpers.
//!
//! Paths are absolute, `\`-separated, and may end in a `:stream` suffix on
//! the last component.

use memfs_types::{FsError, FsResult};

pub const ROOT: &str = "\\";
pub const SEPARATOR: char = '\\';
pub const STREAM_SEPARATOR: char = ':';

pub fn is_root(path: &str) -> bool {
    path == ROOT
}

/// Reject paths the index cannot key consistently.
pub fn validate(path: &str) -> FsResult<()> {
    if is_root(path) {
        return Ok(());
    }
    let Some(rest) = path.strip_prefix(SEPARATOR) else {
        return Err(FsError::invalid_parameter(format!("path is not absolute: {path}")));
    };
    let mut components = rest.split(SEPARATOR).peekable();
    while let Some(component) = components.next() {
        if component.is_empty() {
            return Err(FsError::invalid_parameter(format!("empty component in {path}")));
        }
        let streams = component.matches(STREAM_SEPARATOR).count();
        let is_last = components.peek().is_none();
        if streams > 1 || (streams == 1 && !is_last) {
            return Err(FsError::invalid_parameter(format!("misplaced ':' in {path}")));
        }
        if streams == 1 {
            let (base, name) = component.split_once(STREAM_SEPARATOR).unwrap_or_default();
            if base.is_empty() || name.is_empty() {
                return Err(FsError::invalid_parameter(format!("empty stream part in {path}")));
            }
        }
    }
    Ok(())
}

/// Path with the last `\` component removed; `None` for the root.
pub fn parent_path(path: &str) -> Option<&str> {
    if is_root(path) {
        return None;
    }
    match path.rfind(SEPARATOR) {
        Some(0) => Some(ROOT),
        Some(i) => Some(&path[..i]),
        None => None,
    }
}

/// Last `\` component, stream suffix included.
pub fn leaf_name(path: &str) -> &str {
    match path.rfind(SEPARATOR) {
        Some(i) => &path[i + 1..],
        None => path,
    }
}

/// Split `\dir\file:name` into (`\dir\file`, `name`).
pub fn split_stream(path: &str) -> Option<(&str, &str)> {
    let leaf_start = path.rfind(SEPARATOR).map_or(0, |i| i + 1);
    let offset = path[leaf_start..].find(STREAM_SEPARATOR)?;
    let split = leaf_start + offset;
    Some((&path[..split], &path[split + 1..]))
}

pub fn join(parent: &str, leaf: &str) -> String {
    if is_root(parent) {
        format!("{ROOT}{leaf}")
    } else {
        format!("{parent}{SEPARATOR}{leaf}")
    }
}
