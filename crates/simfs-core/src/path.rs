//! Path resolution against the directory tree.
//!
//! Paths are `/`-separated. A leading `/` anchors the walk at the root;
//! anything else starts from the caller's base directory. Empty segments are
//! ignored, and `.`/`..` are resolved through the reserved directory entries
//! rather than textually.

use crate::directory::DirectoryTree;
use crate::types::InodeId;
use log::trace;

pub struct PathResolver<'a> {
    tree: &'a DirectoryTree,
    root: InodeId,
}

impl<'a> PathResolver<'a> {
    pub fn new(tree: &'a DirectoryTree, root: InodeId) -> Self {
        Self { tree, root }
    }

    /// Walks `path` from the root (absolute) or from `base` (relative).
    ///
    /// Every segment but the last must name a directory; the last may name
    /// anything. Returns `None` as soon as a lookup fails.
    pub fn resolve(&self, path: &str, base: InodeId) -> Option<InodeId> {
        let mut current = if is_absolute(path) { self.root } else { base };
        for segment in segments(path) {
            // A file has no entry list, so lookups through it fail here.
            let next = self.tree.lookup(current, segment)?;
            trace!("resolve {:?}: {} -> {} via '{}'", path, current, next, segment);
            current = next;
        }
        Some(current)
    }
}

pub fn is_absolute(path: &str) -> bool {
    path.starts_with('/')
}

/// Non-empty `/`-separated components of `path`.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// A path split into the directory that holds the leaf and the leaf name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitPath<'a> {
    /// Resolves relative to the working directory when empty.
    pub parent: &'a str,
    pub leaf: &'a str,
}

/// Splits off the last component. Trailing slashes are ignored, so
/// `/a/b/` splits into `/a` and `b`. The leaf is empty for `/` and ``.
pub fn split_parent_and_leaf(path: &str) -> SplitPath<'_> {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(0) => SplitPath {
            parent: "/",
            leaf: &trimmed[1..],
        },
        Some(i) => SplitPath {
            parent: &trimmed[..i],
            leaf: &trimmed[i + 1..],
        },
        None if trimmed.is_empty() && is_absolute(path) => SplitPath {
            parent: "/",
            leaf: "",
        },
        None => SplitPath {
            parent: "",
            leaf: trimmed,
        },
    }
}
