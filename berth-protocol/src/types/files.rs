use std::fmt;

use serde::{Deserialize, Serialize};

// ==================== Project ====================

/// Identifier of a project in the host's registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub u64);

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ProjectId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

// ==================== File Tree ====================

/// One entry of a project's file tree
///
/// `path` is relative to the project root and '/'-separated. `children` is
/// `None` for files and for directories whose contents were not listed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileNode {
    pub name: String,
    pub path: String,
    pub is_directory: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<FileNode>>,
}

impl FileNode {
    /// Create a file node under `parent` (root when `None`)
    pub fn file(parent: Option<&str>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            path: join_path(parent, &name),
            name,
            is_directory: false,
            children: None,
        }
    }

    /// Create a directory node under `parent` with the given children
    pub fn directory(
        parent: Option<&str>,
        name: impl Into<String>,
        children: Vec<FileNode>,
    ) -> Self {
        let name = name.into();
        Self {
            path: join_path(parent, &name),
            name,
            is_directory: true,
            children: Some(children),
        }
    }

    /// Whether this directory's children have been fetched
    pub fn is_populated(&self) -> bool {
        self.children.is_some()
    }

    /// Number of nodes in this subtree, including self
    pub fn count(&self) -> usize {
        1 + self
            .children
            .as_deref()
            .map(|c| c.iter().map(FileNode::count).sum())
            .unwrap_or(0)
    }

    /// Check the path/name invariants for this subtree
    ///
    /// Every child's path must equal the parent's path plus '/' plus its
    /// name, and no two siblings may share a name.
    pub fn is_consistent(&self) -> bool {
        let Some(children) = self.children.as_deref() else {
            return true;
        };
        if !self.is_directory {
            return false;
        }
        let mut seen = std::collections::HashSet::new();
        children.iter().all(|child| {
            seen.insert(child.name.as_str())
                && child.path == join_path(Some(&self.path), &child.name)
                && child.is_consistent()
        })
    }
}

// ==================== Path Helpers ====================

/// Compose a root-relative path from an optional parent and a name
///
/// An absent or empty parent yields the bare name.
pub fn join_path(parent: Option<&str>, name: &str) -> String {
    match parent.map(|p| p.trim_end_matches('/')) {
        Some(parent) if !parent.is_empty() => format!("{}/{}", parent, name),
        _ => name.to_string(),
    }
}

/// Parent directory of a path, `None` for root-level entries
pub fn parent_path(path: &str) -> Option<&str> {
    path.rsplit_once('/').map(|(parent, _)| parent)
}

/// Final segment of a path
pub fn file_name(path: &str) -> &str {
    path.rsplit_once('/').map(|(_, name)| name).unwrap_or(path)
}

/// Path of a sibling entry named `new_name`
///
/// The parent portion of `path` is preserved verbatim.
pub fn sibling_path(path: &str, new_name: &str) -> String {
    join_path(parent_path(path), new_name)
}

/// Whether `path` is `ancestor` itself or lies beneath it
pub fn is_within(path: &str, ancestor: &str) -> bool {
    path == ancestor
        || (path.len() > ancestor.len()
            && path.starts_with(ancestor)
            && path.as_bytes()[ancestor.len()] == b'/')
}

/// Move `path` from under `old_prefix` to under `new_prefix`
///
/// Returns `None` when `path` is not within `old_prefix`.
pub fn rebase_path(path: &str, old_prefix: &str, new_prefix: &str) -> Option<String> {
    if !is_within(path, old_prefix) {
        return None;
    }
    Some(format!("{}{}", new_prefix, &path[old_prefix.len()..]))
}
