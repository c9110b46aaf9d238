//! Path-addressed edits on a list of root nodes

use berth_protocol::{file_name, is_within, parent_path, rebase_path, FileNode};

use super::expansion::ExpansionSet;
use super::store::TreeRow;

pub(crate) fn find<'a>(nodes: &'a [FileNode], path: &str) -> Option<&'a FileNode> {
    let node = nodes.iter().find(|n| is_within(path, &n.path))?;
    if node.path == path {
        return Some(node);
    }
    find(node.children.as_deref()?, path)
}

pub(crate) fn find_mut<'a>(nodes: &'a mut [FileNode], path: &str) -> Option<&'a mut FileNode> {
    let index = nodes.iter().position(|n| is_within(path, &n.path))?;
    let node = &mut nodes[index];
    if node.path == path {
        return Some(node);
    }
    find_mut(node.children.as_deref_mut()?, path)
}

/// Children list of `parent`, or the roots for `None`
///
/// A directory whose children were never listed gets an empty list.
fn children_of_mut<'a>(
    roots: &'a mut Vec<FileNode>,
    parent: Option<&str>,
) -> Option<&'a mut Vec<FileNode>> {
    match parent {
        None => Some(roots),
        Some(parent) => {
            let node = find_mut(roots, parent)?;
            if !node.is_directory {
                return None;
            }
            Some(node.children.get_or_insert_with(Vec::new))
        }
    }
}

/// Insert `node` under its parent, keeping siblings sorted by name
///
/// Returns `false` if the parent is unknown or a sibling has the same name.
pub(crate) fn insert(roots: &mut Vec<FileNode>, node: FileNode) -> bool {
    let Some(siblings) = children_of_mut(roots, parent_path(&node.path)) else {
        return false;
    };
    match siblings.binary_search_by(|n| n.name.as_str().cmp(&node.name)) {
        Ok(_) => false,
        Err(index) => {
            siblings.insert(index, node);
            true
        }
    }
}

/// Detach the node at `path` with its subtree
pub(crate) fn remove(roots: &mut Vec<FileNode>, path: &str) -> Option<FileNode> {
    let siblings = children_of_mut(roots, parent_path(path))?;
    let index = siblings.iter().position(|n| n.path == path)?;
    Some(siblings.remove(index))
}

/// Move the node at `old` to `new`, rewriting the paths of its subtree
pub(crate) fn rename(roots: &mut Vec<FileNode>, old: &str, new: &str) -> bool {
    if find(roots, new).is_some() {
        return false;
    }
    let Some(mut node) = remove(roots, old) else {
        return false;
    };
    rebase(&mut node, old, new);
    insert(roots, node)
}

fn rebase(node: &mut FileNode, old: &str, new: &str) {
    if let Some(path) = rebase_path(&node.path, old, new) {
        node.path = path;
    }
    node.name = file_name(&node.path).to_string();
    for child in node.children.iter_mut().flatten() {
        rebase(child, old, new);
    }
}

/// Flatten the tree into the rows a file browser shows
pub(crate) fn visible_rows(
    nodes: &[FileNode],
    expanded: &ExpansionSet,
    selected: Option<&str>,
) -> Vec<TreeRow> {
    let mut rows = Vec::new();
    push_rows(nodes, expanded, selected, 0, &mut rows);
    rows
}

fn push_rows(
    nodes: &[FileNode],
    expanded: &ExpansionSet,
    selected: Option<&str>,
    depth: usize,
    rows: &mut Vec<TreeRow>,
) {
    for node in nodes {
        let is_expanded = node.is_directory && expanded.contains(&node.path);
        rows.push(TreeRow {
            depth,
            name: node.name.clone(),
            path: node.path.clone(),
            is_directory: node.is_directory,
            expanded: is_expanded,
            selected: selected == Some(node.path.as_str()),
        });
        if is_expanded {
            if let Some(children) = node.children.as_deref() {
                push_rows(children, expanded, selected, depth + 1, rows);
            }
        }
    }
}
