//! Cursor-based navigation over a built tree.
//!
//! The cursor is a plain path string owned by the caller; `"/"` is the root.
//! Nothing here mutates the tree.

use crate::tree_builder::TreeNode;

pub const ROOT: &str = "/";

/// The nodes to display for `cursor`.
///
/// Returns `tree` itself for the root. Otherwise the children of the
/// directory whose path equals `cursor` (leading `/` ignored), or an empty
/// slice if there is no such directory.
pub fn children_at<'a>(tree: &'a [TreeNode], cursor: &str) -> &'a [TreeNode] {
    if cursor == ROOT {
        return tree;
    }
    let wanted = cursor.trim_matches('/');
    if wanted.is_empty() {
        return tree;
    }
    find_directory(tree, wanted)
        .map(TreeNode::children)
        .unwrap_or(&[])
}

fn find_directory<'a>(nodes: &'a [TreeNode], path: &str) -> Option<&'a TreeNode> {
    for node in nodes {
        if let TreeNode::Directory(dir) = node {
            if dir.path == path {
                return Some(node);
            }
            if let Some(found) = find_directory(&dir.children, path) {
                return Some(found);
            }
        }
    }
    None
}

/// The cursor after entering `node`; `None` for files.
///
/// The returned cursor is the node's tree path, which never starts with
/// `/`, even when the cursor it was reached from did. `up` of it is the
/// unslashed parent.
pub fn enter(node: &TreeNode) -> Option<String> {
    match node {
        TreeNode::Directory(dir) => Some(dir.path.clone()),
        TreeNode::File(_) => None,
    }
}

/// The cursor one level above `cursor`. `up("/")` stays at the root.
pub fn up(cursor: &str) -> String {
    let mut segments: Vec<&str> = cursor.split('/').collect();
    segments.pop();
    let parent = segments.join("/");
    if parent.is_empty() {
        ROOT.to_string()
    } else {
        parent
    }
}

/// Breadcrumb segments for display, root first.
pub fn breadcrumbs(cursor: &str) -> Vec<&str> {
    std::iter::once(ROOT)
        .chain(cursor.split('/').filter(|s| !s.is_empty()))
        .collect()
}
