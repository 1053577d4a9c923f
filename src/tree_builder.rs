use std::collections::{HashMap, HashSet};

use crate::format::TargetFormat;
use crate::repository::{EntryKind, FlatEntry};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNode {
    pub name: String,
    pub path: String,
    /// Whether the file's extension belongs to the tree's target format.
    pub matches_target: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryNode {
    pub name: String,
    pub path: String,
    pub children: Vec<TreeNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeNode {
    Directory(DirectoryNode),
    File(FileNode),
}

impl TreeNode {
    pub fn name(&self) -> &str {
        match self {
            TreeNode::Directory(dir) => &dir.name,
            TreeNode::File(file) => &file.name,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            TreeNode::Directory(dir) => &dir.path,
            TreeNode::File(file) => &file.path,
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, TreeNode::Directory(_))
    }

    /// Children of a directory; files have none.
    pub fn children(&self) -> &[TreeNode] {
        match self {
            TreeNode::Directory(dir) => &dir.children,
            TreeNode::File(_) => &[],
        }
    }

    pub fn as_file(&self) -> Option<&FileNode> {
        match self {
            TreeNode::File(file) => Some(file),
            TreeNode::Directory(_) => None,
        }
    }
}

/// The nested reconstruction of one repository listing.
#[derive(Debug, Clone, Default)]
pub struct FileTree {
    roots: Vec<TreeNode>,
    target: Option<TargetFormat>,
    node_count: usize,
}

impl FileTree {
    pub fn roots(&self) -> &[TreeNode] {
        &self.roots
    }

    pub fn target(&self) -> Option<TargetFormat> {
        self.target
    }

    /// Total number of nodes, directories included.
    pub fn len(&self) -> usize {
        self.node_count
    }

    pub fn is_empty(&self) -> bool {
        self.node_count == 0
    }

    /// Depth-first lookup of a node by its full path. A leading or trailing
    /// `/` is ignored.
    pub fn find(&self, path: &str) -> Option<&TreeNode> {
        find_in(&self.roots, path.trim_matches('/'))
    }

    /// Every file node, in display order.
    pub fn files(&self) -> Vec<&FileNode> {
        let mut out = Vec::new();
        collect_files(&self.roots, &mut |file| out.push(file));
        out
    }

    pub fn matching_files(&self) -> Vec<&FileNode> {
        self.files().into_iter().filter(|f| f.matches_target).collect()
    }

    /// Re-derive every `matches_target` flag for a new target format.
    pub fn retarget(&mut self, target: Option<TargetFormat>) {
        self.target = target;
        retarget_nodes(&mut self.roots, target);
    }

    /// A copy of the tree holding only `paths` and the directories leading to
    /// them. Unknown paths are skipped.
    pub fn pruned_to(&self, paths: &[String]) -> Vec<TreeNode> {
        let mut keep: HashSet<&str> = HashSet::new();
        for path in paths {
            let path = path.trim_matches('/');
            if self.find(path).is_none() {
                continue;
            }
            keep.insert(path);
            let mut rest = path;
            while let Some((parent, _)) = rest.rsplit_once('/') {
                keep.insert(parent);
                rest = parent;
            }
        }
        prune_nodes(&self.roots, &keep)
    }
}

fn find_in<'a>(nodes: &'a [TreeNode], path: &str) -> Option<&'a TreeNode> {
    for node in nodes {
        if node.path() == path {
            return Some(node);
        }
        if let TreeNode::Directory(dir) = node {
            // Only descend into directories that can contain `path`.
            if path.starts_with(&dir.path) && path[dir.path.len()..].starts_with('/') {
                if let Some(found) = find_in(&dir.children, path) {
                    return Some(found);
                }
            }
        }
    }
    None
}

fn collect_files<'a>(nodes: &'a [TreeNode], sink: &mut impl FnMut(&'a FileNode)) {
    for node in nodes {
        match node {
            TreeNode::File(file) => sink(file),
            TreeNode::Directory(dir) => collect_files(&dir.children, sink),
        }
    }
}

fn retarget_nodes(nodes: &mut [TreeNode], target: Option<TargetFormat>) {
    for node in nodes {
        match node {
            TreeNode::File(file) => {
                file.matches_target = target.is_some_and(|t| t.matches(&file.name));
            }
            TreeNode::Directory(dir) => retarget_nodes(&mut dir.children, target),
        }
    }
}

fn prune_nodes(nodes: &[TreeNode], keep: &HashSet<&str>) -> Vec<TreeNode> {
    nodes
        .iter()
        .filter(|node| keep.contains(node.path()))
        .map(|node| match node {
            TreeNode::File(file) => TreeNode::File(file.clone()),
            TreeNode::Directory(dir) => TreeNode::Directory(DirectoryNode {
                name: dir.name.clone(),
                path: dir.path.clone(),
                children: prune_nodes(&dir.children, keep),
            }),
        })
        .collect()
}

// --- Construction ---

struct Slot {
    name: String,
    path: String,
    kind: EntryKind,
    children: Vec<usize>,
}

/// Flat, path-keyed node storage. Parent-to-children edges are kept as slot
/// indices and only turned into nested nodes by `project`.
#[derive(Default)]
struct Arena {
    slots: Vec<Slot>,
    by_path: HashMap<String, usize>,
    roots: Vec<usize>,
}

impl Arena {
    fn add(&mut self, parent: Option<usize>, name: &str, path: String, kind: EntryKind) -> usize {
        let idx = self.slots.len();
        self.slots.push(Slot {
            name: name.to_string(),
            path: path.clone(),
            kind,
            children: Vec::new(),
        });
        self.by_path.insert(path, idx);
        match parent {
            Some(parent_idx) => self.slots[parent_idx].children.push(idx),
            None => self.roots.push(idx),
        }
        idx
    }

    fn insert(&mut self, entry: &FlatEntry) {
        let segments: Vec<&str> = entry.path.split('/').filter(|s| !s.is_empty()).collect();
        let Some((last, ancestors)) = segments.split_last() else {
            log::debug!("Skipping entry with empty path");
            return;
        };

        let mut parent: Option<usize> = None;
        let mut path = String::new();
        for segment in ancestors {
            if !path.is_empty() {
                path.push('/');
            }
            path.push_str(segment);
            parent = match self.by_path.get(&path).copied() {
                Some(idx) if self.slots[idx].kind == EntryKind::File => {
                    log::warn!(
                        "Dropping '{}': ancestor '{}' was already listed as a file",
                        entry.path,
                        path
                    );
                    return;
                }
                Some(idx) => Some(idx),
                None => Some(self.add(parent, segment, path.clone(), EntryKind::Directory)),
            };
        }

        if !path.is_empty() {
            path.push('/');
        }
        path.push_str(last);
        match self.by_path.get(&path).copied() {
            Some(idx) if self.slots[idx].kind != entry.kind => {
                log::warn!(
                    "'{}' listed as both {:?} and {:?}; keeping {:?}",
                    path,
                    self.slots[idx].kind,
                    entry.kind,
                    self.slots[idx].kind
                );
            }
            Some(_) => {}
            None => {
                self.add(parent, last, path, entry.kind);
            }
        }
    }

    fn project(&self, idx: usize, target: Option<TargetFormat>) -> TreeNode {
        let slot = &self.slots[idx];
        match slot.kind {
            EntryKind::File => TreeNode::File(FileNode {
                name: slot.name.clone(),
                path: slot.path.clone(),
                matches_target: target.is_some_and(|t| t.matches(&slot.name)),
            }),
            EntryKind::Directory => {
                let mut children: Vec<TreeNode> = slot
                    .children
                    .iter()
                    .map(|&child| self.project(child, target))
                    .collect();
                sort_nodes(&mut children);
                TreeNode::Directory(DirectoryNode {
                    name: slot.name.clone(),
                    path: slot.path.clone(),
                    children,
                })
            }
        }
    }
}

/// Directories first, then by name ignoring case.
fn sort_nodes(nodes: &mut [TreeNode]) {
    nodes.sort_by(|a, b| {
        b.is_dir()
            .cmp(&a.is_dir())
            .then_with(|| a.name().to_lowercase().cmp(&b.name().to_lowercase()))
            .then_with(|| a.name().cmp(b.name()))
    });
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TreeBuilder {
    target: Option<TargetFormat>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        TreeBuilder::default()
    }

    pub fn target(mut self, target: TargetFormat) -> Self {
        self.target = Some(target);
        self
    }

    pub fn maybe_target(mut self, target: Option<TargetFormat>) -> Self {
        self.target = target;
        self
    }

    /// Build the nested tree from an unordered listing. Missing parent
    /// directories are synthesised; on conflicting kinds the first one seen
    /// wins.
    pub fn build(&self, entries: &[FlatEntry]) -> FileTree {
        let mut arena = Arena::default();
        for entry in entries {
            arena.insert(entry);
        }
        let mut roots: Vec<TreeNode> = arena
            .roots
            .iter()
            .map(|&idx| arena.project(idx, self.target))
            .collect();
        sort_nodes(&mut roots);
        log::debug!(
            "Built tree with {} nodes from {} entries",
            arena.slots.len(),
            entries.len()
        );
        FileTree {
            roots,
            target: self.target,
            node_count: arena.slots.len(),
        }
    }
}

pub fn build_tree(entries: &[FlatEntry]) -> FileTree {
    TreeBuilder::new().build(entries)
}

/// Render `├─`/`└─` labels for a forest, one per node in display order,
/// preceded by a `./` root line. Directories get a trailing `/`.
pub fn build_tree_labels(nodes: &[TreeNode]) -> Vec<String> {
    let mut labels = vec!["./".to_string()];
    let mut prefix = String::new();
    push_labels(nodes, &mut prefix, &mut labels);
    labels
}

fn push_labels(nodes: &[TreeNode], prefix: &mut String, labels: &mut Vec<String>) {
    for (idx, node) in nodes.iter().enumerate() {
        let is_last = idx + 1 == nodes.len();
        let branch = if is_last { "└─ " } else { "├─ " };
        let suffix = if node.is_dir() { "/" } else { "" };
        labels.push(format!("{}{}{}{}", prefix, branch, node.name(), suffix));

        if let TreeNode::Directory(dir) = node {
            let restore = prefix.len();
            prefix.push_str(if is_last { "   " } else { "│  " });
            push_labels(&dir.children, prefix, labels);
            prefix.truncate(restore);
        }
    }
}
