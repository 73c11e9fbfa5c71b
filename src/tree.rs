//! Directory Tree Model for navigating the mirror
//!
//! A scan produces an owned [`TreeNode`] hierarchy. Nodes are never patched
//! across scans; a refresh builds a new tree. Navigation state lives in a
//! separate [`TreeCursor`] owned by whoever displays the tree.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Directory,
    File,
}

/// One filesystem entry in a scanned tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub label: String,
    pub kind: NodeKind,
    pub expanded: bool,
    /// Absolute path, unique within the tree
    pub path: PathBuf,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    fn new(path: PathBuf, kind: NodeKind) -> Self {
        let label = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            label,
            kind,
            expanded: false,
            path,
            children: Vec::new(),
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Expand or collapse this node and every descendant
    pub fn set_expanded_recursive(&mut self, expanded: bool) {
        self.expanded = expanded;
        for child in &mut self.children {
            child.set_expanded_recursive(expanded);
        }
    }

    /// The `n`th node in visible order, counting this node as 0
    pub fn visible_node_mut(&mut self, n: usize) -> Option<&mut TreeNode> {
        let mut remaining = n;
        self.nth_visible_mut(&mut remaining)
    }

    fn nth_visible_mut(&mut self, remaining: &mut usize) -> Option<&mut TreeNode> {
        if *remaining == 0 {
            return Some(self);
        }
        *remaining -= 1;
        if self.expanded {
            for child in &mut self.children {
                if let Some(found) = child.nth_visible_mut(remaining) {
                    return Some(found);
                }
            }
        }
        None
    }
}

/// Scan `root` into a tree. The root and every directory start collapsed.
///
/// A walk error yields a childless root labelled with the error instead of a
/// partial tree.
pub fn build_tree(root: &Path) -> TreeNode {
    let root = crate::mirror::absolute(root);
    let kind = match std::fs::metadata(&root) {
        Ok(meta) if !meta.is_dir() => NodeKind::File,
        _ => NodeKind::Directory,
    };
    let mut root_node = TreeNode::new(root.clone(), kind);

    match walk(&root) {
        Ok(children) => root_node.children = children,
        Err(e) => root_node.label = format!("Error: {}", e),
    }

    root_node
}

fn walk(root: &Path) -> Result<Vec<TreeNode>, walkdir::Error> {
    // Open ancestors, innermost last. Entry 0 is the root itself.
    let mut stack = vec![TreeNode::new(root.to_path_buf(), NodeKind::Directory)];

    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        let parent = entry.path().parent().unwrap_or(root);

        // Pre-order walk: close finished subtrees until the parent is on top
        while stack.len() > 1 && stack.last().map(|n| n.path.as_path()) != Some(parent) {
            close_top(&mut stack);
        }

        let kind = if entry.file_type().is_dir() {
            NodeKind::Directory
        } else {
            NodeKind::File
        };
        let node = TreeNode::new(entry.path().to_path_buf(), kind);

        if kind == NodeKind::Directory {
            stack.push(node);
        } else if let Some(top) = stack.last_mut() {
            top.children.push(node);
        }
    }

    while stack.len() > 1 {
        close_top(&mut stack);
    }

    Ok(stack.pop().map(|root| root.children).unwrap_or_default())
}

fn close_top(stack: &mut Vec<TreeNode>) {
    if let Some(done) = stack.pop() {
        if let Some(parent) = stack.last_mut() {
            parent.children.push(done);
        }
    }
}

/// Depth-first pre-order sequence of nodes reachable through expanded nodes
pub fn visible_nodes(root: &TreeNode) -> Vec<&TreeNode> {
    visible_entries(root).into_iter().map(|(_, node)| node).collect()
}

/// Same as [`visible_nodes`], paired with each node's depth below the root
pub fn visible_entries(root: &TreeNode) -> Vec<(usize, &TreeNode)> {
    fn collect<'a>(node: &'a TreeNode, depth: usize, out: &mut Vec<(usize, &'a TreeNode)>) {
        out.push((depth, node));
        if node.expanded {
            for child in &node.children {
                collect(child, depth + 1, out);
            }
        }
    }

    let mut out = Vec::new();
    collect(root, 0, &mut out);
    out
}

/// Highlighted position in a tree's visible sequence
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeCursor {
    index: usize,
}

impl TreeCursor {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn up(&mut self) {
        self.index = self.index.saturating_sub(1);
    }

    pub fn down(&mut self, root: &TreeNode) {
        if self.index + 1 < visible_nodes(root).len() {
            self.index += 1;
        }
    }

    /// Keep the cursor inside the visible range after the tree changed
    pub fn clamp(&mut self, root: &TreeNode) {
        let last = visible_nodes(root).len().saturating_sub(1);
        self.index = self.index.min(last);
    }

    pub fn current<'a>(&self, root: &'a TreeNode) -> Option<&'a TreeNode> {
        visible_nodes(root).get(self.index).copied()
    }

    /// Flip the expansion of the highlighted node if it has children.
    /// Returns whether anything changed.
    pub fn toggle(&mut self, root: &mut TreeNode) -> bool {
        let toggled = match root.visible_node_mut(self.index) {
            Some(node) if node.has_children() => {
                node.expanded = !node.expanded;
                true
            }
            _ => false,
        };
        self.clamp(root);
        toggled
    }
}
