//! Namespace tree node
//!
//! Node = (label, version, children)
//! Children are kept strictly sorted by label, so every lookup is a
//! binary search over the sibling slice.

use std::cmp::Ordering;
use std::fmt;

use super::traversal::{DepthFirst, Visit};
use super::{TreeError, Version};

/// A single vertex of the namespace tree
///
/// Ordering and equality look at the label only. The version, index and
/// dirty marker are payload. Cloning and dropping walk the subtree with an
/// explicit stack, so arbitrarily deep subtrees are safe to copy or discard.
#[derive(Debug)]
#[cfg_attr(feature = "visualize", derive(serde::Serialize))]
pub struct Node {
    /// Path segment (one file or directory name)
    label: String,

    /// Revision that created or last touched this node
    version: Option<Version>,

    /// Children, strictly sorted by label
    children: Vec<Node>,

    /// Preorder index from the most recent indexing pass
    index: Option<usize>,

    /// Set whenever label or version changed since the last indexing pass
    dirty: bool,
}

impl Node {
    /// Create a fresh, dirty, unindexed node
    pub fn new(label: impl Into<String>, version: Option<Version>) -> Self {
        Self {
            label: label.into(),
            version,
            children: Vec::new(),
            index: None,
            dirty: true,
        }
    }

    /// Path segment of this node
    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Version stamp, if any
    #[inline]
    pub fn version(&self) -> Option<&Version> {
        self.version.as_ref()
    }

    /// Sorted children
    #[inline]
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Index assigned by the last indexing pass (stale after mutation)
    #[inline]
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// Whether label or version changed since the last indexing pass
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Check if leaf (no children)
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Overwrite whichever of label/version is given and mark dirty
    ///
    /// Relabelling does not re-sort the parent's children; callers that
    /// change a label must keep the sibling order themselves.
    pub fn update(&mut self, label: Option<String>, version: Option<Version>) {
        if let Some(label) = label {
            self.label = label;
        }
        if let Some(version) = version {
            self.version = Some(version);
        }
        self.dirty = true;
    }

    /// Insert a new child at its sorted position and return it
    ///
    /// The caller guarantees no sibling with this label exists; `Tree::insert`
    /// searches before it calls this.
    pub fn insert(&mut self, label: &str, version: Option<Version>) -> &mut Node {
        let position = self
            .children
            .partition_point(|child| child.label.as_str() < label);
        debug_assert!(
            self.children
                .get(position)
                .map_or(true, |child| child.label != label),
            "duplicate child '{}' under '{}'",
            label,
            self.label
        );
        self.children.insert(position, Node::new(label, version));
        &mut self.children[position]
    }

    /// Remove the child with exactly this label and return it
    pub fn remove(&mut self, label: &str) -> Result<Node, TreeError> {
        match self.search(label) {
            Ok(position) => Ok(self.children.remove(position)),
            Err(_) => Err(TreeError::MissingChild {
                parent: self.label.clone(),
                label: label.to_string(),
            }),
        }
    }

    /// Binary search the children by label
    ///
    /// `Ok` holds the position of the match, `Err` the position where a
    /// child with this label would be inserted.
    #[inline]
    pub fn search(&self, label: &str) -> Result<usize, usize> {
        self.children
            .binary_search_by(|child| child.label.as_str().cmp(label))
    }

    /// Child with exactly this label
    pub fn child(&self, label: &str) -> Option<&Node> {
        self.search(label).ok().map(|position| &self.children[position])
    }

    /// Mutable child with exactly this label
    pub fn child_mut(&mut self, label: &str) -> Option<&mut Node> {
        match self.search(label) {
            Ok(position) => Some(&mut self.children[position]),
            Err(_) => None,
        }
    }

    pub(crate) fn child_at_mut(&mut self, position: usize) -> &mut Node {
        &mut self.children[position]
    }

    pub(crate) fn children_mut(&mut self) -> std::slice::IterMut<'_, Node> {
        self.children.iter_mut()
    }

    pub(crate) fn mark_indexed(&mut self, index: usize) {
        self.index = Some(index);
        self.dirty = false;
    }

    /// Copy of this node without its children
    fn shallow_clone(&self) -> Node {
        Node {
            label: self.label.clone(),
            version: self.version.clone(),
            children: Vec::with_capacity(self.children.len()),
            index: self.index,
            dirty: self.dirty,
        }
    }
}

impl Clone for Node {
    fn clone(&self) -> Self {
        // One open copy per level; a copy is attached to its parent on leave.
        let mut open: Vec<Node> = Vec::new();
        let mut finished = None;
        for visit in DepthFirst::new(self) {
            match visit {
                Visit::Enter { node, .. } => open.push(node.shallow_clone()),
                Visit::Leave { .. } => {
                    if let Some(done) = open.pop() {
                        match open.last_mut() {
                            Some(parent) => parent.children.push(done),
                            None => finished = Some(done),
                        }
                    }
                }
            }
        }
        finished.unwrap_or_else(|| self.shallow_clone())
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        // Vec<Node> drops recursively; flatten first so depth is irrelevant.
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.label == other.label
    }
}

impl Eq for Node {}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Node {
    fn cmp(&self, other: &Self) -> Ordering {
        self.label.cmp(&other.label)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::snapshot::write_node(f, self)
    }
}
