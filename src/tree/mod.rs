//! Versioned namespace tree
//!
//! Mirrors a hierarchical file namespace: the root is the separator
//! sentinel, every other node is one path segment. Children stay sorted,
//! directories exist only while they contain something, and a preorder
//! indexing pass numbers the whole tree between snapshots.

mod node;
pub mod path;
pub mod traversal;

pub use node::Node;
pub use path::PathError;
pub use traversal::{DepthFirst, Visit};

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, trace};

/// Opaque version stamp (e.g. a revision id), shared across all nodes it touches
pub type Version = Arc<str>;

/// Path separator; also the label of the root
pub const SEPARATOR: char = '/';

/// Errors for tree operations whose preconditions do not hold
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// A path segment does not exist
    #[error("no entry '{missing}' while resolving '{path}'")]
    PathNotFound {
        /// Full path being resolved
        path: String,
        /// First segment that was not found
        missing: String,
    },

    /// Removal of a child that does not exist
    #[error("cannot remove '{label}': not a child of '{parent}'")]
    MissingChild {
        /// Label of the parent node
        parent: String,
        /// Label that was not found
        label: String,
    },

    /// The empty path names the root, which is never removed
    #[error("the root cannot be removed")]
    EmptyPath,
}

/// Structural invariant found broken by [`Tree::check_invariants`]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// Adjacent children out of order
    #[error("children of '{parent}' out of order: '{left}' before '{right}'")]
    Unsorted {
        /// Path of the parent
        parent: String,
        /// Earlier child
        left: String,
        /// Later child
        right: String,
    },

    /// Two children share a label
    #[error("duplicate child '{label}' under '{parent}'")]
    Duplicate {
        /// Path of the parent
        parent: String,
        /// Repeated label
        label: String,
    },
}

/// Rooted namespace tree
#[derive(Debug, Clone)]
pub struct Tree {
    root: Node,
}

impl Tree {
    /// Create a tree holding only the root
    pub fn new() -> Self {
        Self {
            root: Node::new(SEPARATOR.to_string(), None),
        }
    }

    /// Build a tree from a flat listing, stamping every node with `version`
    pub fn from_listing(listing: &str, version: Option<Version>) -> Result<Self, PathError> {
        let mut tree = Self::new();
        let mut files = 0usize;
        for labels in path::parse_listing(listing)? {
            tree.insert(&labels, version.clone());
            files += 1;
        }
        debug!(files, nodes = tree.node_count(), "built tree from listing");
        Ok(tree)
    }

    /// Get root node
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Whether the root has no children
    pub fn is_empty(&self) -> bool {
        self.root.is_leaf()
    }

    /// Resolve a path by binary search at each level
    pub fn get_by_path<S: AsRef<str>>(&self, path: &[S]) -> Result<&Node, TreeError> {
        let mut node = &self.root;
        for label in path {
            let label = label.as_ref();
            node = node.child(label).ok_or_else(|| TreeError::PathNotFound {
                path: path::join_path(path),
                missing: label.to_string(),
            })?;
        }
        Ok(node)
    }

    fn get_by_path_mut<S: AsRef<str>>(&mut self, path: &[S]) -> Result<&mut Node, TreeError> {
        let mut node = &mut self.root;
        for label in path {
            let label = label.as_ref();
            node = node.child_mut(label).ok_or_else(|| TreeError::PathNotFound {
                path: path::join_path(path),
                missing: label.to_string(),
            })?;
        }
        Ok(node)
    }

    /// Whether a node exists at `path`
    pub fn contains<S: AsRef<str>>(&self, path: &[S]) -> bool {
        self.get_by_path(path).is_ok()
    }

    /// Insert `path`, creating only the missing suffix
    ///
    /// Existing prefixes are descended unchanged; every node created here
    /// is stamped with `version`. Inserting a path that already exists
    /// creates nothing. Returns the deepest node.
    pub fn insert<S: AsRef<str>>(&mut self, path: &[S], version: Option<Version>) -> &mut Node {
        let mut node = &mut self.root;
        for label in path {
            let label = label.as_ref();
            node = match node.search(label) {
                Ok(position) => node.child_at_mut(position),
                Err(_) => node.insert(label, version.clone()),
            };
        }
        node
    }

    /// Remove the node at `path`, then prune ancestors left empty
    ///
    /// Pruning walks upward and stops at the first ancestor that still has
    /// children; the root is never removed. Returns the removed subtree.
    pub fn remove<S: AsRef<str>>(&mut self, path: &[S]) -> Result<Node, TreeError> {
        let (leaf, parent) = path.split_last().ok_or(TreeError::EmptyPath)?;
        let removed = self.get_by_path_mut(parent)?.remove(leaf.as_ref())?;

        // Ancestors are resolved by path; nodes hold no parent links.
        for depth in (1..path.len()).rev() {
            let ancestor = &path[..depth];
            if !self.get_by_path(ancestor)?.is_leaf() {
                break;
            }
            let (label, grandparent) = ancestor.split_last().ok_or(TreeError::EmptyPath)?;
            self.get_by_path_mut(grandparent)?.remove(label.as_ref())?;
            trace!(path = %path::join_path(ancestor), "pruned empty directory");
        }

        Ok(removed)
    }

    /// Restamp the node at `path` with `version` and mark it dirty
    pub fn update<S: AsRef<str>>(
        &mut self,
        path: &[S],
        version: Option<Version>,
    ) -> Result<(), TreeError> {
        self.get_by_path_mut(path)?.update(None, version);
        Ok(())
    }

    /// Number every node in preorder from 0 and clear dirty markers
    ///
    /// Returns the node count, root included.
    pub fn set_indices(&mut self) -> usize {
        let count = traversal::assign_preorder(&mut self.root);
        debug!(nodes = count, "assigned preorder indices");
        count
    }

    /// Total node count including the root
    pub fn node_count(&self) -> usize {
        traversal::preorder(&self.root).count()
    }

    /// Preorder walk yielding `(depth, node)`
    pub fn preorder(&self) -> impl Iterator<Item = (usize, &Node)> {
        traversal::preorder(&self.root)
    }

    /// Label paths of all leaves (the files of the namespace), in preorder
    pub fn leaf_paths(&self) -> Vec<Vec<String>> {
        traversal::leaf_paths(&self.root)
    }

    /// Verify that every sibling set is strictly sorted
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let mut current: Vec<&str> = Vec::new();
        for (depth, node) in self.preorder() {
            if depth > 0 {
                current.truncate(depth - 1);
                current.push(node.label());
            }
            for pair in node.children().windows(2) {
                let (left, right) = (pair[0].label(), pair[1].label());
                if left == right {
                    return Err(InvariantViolation::Duplicate {
                        parent: display_path(&current),
                        label: left.to_string(),
                    });
                }
                if left > right {
                    return Err(InvariantViolation::Unsorted {
                        parent: display_path(&current),
                        left: left.to_string(),
                        right: right.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Render the tree in snapshot form
    pub fn render(&self) -> String {
        crate::snapshot::render(&self.root)
    }
}

fn display_path(labels: &[&str]) -> String {
    if labels.is_empty() {
        SEPARATOR.to_string()
    } else {
        path::join_path(labels)
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::snapshot::write_node(f, &self.root)
    }
}
