//! Explicit-stack traversals
//!
//! Namespaces can be deep and wide, so no whole-tree walk recurses on the
//! call stack. Each frame is a sibling slice plus a cursor into it
//! (a slice iterator), exactly one frame per level.

use super::Node;

/// Step of a depth-first walk
#[derive(Debug, Clone, Copy)]
pub enum Visit<'a> {
    /// First arrival at a node (preorder position)
    Enter {
        /// Node being entered
        node: &'a Node,
        /// Distance from the root (root = 0)
        depth: usize,
    },

    /// All children of the node have been visited
    Leave {
        /// Node being left
        node: &'a Node,
        /// Distance from the root (root = 0)
        depth: usize,
    },
}

/// Depth-first walk yielding enter/leave events in sorted child order
///
/// Stack depth equals tree height; per level only the parent and a
/// cursor into its children are kept.
#[derive(Debug)]
pub struct DepthFirst<'a> {
    /// Root, until its `Enter` event has been emitted
    pending_root: Option<&'a Node>,

    /// One frame per open node: (node, cursor into its children)
    stack: Vec<(&'a Node, std::slice::Iter<'a, Node>)>,
}

impl<'a> DepthFirst<'a> {
    /// Start a walk at `root`
    pub fn new(root: &'a Node) -> Self {
        Self {
            pending_root: Some(root),
            stack: Vec::new(),
        }
    }

    /// Number of currently open levels
    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

impl<'a> Iterator for DepthFirst<'a> {
    type Item = Visit<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(root) = self.pending_root.take() {
            self.stack.push((root, root.children().iter()));
            return Some(Visit::Enter {
                node: root,
                depth: 0,
            });
        }

        let depth = self.stack.len();
        let next_child = self.stack.last_mut()?.1.next();
        match next_child {
            Some(child) => {
                self.stack.push((child, child.children().iter()));
                Some(Visit::Enter { node: child, depth })
            }
            None => {
                let (node, _) = self.stack.pop()?;
                Some(Visit::Leave {
                    node,
                    depth: self.stack.len(),
                })
            }
        }
    }
}

/// Preorder walk yielding `(depth, node)`
pub fn preorder(root: &Node) -> impl Iterator<Item = (usize, &Node)> {
    DepthFirst::new(root).filter_map(|visit| match visit {
        Visit::Enter { node, depth } => Some((depth, node)),
        Visit::Leave { .. } => None,
    })
}

/// Assign preorder indices `0..N` and clear every dirty marker
///
/// Returns N, the number of nodes including the root.
pub fn assign_preorder(root: &mut Node) -> usize {
    let mut next_index = 0;
    let mut stack = vec![std::slice::from_mut(root).iter_mut()];

    while let Some(frame) = stack.last_mut() {
        match frame.next() {
            Some(node) => {
                node.mark_indexed(next_index);
                next_index += 1;
                stack.push(node.children_mut());
            }
            None => {
                stack.pop();
            }
        }
    }

    next_index
}

/// Leaf paths (labels from below the root down to each leaf), in preorder
pub fn leaf_paths(root: &Node) -> Vec<Vec<String>> {
    let mut current: Vec<&str> = Vec::new();
    let mut leaves = Vec::new();

    for (depth, node) in preorder(root) {
        if depth == 0 {
            continue;
        }
        current.truncate(depth - 1);
        current.push(node.label());
        if node.is_leaf() {
            leaves.push(current.iter().map(|label| label.to_string()).collect());
        }
    }

    leaves
}
