//! Snapshot parsing
//!
//! Reads the snapshot grammar back into a flat preorder node list, the
//! way the consuming algorithm sees it: positions are the new preorder
//! numbering, `index` (when present) names the node's position in the
//! previous snapshot.

use thiserror::Error;

/// Errors for text that is not a well-formed snapshot
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    /// Input contained no node
    #[error("snapshot is empty")]
    Empty,

    /// Character outside the grammar
    #[error("unexpected character '{found}' at offset {offset}")]
    UnexpectedCharacter {
        /// Byte offset into the input
        offset: usize,
        /// Character found there
        found: char,
    },

    /// `[` or `(` without its closing delimiter
    #[error("unterminated '{open}' starting at offset {offset}")]
    Unterminated {
        /// Byte offset of the opening delimiter
        offset: usize,
        /// Opening delimiter
        open: char,
    },

    /// Index segment that is not a non-negative integer
    #[error("invalid index '{text}' at offset {offset}")]
    InvalidIndex {
        /// Byte offset of the `[`
        offset: usize,
        /// Text between the brackets
        text: String,
    },

    /// `}` without a matching `{`, or a node after the root closed
    #[error("unbalanced '}}' at offset {offset}")]
    Unbalanced {
        /// Byte offset of the offending brace
        offset: usize,
    },

    /// Input ended with nodes still open
    #[error("{open} node(s) left unclosed")]
    Unclosed {
        /// Number of open nodes at end of input
        open: usize,
    },

    /// Index or label not followed by `{`
    #[error("index or label at offset {offset} is not attached to a node")]
    Dangling {
        /// Byte offset where the node body was expected
        offset: usize,
    },

    /// Node with neither label nor a resolvable previous index
    #[error("node at position {position} has no label and no resolvable index")]
    UnresolvedLabel {
        /// Preorder position of the node
        position: usize,
    },
}

/// One node of a parsed snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "visualize", derive(serde::Serialize))]
pub struct ParsedNode {
    /// Index carried over from the previous snapshot
    pub index: Option<usize>,
    /// Label, when transmitted (or resolved)
    pub label: Option<String>,
    /// Preorder position of the parent (`None` for the root)
    pub parent: Option<usize>,
    /// Distance from the root
    pub depth: usize,
}

/// Snapshot as a preorder node list
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "visualize", derive(serde::Serialize))]
pub struct ParsedSnapshot {
    nodes: Vec<ParsedNode>,
}

impl ParsedSnapshot {
    /// Nodes in preorder
    pub fn nodes(&self) -> &[ParsedNode] {
        &self.nodes
    }

    /// Number of nodes, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false for a successfully parsed snapshot
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Label at a preorder position
    pub fn label(&self, position: usize) -> Option<&str> {
        self.nodes.get(position)?.label.as_deref()
    }

    /// Number of nodes that transmitted (or resolved) a label
    pub fn labelled_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.label.is_some()).count()
    }

    /// Deepest level reached (root = 0)
    pub fn max_depth(&self) -> usize {
        self.nodes.iter().map(|node| node.depth).max().unwrap_or(0)
    }

    /// `(new position, previous index)` for every node that kept its index
    pub fn retained(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(position, node)| node.index.map(|index| (position, index)))
    }

    /// Preorder positions of the children of `position`
    pub fn children(&self, position: usize) -> impl Iterator<Item = usize> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .skip(position + 1)
            .filter(move |(_, node)| node.parent == Some(position))
            .map(|(child, _)| child)
    }

    /// Fill missing labels from the previous snapshot via retained indices
    ///
    /// The previous snapshot must itself be fully labelled at every index
    /// referenced here.
    pub fn resolve_labels(&mut self, previous: &ParsedSnapshot) -> Result<(), SnapshotError> {
        for (position, node) in self.nodes.iter_mut().enumerate() {
            if node.label.is_some() {
                continue;
            }
            let label = node
                .index
                .and_then(|index| previous.label(index))
                .ok_or(SnapshotError::UnresolvedLabel { position })?;
            node.label = Some(label.to_string());
        }
        Ok(())
    }

    /// Labels in preorder, failing on the first missing one
    pub fn labels(&self) -> Result<Vec<&str>, SnapshotError> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(position, node)| {
                node.label
                    .as_deref()
                    .ok_or(SnapshotError::UnresolvedLabel { position })
            })
            .collect()
    }
}

/// Parse snapshot text into preorder nodes
///
/// Trailing whitespace is ignored; anything else outside the grammar is
/// an error.
pub fn parse(source: &str) -> Result<ParsedSnapshot, SnapshotError> {
    let source = source.trim_end();
    let bytes = source.as_bytes();

    let mut nodes: Vec<ParsedNode> = Vec::new();
    let mut open: Vec<usize> = Vec::new();
    let mut index: Option<usize> = None;
    let mut label: Option<String> = None;
    let mut root_closed = false;
    let mut offset = 0;

    while offset < bytes.len() {
        if root_closed {
            return Err(SnapshotError::Unbalanced { offset });
        }
        match bytes[offset] {
            b'[' => {
                // At most one index per node, and it precedes the label.
                if index.is_some() || label.is_some() {
                    return Err(SnapshotError::UnexpectedCharacter { offset, found: '[' });
                }
                let end = find(bytes, offset, b']').ok_or(SnapshotError::Unterminated {
                    offset,
                    open: '[',
                })?;
                let text = &source[offset + 1..end];
                let invalid = || SnapshotError::InvalidIndex {
                    offset,
                    text: text.to_string(),
                };
                if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(invalid());
                }
                index = Some(text.parse().map_err(|_| invalid())?);
                offset = end + 1;
            }
            b'(' => {
                if label.is_some() {
                    return Err(SnapshotError::UnexpectedCharacter { offset, found: '(' });
                }
                let end = find(bytes, offset, b')').ok_or(SnapshotError::Unterminated {
                    offset,
                    open: '(',
                })?;
                label = Some(source[offset + 1..end].to_string());
                offset = end + 1;
            }
            b'{' => {
                nodes.push(ParsedNode {
                    index: index.take(),
                    label: label.take(),
                    parent: open.last().copied(),
                    depth: open.len(),
                });
                open.push(nodes.len() - 1);
                offset += 1;
            }
            b'}' => {
                if index.is_some() || label.is_some() {
                    return Err(SnapshotError::Dangling { offset });
                }
                open.pop().ok_or(SnapshotError::Unbalanced { offset })?;
                root_closed = open.is_empty();
                offset += 1;
            }
            _ => {
                let found = source[offset..].chars().next().unwrap_or('\u{fffd}');
                return Err(SnapshotError::UnexpectedCharacter { offset, found });
            }
        }
    }

    if index.is_some() || label.is_some() {
        return Err(SnapshotError::Dangling { offset });
    }
    if !open.is_empty() {
        return Err(SnapshotError::Unclosed { open: open.len() });
    }
    if nodes.is_empty() {
        return Err(SnapshotError::Empty);
    }
    Ok(ParsedSnapshot { nodes })
}

fn find(bytes: &[u8], from: usize, delimiter: u8) -> Option<usize> {
    bytes[from + 1..]
        .iter()
        .position(|&b| b == delimiter)
        .map(|at| from + 1 + at)
}
