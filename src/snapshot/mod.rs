//! Tree snapshots
//!
//! A snapshot is the textual form of a tree at one revision, the exact
//! payload handed to the consuming distance algorithm. Indices let the
//! consumer refer to nodes it already knows; labels travel only for nodes
//! that are new or touched since the previous snapshot.

mod parser;
mod render;

pub use parser::{parse, ParsedNode, ParsedSnapshot, SnapshotError};
pub use render::{render, write_node};

use std::fmt;

use crate::tree::Tree;

/// Rendered tree plus the metadata reported alongside it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Snapshot name (`<revision>` or `<from>-<to>`)
    name: String,
    /// Rendered tree
    text: String,
    /// Number of nodes, root included
    node_count: usize,
}

impl Snapshot {
    /// Render the current state of `tree`
    pub fn capture(name: impl Into<String>, tree: &Tree) -> Self {
        Self {
            name: name.into(),
            text: tree.render(),
            node_count: tree.node_count(),
        }
    }

    /// Snapshot name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rendered text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Consume and return the rendered text
    pub fn into_text(self) -> String {
        self.text
    }

    /// Number of nodes in the tree at capture time
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Number of nodes that carry a label in this snapshot
    pub fn labelled_count(&self) -> usize {
        self.text.matches('(').count()
    }

    /// Size of the rendered text in bytes
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Whether the rendered text is empty (never true for a captured tree)
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// BLAKE3 digest of the rendered text
    pub fn digest(&self) -> blake3::Hash {
        blake3::hash(self.text.as_bytes())
    }

    /// Parse the rendered text back into preorder nodes
    pub fn parse(&self) -> Result<ParsedSnapshot, SnapshotError> {
        parse(&self.text)
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture() {
        let mut tree = Tree::new();
        tree.insert(&["a", "b"], None);
        let snapshot = Snapshot::capture("v1", &tree);

        assert_eq!(snapshot.name(), "v1");
        assert_eq!(snapshot.text(), "(/){(a){(b){}}}");
        assert_eq!(snapshot.node_count(), 3);
        assert_eq!(snapshot.labelled_count(), 3);
        assert_eq!(snapshot.len(), snapshot.text().len());
        assert_eq!(snapshot.digest(), blake3::hash(b"(/){(a){(b){}}}"));
    }

    #[test]
    fn test_parse_matches_node_count() {
        let mut tree = Tree::new();
        for path in [["x", "1"], ["x", "2"], ["y", "1"]] {
            tree.insert(&path, None);
        }
        let snapshot = Snapshot::capture("v1", &tree);
        let parsed = snapshot.parse().unwrap();
        assert_eq!(parsed.len(), snapshot.node_count());
        assert_eq!(parsed.labels().unwrap(), vec!["/", "x", "1", "2", "y", "1"]);
    }
}
