//! Snapshot rendering
//!
//! node := ["[" index "]"] ["(" label ")"] "{" node* "}"
//! The index appears once a node has been indexed, the label only while
//! the node is dirty.

use std::fmt::{self, Write};

use crate::tree::{DepthFirst, Node, Visit};

/// Write the subtree at `root` in snapshot form
pub fn write_node<W: Write>(out: &mut W, root: &Node) -> fmt::Result {
    for visit in DepthFirst::new(root) {
        match visit {
            Visit::Enter { node, .. } => {
                if let Some(index) = node.index() {
                    write!(out, "[{}]", index)?;
                }
                if node.is_dirty() {
                    write!(out, "({})", node.label())?;
                }
                out.write_char('{')?;
            }
            Visit::Leave { .. } => out.write_char('}')?,
        }
    }
    Ok(())
}

/// Render the subtree at `root` into a new string
pub fn render(root: &Node) -> String {
    let mut out = String::new();
    write_node(&mut out, root).expect("writing to a String cannot fail");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Tree;

    #[test]
    fn test_fresh_tree_renders_labels_only() {
        let mut tree = Tree::new();
        tree.insert(&["a", "b"], None);
        tree.insert(&["c"], None);
        assert_eq!(render(tree.root()), "(/){(a){(b){}}(c){}}");
    }

    #[test]
    fn test_indexed_tree_renders_indices_only() {
        let mut tree = Tree::new();
        tree.insert(&["a", "b"], None);
        tree.insert(&["c"], None);
        tree.set_indices();
        assert_eq!(render(tree.root()), "[0]{[1]{[2]{}}[3]{}}");
    }

    #[test]
    fn test_new_nodes_render_label_without_index() {
        let mut tree = Tree::new();
        tree.insert(&["a", "b"], None);
        tree.set_indices();
        tree.insert(&["a", "c"], None);
        tree.update(&["a"], None).unwrap();
        assert_eq!(render(tree.root()), "[0]{[1](a){[2]{}(c){}}}");
    }

    #[test]
    fn test_display_matches_render() {
        let mut tree = Tree::new();
        tree.insert(&["x"], None);
        assert_eq!(tree.to_string(), render(tree.root()));
        assert_eq!(tree.root().to_string(), "(/){(x){}}");
    }
}
