//! Test helper functions for building trees and batches

#![allow(dead_code)]
use revtree::tree::path::split_path;
use revtree::{ChangeBatch, ChangeEvent, Tree, Version};

/// Label sequence for a slash-separated path
pub fn p(path: &str) -> Vec<String> {
    split_path(path).unwrap()
}

/// Version stamp
pub fn v(version: &str) -> Option<Version> {
    Some(Version::from(version))
}

/// Tree holding every path of `paths`, stamped `version`
pub fn tree_of(paths: &[&str], version: &str) -> Tree {
    let mut tree = Tree::new();
    for path in paths {
        tree.insert(&p(path), v(version));
    }
    tree
}

/// Batch of adds leading to `revision`
pub fn adds(revision: &str, paths: &[&str]) -> ChangeBatch {
    ChangeBatch::new(
        revision,
        paths.iter().map(|path| ChangeEvent::Add(p(path))).collect(),
    )
}

/// Small repository history as `(revision, name-status)` pairs
pub fn sample_history() -> Vec<(&'static str, &'static str)> {
    vec![
        ("r2", "A\tsrc/main.rs\nM\tREADME\n"),
        ("r3", "M\tsrc/lib.rs\n"),
        ("r4", "R087\tsrc/util.rs\tsrc/util/mod.rs\nD\tdocs/guide.md\n"),
        ("r5", "A\tdocs/guide.md\nA\ttests/it.rs\n"),
    ]
}

/// Baseline listing matching [`sample_history`]
pub const SAMPLE_LISTING: &str = "README\nsrc/lib.rs\nsrc/util.rs\ndocs/guide.md\n";
