//! Namespace change events and batch application
//!
//! A batch is the list of events between two revisions, tagged with the
//! newer revision. Applying it advances a tree by one revision:
//! - `Add`: insert, stamped with the batch revision
//! - `Delete`: remove, pruning emptied directories
//! - `Rename`: remove the old path, insert the new one stamped
//! - `Modify`: no structural effect

mod name_status;

pub use name_status::{parse_line, parse_name_status};

use thiserror::Error;
use tracing::{debug, trace};

use crate::tree::{path::join_path, PathError, Tree, TreeError, Version};

/// Kind of a change event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "visualize", derive(serde::Serialize))]
pub enum ChangeKind {
    /// Path added
    Add,
    /// Path deleted
    Delete,
    /// Content changed, hierarchy unchanged
    Modify,
    /// Path moved
    Rename,
}

/// One path change between two revisions
///
/// Paths are label sequences below the root.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "visualize", derive(serde::Serialize))]
pub enum ChangeEvent {
    /// Path added
    Add(Vec<String>),
    /// Path deleted
    Delete(Vec<String>),
    /// Content changed
    Modify(Vec<String>),
    /// Path moved from `from` to `to`
    Rename {
        /// Old path
        from: Vec<String>,
        /// New path
        to: Vec<String>,
    },
}

impl ChangeEvent {
    /// Kind of this event
    pub fn kind(&self) -> ChangeKind {
        match self {
            ChangeEvent::Add(_) => ChangeKind::Add,
            ChangeEvent::Delete(_) => ChangeKind::Delete,
            ChangeEvent::Modify(_) => ChangeKind::Modify,
            ChangeEvent::Rename { .. } => ChangeKind::Rename,
        }
    }

    /// Path the event refers to (the old path for renames)
    pub fn path(&self) -> &[String] {
        match self {
            ChangeEvent::Add(path) | ChangeEvent::Delete(path) | ChangeEvent::Modify(path) => path,
            ChangeEvent::Rename { from, .. } => from,
        }
    }

    /// New path of a rename
    pub fn new_path(&self) -> Option<&[String]> {
        match self {
            ChangeEvent::Rename { to, .. } => Some(to),
            _ => None,
        }
    }
}

/// Errors for change batches
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChangeError {
    /// Line is not a valid name-status entry
    #[error("line {line}: {reason}")]
    Malformed {
        /// 1-based line number
        line: usize,
        /// What is wrong with it
        reason: String,
    },

    /// Line names a path that cannot be a tree path
    #[error("line {line}: {source}")]
    InvalidPath {
        /// 1-based line number
        line: usize,
        /// Path rejection
        source: PathError,
    },

    /// Event does not fit the tree (e.g. deleting a path never added)
    #[error("event {position} ({kind:?} {path}) failed: {source}")]
    Apply {
        /// 0-based position of the event in its batch
        position: usize,
        /// Kind of the failing event
        kind: ChangeKind,
        /// Path of the failing event
        path: String,
        /// Tree error
        source: TreeError,
    },
}

/// Ordered change events leading to `revision`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeBatch {
    revision: Version,
    events: Vec<ChangeEvent>,
}

impl ChangeBatch {
    /// Batch of `events` leading to `revision`
    pub fn new(revision: impl Into<Version>, events: Vec<ChangeEvent>) -> Self {
        Self {
            revision: revision.into(),
            events,
        }
    }

    /// Parse name-status text into a batch for `revision`
    pub fn from_name_status(revision: impl Into<Version>, text: &str) -> Result<Self, ChangeError> {
        Ok(Self::new(revision, parse_name_status(text)?))
    }

    /// Revision stamped onto added and renamed nodes
    pub fn revision(&self) -> &Version {
        &self.revision
    }

    /// Events in application order
    pub fn events(&self) -> &[ChangeEvent] {
        &self.events
    }

    /// Number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the batch has no events
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Per-kind counts of an applied batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "visualize", derive(serde::Serialize))]
pub struct BatchOutcome {
    /// Paths added
    pub added: usize,
    /// Paths deleted
    pub deleted: usize,
    /// Paths modified (skipped)
    pub modified: usize,
    /// Paths renamed
    pub renamed: usize,
}

impl BatchOutcome {
    fn record(&mut self, kind: ChangeKind) {
        match kind {
            ChangeKind::Add => self.added += 1,
            ChangeKind::Delete => self.deleted += 1,
            ChangeKind::Modify => self.modified += 1,
            ChangeKind::Rename => self.renamed += 1,
        }
    }

    /// Whether any event changed the shape of the tree
    pub fn structure_changed(&self) -> bool {
        self.added + self.deleted + self.renamed > 0
    }

    /// Whether the batch consisted only of modifications (or nothing)
    pub fn only_modifications(&self) -> bool {
        !self.structure_changed()
    }

    /// Total number of events applied
    pub fn total(&self) -> usize {
        self.added + self.deleted + self.modified + self.renamed
    }
}

/// Apply a single event, stamping created nodes with `revision`
pub fn apply_event(tree: &mut Tree, event: &ChangeEvent, revision: &Version) -> Result<(), TreeError> {
    match event {
        ChangeEvent::Modify(_) => {}
        ChangeEvent::Add(path) => {
            tree.insert(path, Some(revision.clone()));
        }
        ChangeEvent::Delete(path) => {
            tree.remove(path)?;
        }
        ChangeEvent::Rename { from, to } => {
            tree.remove(from)?;
            tree.insert(to, Some(revision.clone()));
        }
    }
    Ok(())
}

/// Apply every event of `batch` in order
///
/// Stops at the first failing event; the tree is then left partially
/// updated and should not be reused.
pub fn apply_batch(tree: &mut Tree, batch: &ChangeBatch) -> Result<BatchOutcome, ChangeError> {
    let mut outcome = BatchOutcome::default();

    for (position, event) in batch.events().iter().enumerate() {
        trace!(position, kind = ?event.kind(), path = %join_path(event.path()), "applying change");
        apply_event(tree, event, batch.revision()).map_err(|source| ChangeError::Apply {
            position,
            kind: event.kind(),
            path: join_path(event.path()),
            source,
        })?;
        outcome.record(event.kind());
    }

    debug!(
        revision = %batch.revision(),
        added = outcome.added,
        deleted = outcome.deleted,
        renamed = outcome.renamed,
        modified = outcome.modified,
        "applied change batch"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(path: &str) -> Vec<String> {
        crate::tree::path::split_path(path).unwrap()
    }

    #[test]
    fn test_rename_moves_and_stamps() {
        let mut tree = Tree::from_listing("x/y\n", Some("v1".into())).unwrap();
        let batch = ChangeBatch::new("v2", vec![ChangeEvent::Rename { from: p("x/y"), to: p("x/z") }]);

        let outcome = apply_batch(&mut tree, &batch).unwrap();
        assert_eq!(outcome.renamed, 1);
        assert!(outcome.structure_changed());

        assert!(!tree.contains(&p("x/y")));
        let z = tree.get_by_path(&p("x/z")).unwrap();
        assert_eq!(z.version().map(|v| &**v), Some("v2"));
        assert!(tree.contains(&p("x")));
    }

    #[test]
    fn test_modify_only_batch_leaves_structure() {
        let mut tree = Tree::from_listing("a/b\nc\n", Some("v1".into())).unwrap();
        tree.set_indices();
        let before = tree.render();

        let batch = ChangeBatch::from_name_status("v2", "M\ta/b\nM\tc\n").unwrap();
        let outcome = apply_batch(&mut tree, &batch).unwrap();

        assert!(outcome.only_modifications());
        assert_eq!(outcome.modified, 2);
        assert_eq!(tree.render(), before);
    }

    #[test]
    fn test_empty_batch_is_unchanged() {
        let mut tree = Tree::new();
        let outcome = apply_batch(&mut tree, &ChangeBatch::new("v2", Vec::new())).unwrap();
        assert!(outcome.only_modifications());
        assert_eq!(outcome.total(), 0);
    }

    #[test]
    fn test_failure_reports_position() {
        let mut tree = Tree::from_listing("a\n", None).unwrap();
        let batch = ChangeBatch::from_name_status("v2", "A\tb\nD\tmissing\n").unwrap();

        let err = apply_batch(&mut tree, &batch).unwrap_err();
        assert!(matches!(
            err,
            ChangeError::Apply {
                position: 1,
                kind: ChangeKind::Delete,
                ..
            }
        ));
    }

    #[test]
    fn test_delete_deep_directory() {
        let mut tree = Tree::new();
        let deep: Vec<String> = (0..100_000).map(|level| format!("d{level}")).collect();
        tree.insert(&deep, None);
        tree.insert(&p("keep"), None);

        let batch = ChangeBatch::new("v2", vec![ChangeEvent::Delete(p("d0"))]);
        let outcome = apply_batch(&mut tree, &batch).unwrap();
        assert_eq!(outcome.deleted, 1);
        assert_eq!(tree.node_count(), 2);
    }

    #[test]
    fn test_event_accessors() {
        let rename = ChangeEvent::Rename { from: p("a"), to: p("b/c") };
        assert_eq!(rename.kind(), ChangeKind::Rename);
        assert_eq!(rename.path(), p("a").as_slice());
        assert_eq!(rename.new_path(), Some(p("b/c").as_slice()));
        assert_eq!(ChangeEvent::Add(p("a")).new_path(), None);
    }
}
