//! # Incremental namespace trees for dynamic tree edit distance
//!
//! This library maintains a tree mirroring a version-controlled file
//! namespace and advances it revision by revision, producing compact
//! snapshots for an external tree edit distance algorithm.
//!
//! ## Core Algorithm
//!
//! 1. **Baseline**: one `insert` per path of a full listing
//! 2. **Indexing**: number every node in preorder (explicit stack, no recursion)
//! 3. **Batch application**: add/delete/rename events mutate the tree,
//!    deletions prune emptied directories
//! 4. **Snapshot**: nodes known from the previous snapshot are sent as
//!    `[index]`, new or touched nodes as `(label)`
//!
//! ## Usage Example
//!
//! ```
//! use revtree::{Advance, ChangeBatch, Replay, ReplayConfig};
//!
//! let mut replay = Replay::from_listing("src/lib.rs\nREADME\n", "v1", ReplayConfig::default())?;
//! assert_eq!(replay.baseline_snapshot().text(), "(/){(README){}(src){(lib.rs){}}}");
//!
//! let batch = ChangeBatch::from_name_status("v2", "A\tsrc/main.rs\n")?;
//! match replay.advance(&batch)? {
//!     Advance::Snapshot(snapshot) => {
//!         assert_eq!(snapshot.name(), "v1-v2");
//!         assert_eq!(snapshot.text(), "[0]{[1]{}[2]{[3]{}(main.rs){}}}");
//!     }
//!     Advance::Unchanged { .. } => unreachable!(),
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs, missing_debug_implementations)]
#![allow(clippy::new_without_default)]

pub mod change; // Change events, name-status parsing, batch application
pub mod snapshot; // Snapshot rendering and parsing
pub mod tree; // Sorted namespace tree

// Re-exports for convenience
pub use change::{apply_batch, BatchOutcome, ChangeBatch, ChangeError, ChangeEvent, ChangeKind};
pub use snapshot::{ParsedSnapshot, Snapshot, SnapshotError};
pub use tree::{InvariantViolation, Node, PathError, Tree, TreeError, Version};

use thiserror::Error;
use tracing::{debug, warn};

/// Configuration for a replay
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// Skip snapshots for transitions that only modified file contents
    pub drop_unchanged: bool,

    /// Check the sorted-children invariant after every batch
    pub verify_invariants: bool,
}

impl ReplayConfig {
    /// Default configuration: drop unchanged transitions, no extra checks
    pub fn new() -> Self {
        Self {
            drop_unchanged: true,
            verify_invariants: false,
        }
    }

    /// Set whether modify-only transitions produce a snapshot
    pub fn with_drop_unchanged(mut self, enabled: bool) -> Self {
        self.drop_unchanged = enabled;
        self
    }

    /// Enable invariant checks after every batch
    pub fn with_invariant_checks(mut self, enabled: bool) -> Self {
        self.verify_invariants = enabled;
        self
    }
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur during a replay
#[derive(Error, Debug)]
pub enum ReplayError {
    /// Baseline listing contained an invalid path
    #[error("invalid baseline listing: {0}")]
    Listing(#[from] PathError),

    /// Batch could not be applied
    #[error("revision {revision}: {source}")]
    Batch {
        /// Revision of the failing batch
        revision: Version,
        /// Underlying change error
        source: ChangeError,
    },

    /// Tree invariant broken after a batch
    #[error("revision {revision}: {source}")]
    Invariant {
        /// Revision of the batch after which the check failed
        revision: Version,
        /// Violation found
        source: InvariantViolation,
    },

    /// An earlier batch failed; the tree can no longer be trusted
    #[error("replay stopped after failure at revision {revision}")]
    Poisoned {
        /// Revision whose batch failed
        revision: Version,
    },
}

/// Result of advancing a replay by one batch
#[derive(Debug, Clone)]
pub enum Advance {
    /// The transition changed structure (or unchanged snapshots are kept)
    Snapshot(Snapshot),

    /// Modify-only transition; no snapshot produced
    Unchanged {
        /// Revision of the last emitted snapshot
        from: Version,
        /// Revision just applied
        to: Version,
    },
}

/// Single-tree replay driver
///
/// Holds one tree and advances it through successive revisions, in
/// lockstep with whatever consumes the snapshots.
#[derive(Debug)]
pub struct Replay {
    tree: Tree,
    config: ReplayConfig,

    /// Revision of the most recently applied batch
    revision: Version,

    /// Revision of the most recently emitted snapshot
    snapshot_revision: Version,

    /// Revision whose batch failed, if any
    failed_at: Option<Version>,
}

impl Replay {
    /// Wrap an existing tree at `revision`
    pub fn new(tree: Tree, revision: impl Into<Version>, config: ReplayConfig) -> Self {
        let revision = revision.into();
        Self {
            tree,
            config,
            snapshot_revision: revision.clone(),
            revision,
            failed_at: None,
        }
    }

    /// Build the baseline tree from a listing, every node stamped `revision`
    pub fn from_listing(
        listing: &str,
        revision: impl Into<Version>,
        config: ReplayConfig,
    ) -> Result<Self, ReplayError> {
        let revision = revision.into();
        let tree = Tree::from_listing(listing, Some(revision.clone()))?;
        Ok(Self::new(tree, revision, config))
    }

    /// Current tree
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Configuration
    pub fn config(&self) -> &ReplayConfig {
        &self.config
    }

    /// Revision of the most recently applied batch
    pub fn revision(&self) -> &Version {
        &self.revision
    }

    /// Snapshot of the current tree named after the current revision
    ///
    /// On a fresh baseline every node is dirty and unindexed, so the
    /// snapshot carries labels only.
    pub fn baseline_snapshot(&self) -> Snapshot {
        Snapshot::capture(self.revision.to_string(), &self.tree)
    }

    /// Apply one batch and produce the next snapshot
    ///
    /// Indices are reassigned before the batch, so the snapshot refers to
    /// unchanged nodes by their position in the previous snapshot. A
    /// failed batch poisons the replay.
    pub fn advance(&mut self, batch: &ChangeBatch) -> Result<Advance, ReplayError> {
        if let Some(revision) = &self.failed_at {
            return Err(ReplayError::Poisoned {
                revision: revision.clone(),
            });
        }

        self.tree.set_indices();

        let outcome = match apply_batch(&mut self.tree, batch) {
            Ok(outcome) => outcome,
            Err(source) => {
                warn!(revision = %batch.revision(), error = %source, "batch failed, replay poisoned");
                self.failed_at = Some(batch.revision().clone());
                return Err(ReplayError::Batch {
                    revision: batch.revision().clone(),
                    source,
                });
            }
        };

        if self.config.verify_invariants {
            if let Err(source) = self.tree.check_invariants() {
                warn!(revision = %batch.revision(), error = %source, "invariant broken, replay poisoned");
                self.failed_at = Some(batch.revision().clone());
                return Err(ReplayError::Invariant {
                    revision: batch.revision().clone(),
                    source,
                });
            }
        }

        self.revision = batch.revision().clone();

        if self.config.drop_unchanged && outcome.only_modifications() {
            debug!(from = %self.snapshot_revision, to = %self.revision, "structure unchanged, snapshot skipped");
            return Ok(Advance::Unchanged {
                from: self.snapshot_revision.clone(),
                to: self.revision.clone(),
            });
        }

        let name = format!("{}-{}", self.snapshot_revision, self.revision);
        self.snapshot_revision = self.revision.clone();
        Ok(Advance::Snapshot(Snapshot::capture(name, &self.tree)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ReplayConfig::default();
        assert!(config.drop_unchanged);
        assert!(!config.verify_invariants);

        let config = config.with_drop_unchanged(false).with_invariant_checks(true);
        assert!(!config.drop_unchanged);
        assert!(config.verify_invariants);
    }

    #[test]
    fn test_unchanged_transition_keeps_snapshot_base() {
        let mut replay = Replay::from_listing("a\n", "v1", ReplayConfig::default()).unwrap();

        let modify = ChangeBatch::from_name_status("v2", "M\ta\n").unwrap();
        match replay.advance(&modify).unwrap() {
            Advance::Unchanged { from, to } => {
                assert_eq!(&*from, "v1");
                assert_eq!(&*to, "v2");
            }
            Advance::Snapshot(_) => panic!("modify-only batch produced a snapshot"),
        }

        let add = ChangeBatch::from_name_status("v3", "A\tb\n").unwrap();
        match replay.advance(&add).unwrap() {
            Advance::Snapshot(snapshot) => assert_eq!(snapshot.name(), "v1-v3"),
            Advance::Unchanged { .. } => panic!("add produced no snapshot"),
        }
        assert_eq!(&**replay.revision(), "v3");
    }

    #[test]
    fn test_keep_unchanged_emits_snapshot() {
        let config = ReplayConfig::default().with_drop_unchanged(false);
        let mut replay = Replay::from_listing("a\n", "v1", config).unwrap();
        let modify = ChangeBatch::from_name_status("v2", "M\ta\n").unwrap();
        match replay.advance(&modify).unwrap() {
            Advance::Snapshot(snapshot) => {
                assert_eq!(snapshot.name(), "v1-v2");
                assert_eq!(snapshot.text(), "[0]{[1]{}}");
            }
            Advance::Unchanged { .. } => panic!("unchanged snapshot dropped"),
        }
    }

    #[test]
    fn test_failed_batch_poisons_replay() {
        let mut replay = Replay::from_listing("a\n", "v1", ReplayConfig::default()).unwrap();
        let bad = ChangeBatch::from_name_status("v2", "D\tmissing\n").unwrap();
        assert!(matches!(
            replay.advance(&bad),
            Err(ReplayError::Batch { .. })
        ));

        let good = ChangeBatch::from_name_status("v3", "A\tb\n").unwrap();
        match replay.advance(&good) {
            Err(ReplayError::Poisoned { revision }) => assert_eq!(&*revision, "v2"),
            other => panic!("expected poisoned replay, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_listing() {
        assert!(matches!(
            Replay::from_listing("a//b\n", "v1", ReplayConfig::default()),
            Err(ReplayError::Listing(_))
        ));
    }
}
