//! Namespace path splitting and label validation
//!
//! Paths arrive as separator-joined strings (`fs/ext4/inode.c`) and are
//! split into labels before they reach the tree. Labels end up verbatim in
//! snapshots, so the characters of the wire grammar are rejected here.

use thiserror::Error;

use super::SEPARATOR;

/// Characters that delimit the snapshot grammar and cannot appear in labels
pub const RESERVED: [char; 6] = ['(', ')', '{', '}', '[', ']'];

/// Errors for paths rejected at the boundary
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    /// Nothing left after trimming separators
    #[error("empty path")]
    Empty,

    /// Two separators in a row (or a leading separator)
    #[error("empty segment in path '{path}'")]
    EmptySegment {
        /// Offending path
        path: String,
    },

    /// Label contains a character of the snapshot grammar
    #[error("reserved character '{ch}' in path '{path}'")]
    ReservedCharacter {
        /// Offending path
        path: String,
        /// First reserved character found
        ch: char,
    },
}

/// Split a separator-joined path into labels
///
/// Trailing separators are ignored (`a/b/` is `a/b`). Empty segments and
/// reserved characters are rejected.
pub fn split_path(path: &str) -> Result<Vec<String>, PathError> {
    let trimmed = path.trim_end_matches(SEPARATOR);
    if trimmed.is_empty() {
        return Err(PathError::Empty);
    }
    if let Some(ch) = trimmed.chars().find(|ch| RESERVED.contains(ch)) {
        return Err(PathError::ReservedCharacter {
            path: path.to_string(),
            ch,
        });
    }

    let labels: Vec<String> = trimmed.split(SEPARATOR).map(str::to_string).collect();
    if labels.iter().any(String::is_empty) {
        return Err(PathError::EmptySegment {
            path: path.to_string(),
        });
    }
    Ok(labels)
}

/// Join labels back into a separator-joined path
pub fn join_path<S: AsRef<str>>(labels: &[S]) -> String {
    let mut joined = String::new();
    for (i, label) in labels.iter().enumerate() {
        if i > 0 {
            joined.push(SEPARATOR);
        }
        joined.push_str(label.as_ref());
    }
    joined
}

/// Parse a flat listing, one path per line; blank lines are skipped
pub fn parse_listing(listing: &str) -> Result<Vec<Vec<String>>, PathError> {
    listing
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .map(split_path)
        .collect()
}
