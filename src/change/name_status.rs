//! Name-status diff parsing
//!
//! One event per line: a status field, then one path (two for renames),
//! tab separated. Status letters: `A` add, `D` delete, `M` modify,
//! `T` type change (treated as modify), `R<score>` rename.

use super::{ChangeError, ChangeEvent};
use crate::tree::path::split_path;

/// Parse a whole name-status listing; blank lines are skipped
pub fn parse_name_status(text: &str) -> Result<Vec<ChangeEvent>, ChangeError> {
    let mut events = Vec::new();
    for (number, line) in text.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        events.push(parse_line(number + 1, line)?);
    }
    Ok(events)
}

/// Parse a single non-blank name-status line
pub fn parse_line(line_number: usize, line: &str) -> Result<ChangeEvent, ChangeError> {
    let fields: Vec<&str> = if line.contains('\t') {
        line.split('\t').collect()
    } else {
        line.split_whitespace().collect()
    };
    let (status, paths) = fields
        .split_first()
        .ok_or_else(|| malformed(line_number, "missing status"))?;

    let mut letters = status.chars();
    let kind = letters.next().ok_or_else(|| malformed(line_number, "missing status"))?;
    let rest = letters.as_str();

    match kind {
        'R' => {
            if !rest.chars().all(|ch| ch.is_ascii_digit()) {
                return Err(malformed(
                    line_number,
                    format!("invalid rename score '{}'", rest),
                ));
            }
            match paths {
                [from, to] => Ok(ChangeEvent::Rename {
                    from: labels(line_number, from)?,
                    to: labels(line_number, to)?,
                }),
                _ => Err(malformed(
                    line_number,
                    format!("rename needs 2 paths, found {}", paths.len()),
                )),
            }
        }
        'A' | 'D' | 'M' | 'T' => {
            if !rest.is_empty() {
                return Err(malformed(
                    line_number,
                    format!("unknown change kind '{}'", status),
                ));
            }
            let single = match paths {
                [single] => labels(line_number, single)?,
                _ => {
                    return Err(malformed(
                        line_number,
                        format!("'{}' needs 1 path, found {}", kind, paths.len()),
                    ))
                }
            };
            Ok(match kind {
                'A' => ChangeEvent::Add(single),
                'D' => ChangeEvent::Delete(single),
                _ => ChangeEvent::Modify(single),
            })
        }
        _ => Err(malformed(
            line_number,
            format!("unknown change kind '{}'", status),
        )),
    }
}

fn malformed(line: usize, reason: impl Into<String>) -> ChangeError {
    ChangeError::Malformed {
        line,
        reason: reason.into(),
    }
}

fn labels(line: usize, raw: &str) -> Result<Vec<String>, ChangeError> {
    split_path(raw).map_err(|source| ChangeError::InvalidPath { line, source })
}
