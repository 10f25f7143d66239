//! Line-level diffing between two snapshots.
//!
//! The baseline strategy is a positional heuristic, not a sequence
//! alignment. Inserting or deleting a line in the middle of a file shifts
//! every following line and is reported as a run of modifications or
//! additions. Downstream consumers rely on that output, so it stays as is;
//! [`DiffMode::Lcs`] is the alignment-based alternative.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use similar::{Algorithm, DiffOp};

/// One line-level difference. Indices are zero-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeEvent {
    /// `line` is present at `index` in the new content.
    Added { line: String, index: usize },
    /// `line` was at `index` in the old content and is gone.
    Removed { line: String, index: usize },
    /// The line at `index` changed from `old` to `new`.
    Modified {
        old: String,
        new: String,
        index: usize,
    },
}

impl ChangeEvent {
    #[must_use]
    pub const fn index(&self) -> usize {
        match self {
            Self::Added { index, .. } | Self::Removed { index, .. } | Self::Modified { index, .. } => {
                *index
            }
        }
    }

    /// Label used in logs and metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Added { .. } => "added",
            Self::Removed { .. } => "removed",
            Self::Modified { .. } => "modified",
        }
    }
}

/// Which diff strategy to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiffMode {
    /// Set difference plus positional comparison.
    #[default]
    Baseline,
    /// Myers longest-common-subsequence alignment.
    Lcs,
}

impl DiffMode {
    /// Compare `old` against `new`.
    #[must_use]
    pub fn diff(self, old: &[String], new: &[String]) -> Vec<ChangeEvent> {
        match self {
            Self::Baseline => baseline_diff(old, new),
            Self::Lcs => lcs_diff(old, new),
        }
    }
}

/// Positional diff.
///
/// 1. Every line value of `new` absent from `old` is `Added` once, at its
///    first index, in `new` order.
/// 2. Every index past the end of `old` is `Added`. Indices already
///    reported by step 1 are not repeated.
/// 3. Same length: every differing position is `Modified`.
/// 4. Shorter: every index past the end of `new` is `Removed`.
///
/// A line substituted with a brand-new value is reported both as `Added`
/// (step 1) and as `Modified` (step 3).
#[must_use]
pub fn baseline_diff(old: &[String], new: &[String]) -> Vec<ChangeEvent> {
    let old_values: HashSet<&str> = old.iter().map(String::as_str).collect();
    let mut reported: HashSet<&str> = HashSet::new();
    let mut changes = Vec::new();

    for (index, line) in new.iter().enumerate() {
        let unseen = !old_values.contains(line.as_str()) && reported.insert(line.as_str());
        if unseen || index >= old.len() {
            changes.push(ChangeEvent::Added {
                line: line.clone(),
                index,
            });
        }
    }

    if new.len() == old.len() {
        for (index, (before, after)) in old.iter().zip(new).enumerate() {
            if before != after {
                changes.push(ChangeEvent::Modified {
                    old: before.clone(),
                    new: after.clone(),
                    index,
                });
            }
        }
    } else if new.len() < old.len() {
        for (index, line) in old.iter().enumerate().skip(new.len()) {
            changes.push(ChangeEvent::Removed {
                line: line.clone(),
                index,
            });
        }
    }

    changes
}

/// Alignment-based diff.
///
/// `Added` and `Modified` carry indices into `new`, `Removed` into `old`.
/// Replaced runs pair up line by line as `Modified`; any surplus becomes
/// `Added` or `Removed`.
#[must_use]
pub fn lcs_diff(old: &[String], new: &[String]) -> Vec<ChangeEvent> {
    let mut changes = Vec::new();

    for op in similar::capture_diff_slices(Algorithm::Myers, old, new) {
        match op {
            DiffOp::Equal { .. } => {}
            DiffOp::Delete {
                old_index, old_len, ..
            } => push_removed(&mut changes, old, old_index..old_index + old_len),
            DiffOp::Insert {
                new_index, new_len, ..
            } => push_added(&mut changes, new, new_index..new_index + new_len),
            DiffOp::Replace {
                old_index,
                old_len,
                new_index,
                new_len,
            } => {
                let paired = old_len.min(new_len);
                for offset in 0..paired {
                    changes.push(ChangeEvent::Modified {
                        old: old[old_index + offset].clone(),
                        new: new[new_index + offset].clone(),
                        index: new_index + offset,
                    });
                }
                push_removed(&mut changes, old, old_index + paired..old_index + old_len);
                push_added(&mut changes, new, new_index + paired..new_index + new_len);
            }
        }
    }

    changes
}

fn push_added(changes: &mut Vec<ChangeEvent>, new: &[String], range: std::ops::Range<usize>) {
    changes.extend(range.map(|index| ChangeEvent::Added {
        line: new[index].clone(),
        index,
    }));
}

fn push_removed(changes: &mut Vec<ChangeEvent>, old: &[String], range: std::ops::Range<usize>) {
    changes.extend(range.map(|index| ChangeEvent::Removed {
        line: old[index].clone(),
        index,
    }));
}
