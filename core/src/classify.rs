//! Tolerant change classification
//!
//! Re-compares the before/after values of a changed cell after stripping
//! formatting noise, and labels what is left by how much of the text survived.

use crate::error::{RecdiffError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity label for a surfaced field change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Removed,
    MinorChange,
    ModerateChange,
    MajorChange,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ChangeKind::Added => "Added",
            ChangeKind::Removed => "Removed",
            ChangeKind::MinorChange => "Minor Change (Possible Typo)",
            ChangeKind::ModerateChange => "Moderate Change",
            ChangeKind::MajorChange => "Major Change",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChangeClassification {
    pub similarity: f64,
    pub kind: ChangeKind,
}

/// Similarity cut-offs; a ratio must be strictly above a bound to reach it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityThresholds {
    pub minor: f64,
    pub moderate: f64,
}

impl Default for SimilarityThresholds {
    fn default() -> Self {
        Self {
            minor: 0.8,
            moderate: 0.5,
        }
    }
}

impl SimilarityThresholds {
    pub fn new(minor: f64, moderate: f64) -> Result<Self> {
        let thresholds = Self { minor, moderate };
        thresholds.validate()?;
        Ok(thresholds)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("minor", self.minor), ("moderate", self.moderate)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(RecdiffError::configuration(format!(
                    "{name} threshold must be within [0, 1], got {value}"
                )));
            }
        }
        if self.minor < self.moderate {
            return Err(RecdiffError::configuration(format!(
                "minor threshold ({}) must not be below moderate threshold ({})",
                self.minor, self.moderate
            )));
        }
        Ok(())
    }
}

/// Strip formatting noise: lowercase, hyphens and commas become spaces,
/// apostrophes are dropped, runs of spaces collapse, ends are trimmed.
pub fn normalize_for_comparison(value: &str) -> String {
    let spaced: String = value
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '\'' | '\u{2019}'))
        .map(|c| if matches!(c, '-' | ',') { ' ' } else { c })
        .collect();

    spaced
        .split(' ')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

/// Ratio of characters covered by matching blocks, `2*M / (len_a + len_b)`.
///
/// Blocks are found by repeatedly taking the longest common contiguous run
/// and recursing on both sides of it. Ties go to the run starting earliest in
/// `a`, then earliest in `b`, so the result depends only on the two inputs.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    let matched = matching_characters(&a, &b);
    2.0 * matched as f64 / total as f64
}

fn matching_characters(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];

    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, size) = longest_match(a, b, alo, ahi, blo, bhi);
        if size == 0 {
            continue;
        }
        matched += size;
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + size < ahi && j + size < bhi {
            pending.push((i + size, ahi, j + size, bhi));
        }
    }

    matched
}

/// Longest common run inside `a[alo..ahi]` and `b[blo..bhi]` as `(i, j, size)`
fn longest_match(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let width = bhi - blo;
    let mut previous = vec![0usize; width + 1];
    let mut current = vec![0usize; width + 1];
    let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0);

    for i in alo..ahi {
        for j in blo..bhi {
            let col = j - blo + 1;
            if a[i] == b[j] {
                let run = previous[col - 1] + 1;
                current[col] = run;
                if run > best_size {
                    best_i = i + 1 - run;
                    best_j = j + 1 - run;
                    best_size = run;
                }
            } else {
                current[col] = 0;
            }
        }
        std::mem::swap(&mut previous, &mut current);
    }

    (best_i, best_j, best_size)
}

/// Classify a before/after pair, or `None` when the difference is cosmetic.
pub fn classify_change(
    old: &str,
    new: &str,
    thresholds: &SimilarityThresholds,
) -> Option<ChangeClassification> {
    let old = normalize_for_comparison(old);
    let new = normalize_for_comparison(new);
    if old == new {
        return None;
    }

    let similarity = similarity_ratio(&old, &new);
    let kind = if old.is_empty() {
        ChangeKind::Added
    } else if new.is_empty() {
        ChangeKind::Removed
    } else if similarity > thresholds.minor {
        ChangeKind::MinorChange
    } else if similarity > thresholds.moderate {
        ChangeKind::ModerateChange
    } else {
        ChangeKind::MajorChange
    };

    Some(ChangeClassification { similarity, kind })
}
