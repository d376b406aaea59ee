//! Record matching
//!
//! Partitions the two sides of a [`SnapshotPair`] into matched pairs,
//! additions and removals. Pairing is decided by position or by key only;
//! the content of non-key fields never influences which records correspond.

use crate::error::{RecdiffError, Result, Side};
use crate::identity::IdentityResolver;
use crate::record::{Record, Schema, SnapshotPair};
use indexmap::IndexMap;
use serde::ser::{SerializeSeq, Serializer};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Identifies a record within one comparison
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RowKey {
    /// Zero-based row position (positional mode)
    Index(usize),
    /// Key-column values, an identity tuple, or a full row (multiset mode)
    Values(Vec<String>),
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowKey::Index(index) => write!(f, "({index},)"),
            RowKey::Values(values) if values.len() == 1 => write!(f, "({:?},)", values[0]),
            RowKey::Values(values) => {
                let parts: Vec<String> = values.iter().map(|v| format!("{v:?}")).collect();
                write!(f, "({})", parts.join(", "))
            }
        }
    }
}

impl Serialize for RowKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            RowKey::Index(index) => {
                let mut seq = serializer.serialize_seq(Some(1))?;
                seq.serialize_element(index)?;
                seq.end()
            }
            RowKey::Values(values) => values.serialize(serializer),
        }
    }
}

/// How keyed mode derives a key from a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySpec {
    /// Tuple of raw values from explicit key columns
    Columns(Vec<String>),
    /// Noise-tolerant identity key
    Identity(IdentityResolver),
}

/// Matching strategy, chosen once per comparison
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Pair rows by index
    Positional,
    /// Pair rows whose keys are equal
    Keyed(KeySpec),
    /// Count-difference whole rows; never pairs anything
    #[default]
    Multiset,
}

impl MatchMode {
    /// Resolve a loose selection of flags into one mode. Positional wins over
    /// a key when both are requested.
    pub fn from_selection(positional: bool, key: Option<KeySpec>) -> Self {
        match (positional, key) {
            (true, Some(_)) => {
                log::warn!("Both positional and keyed matching requested; using positional");
                MatchMode::Positional
            }
            (true, None) => MatchMode::Positional,
            (false, Some(spec)) => MatchMode::Keyed(spec),
            (false, None) => MatchMode::Multiset,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MatchMode::Positional => "positional",
            MatchMode::Keyed(_) => "keyed",
            MatchMode::Multiset => "multiset",
        }
    }
}

/// Records present on both sides under the same key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedPair {
    pub key: RowKey,
    pub old_index: usize,
    pub new_index: usize,
}

/// A record present on one side only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unmatched {
    pub key: RowKey,
    pub index: usize,
}

/// A key that occurred more than once on one side; only the last occurrence
/// takes part in matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateKey {
    pub side: Side,
    pub key: RowKey,
    pub occurrences: usize,
}

#[derive(Debug, Clone, Default)]
pub struct MatchOutcome {
    pub matched: Vec<MatchedPair>,
    pub added: Vec<Unmatched>,
    pub removed: Vec<Unmatched>,
    pub duplicates: Vec<DuplicateKey>,
    /// Records dropped because their identity key came out empty
    pub excluded_old: usize,
    pub excluded_new: usize,
}

/// Partition both sides of `pair` according to `mode`
pub fn match_records(pair: &SnapshotPair, mode: &MatchMode) -> Result<MatchOutcome> {
    let outcome = match mode {
        MatchMode::Positional => match_positional(
            pair.old_snapshot().len(),
            pair.new_snapshot().len(),
        ),
        MatchMode::Keyed(spec) => match_keyed(pair, spec)?,
        MatchMode::Multiset => match_multiset(pair),
    };

    log::debug!(
        "{} matching: {} matched, {} added, {} removed",
        mode.name(),
        outcome.matched.len(),
        outcome.added.len(),
        outcome.removed.len()
    );

    Ok(outcome)
}

fn match_positional(old_len: usize, new_len: usize) -> MatchOutcome {
    let mut outcome = MatchOutcome::default();

    for index in 0..old_len.max(new_len) {
        if index >= old_len {
            outcome.added.push(Unmatched {
                key: RowKey::Index(index),
                index,
            });
        } else if index >= new_len {
            outcome.removed.push(Unmatched {
                key: RowKey::Index(index),
                index,
            });
        } else {
            outcome.matched.push(MatchedPair {
                key: RowKey::Index(index),
                old_index: index,
                new_index: index,
            });
        }
    }

    outcome
}

/// Keyed index of one side: key to the record index of its last occurrence,
/// ordered by first occurrence.
struct KeyedSide {
    entries: IndexMap<RowKey, usize>,
    occurrences: HashMap<RowKey, usize>,
    excluded: usize,
}

fn match_keyed(pair: &SnapshotPair, spec: &KeySpec) -> Result<MatchOutcome> {
    validate_key_spec(pair, spec)?;

    let old = index_side(pair.schema(), pair.old_snapshot().records(), spec);
    let new = index_side(pair.schema(), pair.new_snapshot().records(), spec);

    let mut outcome = MatchOutcome {
        excluded_old: old.excluded,
        excluded_new: new.excluded,
        ..Default::default()
    };

    for (key, &old_index) in &old.entries {
        match new.entries.get(key) {
            Some(&new_index) => outcome.matched.push(MatchedPair {
                key: key.clone(),
                old_index,
                new_index,
            }),
            None => outcome.removed.push(Unmatched {
                key: key.clone(),
                index: old_index,
            }),
        }
    }

    for (key, &new_index) in &new.entries {
        if !old.entries.contains_key(key) {
            outcome.added.push(Unmatched {
                key: key.clone(),
                index: new_index,
            });
        }
    }

    for (side, indexed) in [(Side::Old, &old), (Side::New, &new)] {
        for key in indexed.entries.keys() {
            let occurrences = indexed.occurrences.get(key).copied().unwrap_or(1);
            if occurrences > 1 {
                log::warn!(
                    "Key {key} occurs {occurrences} times in the {side} source; keeping the last occurrence"
                );
                outcome.duplicates.push(DuplicateKey {
                    side,
                    key: key.clone(),
                    occurrences,
                });
            }
        }
        if indexed.excluded > 0 {
            log::warn!(
                "{} {side} record(s) have an empty identity key and were left out of matching",
                indexed.excluded
            );
        }
    }

    Ok(outcome)
}

fn validate_key_spec(pair: &SnapshotPair, spec: &KeySpec) -> Result<()> {
    let required: Vec<&str> = match spec {
        KeySpec::Columns(columns) => {
            if columns.is_empty() {
                return Err(RecdiffError::configuration(
                    "Keyed matching needs at least one key column",
                ));
            }
            columns.iter().map(String::as_str).collect()
        }
        KeySpec::Identity(resolver) => std::iter::once(resolver.primary())
            .chain(resolver.secondary())
            .collect(),
    };

    for column in required {
        for side in [Side::Old, Side::New] {
            if !pair.side(side).has_column(column) {
                return Err(RecdiffError::missing_key_column(column, side));
            }
        }
    }

    Ok(())
}

fn index_side(schema: &Schema, records: &[Record], spec: &KeySpec) -> KeyedSide {
    let positions: Vec<usize> = match spec {
        KeySpec::Columns(columns) => columns
            .iter()
            .filter_map(|column| schema.position(column))
            .collect(),
        KeySpec::Identity(_) => Vec::new(),
    };

    let mut side = KeyedSide {
        entries: IndexMap::new(),
        occurrences: HashMap::new(),
        excluded: 0,
    };

    for (index, record) in records.iter().enumerate() {
        let key = match spec {
            KeySpec::Columns(_) => Some(RowKey::Values(
                positions
                    .iter()
                    .map(|&pos| record.value(pos).to_string())
                    .collect(),
            )),
            KeySpec::Identity(resolver) => resolver.resolve(schema, record),
        };

        let Some(key) = key else {
            side.excluded += 1;
            continue;
        };

        *side.occurrences.entry(key.clone()).or_insert(0) += 1;
        // Later occurrences overwrite earlier ones but keep the first position
        side.entries.insert(key, index);
    }

    side
}

/// Occurrence lists of one distinct row content on each side
#[derive(Default)]
struct Tally {
    old: Vec<usize>,
    new: Vec<usize>,
}

fn match_multiset(pair: &SnapshotPair) -> MatchOutcome {
    let mut tallies: IndexMap<blake3::Hash, Tally> = IndexMap::new();

    for (index, record) in pair.old_snapshot().records().iter().enumerate() {
        tallies.entry(row_fingerprint(record)).or_default().old.push(index);
    }
    for (index, record) in pair.new_snapshot().records().iter().enumerate() {
        tallies.entry(row_fingerprint(record)).or_default().new.push(index);
    }

    let mut outcome = MatchOutcome::default();
    let row_key = |record: &Record| RowKey::Values(record.values().map(str::to_string).collect());

    for tally in tallies.values() {
        if tally.old.len() > tally.new.len() {
            for &index in &tally.old[tally.new.len()..] {
                let record = &pair.old_snapshot().records()[index];
                outcome.removed.push(Unmatched {
                    key: row_key(record),
                    index,
                });
            }
        } else if tally.new.len() > tally.old.len() {
            for &index in &tally.new[tally.old.len()..] {
                let record = &pair.new_snapshot().records()[index];
                outcome.added.push(Unmatched {
                    key: row_key(record),
                    index,
                });
            }
        }
    }

    outcome.removed.sort_by_key(|u| u.index);
    outcome.added.sort_by_key(|u| u.index);
    outcome
}

/// Content fingerprint of a full unioned row. Cells are length-prefixed so
/// that no choice of cell contents can make two different rows collide.
pub fn row_fingerprint(record: &Record) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new();
    for value in record.values() {
        hasher.update(&(value.len() as u64).to_le_bytes());
        hasher.update(value.as_bytes());
    }
    hasher.finalize()
}
