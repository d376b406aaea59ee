//! Diff result aggregation
//!
//! Turns a matching outcome plus per-pair field differences into one
//! [`DiffResult`]. The result is assembled in a single pass and handed out
//! whole; nothing about it changes after [`aggregate`] returns.

use crate::classify::classify_change;
use crate::differ::{diff_fields, CellChange};
use crate::engine::{ComparisonOptions, Tolerance};
use crate::error::Side;
use crate::matching::{DuplicateKey, MatchOutcome, RowKey};
use crate::record::{RecordView, SnapshotPair};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RowChangeKind {
    Added,
    Removed,
    Modified,
}

/// One record-level change
#[derive(Debug, Clone, Serialize)]
pub struct RowChange<'a> {
    pub kind: RowChangeKind,
    pub key: RowKey,
    /// Changed columns; only ever non-empty for modified records
    pub changes: Vec<CellChange<'a>>,
    pub row_old: Option<RecordView<'a>>,
    pub row_new: Option<RecordView<'a>>,
}

/// Running counters of one comparison
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffStatistics {
    pub total_old_records: usize,
    pub total_new_records: usize,
    pub matched: usize,
    pub added: usize,
    pub removed: usize,
    pub records_with_changes: usize,
    pub total_field_changes: usize,
    pub excluded_old: usize,
    pub excluded_new: usize,
}

/// Complete outcome of comparing two snapshots
#[derive(Debug, Clone, Serialize)]
pub struct DiffResult<'a> {
    mode: &'static str,
    columns: &'a [String],
    added: Vec<RowChange<'a>>,
    removed: Vec<RowChange<'a>>,
    modified: Vec<RowChange<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    raw_diff: Option<String>,
    statistics: DiffStatistics,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    duplicate_keys: Vec<DuplicateKey>,
}

impl<'a> DiffResult<'a> {
    /// Matching mode that produced this result
    pub fn mode(&self) -> &'static str {
        self.mode
    }

    /// Unioned output columns
    pub fn columns(&self) -> &'a [String] {
        self.columns
    }

    pub fn added(&self) -> &[RowChange<'a>] {
        &self.added
    }

    pub fn removed(&self) -> &[RowChange<'a>] {
        &self.removed
    }

    pub fn modified(&self) -> &[RowChange<'a>] {
        &self.modified
    }

    pub fn raw_diff(&self) -> Option<&str> {
        self.raw_diff.as_deref()
    }

    pub fn statistics(&self) -> &DiffStatistics {
        &self.statistics
    }

    pub fn duplicate_keys(&self) -> &[DuplicateKey] {
        &self.duplicate_keys
    }
}

/// Assemble the final result. `compared` holds the schema positions the field
/// differ looks at, in output order.
pub(crate) fn aggregate<'a>(
    pair: &'a SnapshotPair,
    outcome: MatchOutcome,
    compared: &[usize],
    options: &ComparisonOptions,
    raw_diff: Option<String>,
) -> DiffResult<'a> {
    let schema = pair.schema();
    let old_records = pair.old_snapshot().records();
    let new_records = pair.new_snapshot().records();

    let mut statistics = DiffStatistics {
        total_old_records: old_records.len(),
        total_new_records: new_records.len(),
        matched: outcome.matched.len(),
        added: outcome.added.len(),
        removed: outcome.removed.len(),
        excluded_old: outcome.excluded_old,
        excluded_new: outcome.excluded_new,
        ..Default::default()
    };

    let added = outcome
        .added
        .into_iter()
        .map(|unmatched| RowChange {
            kind: RowChangeKind::Added,
            row_old: None,
            row_new: pair.view(Side::New, unmatched.index),
            key: unmatched.key,
            changes: Vec::new(),
        })
        .collect();

    let removed = outcome
        .removed
        .into_iter()
        .map(|unmatched| RowChange {
            kind: RowChangeKind::Removed,
            row_old: pair.view(Side::Old, unmatched.index),
            row_new: None,
            key: unmatched.key,
            changes: Vec::new(),
        })
        .collect();

    let mut modified = Vec::new();
    for matched in outcome.matched {
        let old = &old_records[matched.old_index];
        let new = &new_records[matched.new_index];

        let changes: Vec<CellChange<'a>> = diff_fields(schema, compared, old, new)
            .into_iter()
            .filter_map(|mut change| {
                change.classification =
                    classify_change(change.old, change.new, &options.thresholds);
                match options.tolerance {
                    Tolerance::Tolerant if change.classification.is_none() => None,
                    _ => Some(change),
                }
            })
            .collect();

        if changes.is_empty() {
            continue;
        }

        statistics.records_with_changes += 1;
        statistics.total_field_changes += changes.len();
        modified.push(RowChange {
            kind: RowChangeKind::Modified,
            key: matched.key,
            changes,
            row_old: Some(RecordView::new(schema, old)),
            row_new: Some(RecordView::new(schema, new)),
        });
    }

    DiffResult {
        mode: options.mode.name(),
        columns: schema.columns(),
        added,
        removed,
        modified,
        raw_diff,
        statistics,
        duplicate_keys: outcome.duplicates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::{match_records, KeySpec, MatchMode};
    use crate::record::Table;

    fn keyed_options(tolerance: Tolerance) -> ComparisonOptions {
        ComparisonOptions {
            mode: MatchMode::Keyed(KeySpec::Columns(vec!["id".to_string()])),
            tolerance,
            ..Default::default()
        }
    }

    fn roster_pair() -> SnapshotPair {
        SnapshotPair::new(
            Table::from_values(
                "old",
                &["id", "name", "title"],
                vec![
                    vec!["1", "Alice", "Manager"],
                    vec!["2", "Bob", "Sales-Rep"],
                    vec!["3", "Carol", "Clerk"],
                ],
            ),
            Table::from_values(
                "new",
                &["id", "name", "title"],
                vec![
                    vec!["1", "Alicia", "Director"],
                    vec!["2", "Bob", "sales rep"],
                    vec!["3", "Carol", "Clerk"],
                ],
            ),
        )
    }

    fn run<'a>(pair: &'a SnapshotPair, options: &ComparisonOptions) -> DiffResult<'a> {
        let outcome = match_records(pair, &options.mode).unwrap();
        let compared: Vec<usize> = (0..pair.schema().len()).collect();
        aggregate(pair, outcome, &compared, options, None)
    }

    #[test]
    fn test_one_modified_entry_lists_every_changed_column() {
        let pair = roster_pair();
        let result = run(&pair, &keyed_options(Tolerance::Strict));

        assert_eq!(result.modified().len(), 2);
        let alice = &result.modified()[0];
        assert_eq!(alice.kind, RowChangeKind::Modified);
        let columns: Vec<_> = alice.changes.iter().map(|c| c.column).collect();
        assert_eq!(columns, vec!["name", "title"]);
        assert!(alice.row_old.is_some() && alice.row_new.is_some());

        let stats = result.statistics();
        assert_eq!(stats.matched, 3);
        assert_eq!(stats.records_with_changes, 2);
        assert_eq!(stats.total_field_changes, 3);
    }

    #[test]
    fn test_strict_mode_keeps_cosmetic_changes_unclassified() {
        let pair = roster_pair();
        let result = run(&pair, &keyed_options(Tolerance::Strict));

        let bob = &result.modified()[1];
        assert_eq!(bob.changes.len(), 1);
        assert_eq!(bob.changes[0].old, "Sales-Rep");
        assert!(bob.changes[0].classification.is_none());
    }

    #[test]
    fn test_tolerant_mode_drops_cosmetic_only_records() {
        let pair = roster_pair();
        let result = run(&pair, &keyed_options(Tolerance::Tolerant));

        assert_eq!(result.modified().len(), 1);
        assert_eq!(result.modified()[0].key, RowKey::Values(vec!["1".to_string()]));
        assert!(result
            .modified()[0]
            .changes
            .iter()
            .all(|c| c.classification.is_some()));
        assert_eq!(result.statistics().records_with_changes, 1);
        assert_eq!(result.statistics().total_field_changes, 2);
    }

    #[test]
    fn test_added_and_removed_carry_their_record() {
        let pair = SnapshotPair::new(
            Table::from_values("old", &["id", "name"], vec![vec!["1", "A"]]),
            Table::from_values("new", &["id", "name"], vec![vec!["2", "B"]]),
        );
        let result = run(&pair, &keyed_options(Tolerance::Strict));

        assert_eq!(result.added().len(), 1);
        assert_eq!(result.added()[0].row_new.unwrap().get("name"), Some("B"));
        assert!(result.added()[0].row_old.is_none());
        assert!(result.added()[0].changes.is_empty());
        assert_eq!(result.removed()[0].row_old.unwrap().get("name"), Some("A"));
        assert!(result.modified().is_empty());
    }

    #[test]
    fn test_result_serializes_all_sections() {
        let pair = roster_pair();
        let result = run(&pair, &keyed_options(Tolerance::Tolerant));
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["mode"], "keyed");
        assert_eq!(json["columns"], serde_json::json!(["id", "name", "title"]));
        assert_eq!(json["added"], serde_json::json!([]));
        assert_eq!(json["modified"][0]["key"], serde_json::json!(["1"]));
        assert_eq!(json["modified"][0]["changes"][1]["classification"]["kind"], "major_change");
        assert_eq!(json["modified"][0]["row_new"]["name"], "Alicia");
        assert!(json.get("raw_diff").is_none());
        assert!(json.get("duplicate_keys").is_none());
    }
}
