//! Strict field-level comparison of a matched record pair

use crate::classify::ChangeClassification;
use crate::record::{Record, Schema};
use serde::Serialize;

/// One column's before/after values within a modified record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellChange<'a> {
    pub column: &'a str,
    pub old: &'a str,
    pub new: &'a str,
    /// Severity verdict from the change classifier, when the change is not cosmetic
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<ChangeClassification>,
}

/// Compare raw values of `old` and `new` at each of `columns` (schema
/// positions, in output order). Absent cells compare as empty strings and no
/// other normalization is applied.
pub fn diff_fields<'a>(
    schema: &'a Schema,
    columns: &[usize],
    old: &'a Record,
    new: &'a Record,
) -> Vec<CellChange<'a>> {
    columns
        .iter()
        .filter_map(|&pos| {
            let before = old.value(pos);
            let after = new.value(pos);
            if before == after {
                return None;
            }
            Some(CellChange {
                column: schema.name(pos)?,
                old: before,
                new: after,
                classification: None,
            })
        })
        .collect()
}
