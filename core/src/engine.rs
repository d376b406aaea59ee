//! Comparison entry points
//!
//! One call to [`DiffEngine::compare`] is one complete pass: options are
//! validated up front, then matching, field diffing, classification and
//! aggregation run to completion and a finished [`DiffResult`] is returned.
//! Nothing is kept between calls.

use crate::classify::SimilarityThresholds;
use crate::error::{RecdiffError, Result};
use crate::matching::{match_records, MatchMode};
use crate::raw_diff::unified_diff;
use crate::record::SnapshotPair;
use crate::result::{aggregate, DiffResult};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Whether cosmetic-only field changes are reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tolerance {
    /// Every raw difference is reported
    #[default]
    Strict,
    /// Changes that vanish under normalization are dropped
    Tolerant,
}

/// Runtime options for a single comparison
#[derive(Debug, Clone, Default)]
pub struct ComparisonOptions {
    pub mode: MatchMode,
    pub tolerance: Tolerance,
    pub thresholds: SimilarityThresholds,
    /// Compare only these columns; `None` compares the whole unioned schema
    pub columns: Option<Vec<String>>,
    /// Attach a unified diff of the verbatim source texts
    pub include_raw_diff: bool,
}

impl ComparisonOptions {
    pub fn new(mode: MatchMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    pub fn tolerant(mut self) -> Self {
        self.tolerance = Tolerance::Tolerant;
        self
    }

    pub fn with_thresholds(mut self, thresholds: SimilarityThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_columns(mut self, columns: Vec<String>) -> Self {
        self.columns = Some(columns);
        self
    }

    pub fn with_raw_diff(mut self) -> Self {
        self.include_raw_diff = true;
        self
    }
}

/// Stateless record-set diff engine
pub struct DiffEngine;

impl DiffEngine {
    /// Compare the two sides of `pair`
    pub fn compare<'a>(pair: &'a SnapshotPair, options: &ComparisonOptions) -> Result<DiffResult<'a>> {
        options.thresholds.validate()?;
        let compared = Self::compared_columns(pair, options)?;
        let raw_diff = Self::raw_diff(pair, options)?;

        log::debug!(
            "Comparing '{}' against '{}' ({} mode, {:?}, {} of {} columns)",
            pair.old_snapshot().name(),
            pair.new_snapshot().name(),
            options.mode.name(),
            options.tolerance,
            compared.len(),
            pair.schema().len()
        );

        let outcome = match_records(pair, &options.mode)?;
        let result = aggregate(pair, outcome, &compared, options, raw_diff);

        let stats = result.statistics();
        log::debug!(
            "Comparison complete: {} added, {} removed, {} modified ({} field changes)",
            stats.added,
            stats.removed,
            stats.records_with_changes,
            stats.total_field_changes
        );

        Ok(result)
    }

    /// Compare many independent pairs in parallel. Results come back in input
    /// order, one per pair.
    pub fn compare_all<'a>(
        pairs: &'a [SnapshotPair],
        options: &ComparisonOptions,
    ) -> Vec<Result<DiffResult<'a>>> {
        pairs
            .par_iter()
            .map(|pair| Self::compare(pair, options))
            .collect()
    }

    fn compared_columns(pair: &SnapshotPair, options: &ComparisonOptions) -> Result<Vec<usize>> {
        let schema = pair.schema();
        let Some(requested) = &options.columns else {
            return Ok((0..schema.len()).collect());
        };

        let mut positions = Vec::with_capacity(requested.len());
        for column in requested {
            let pos = schema.position(column).ok_or_else(|| {
                RecdiffError::configuration(format!(
                    "Column '{column}' is not present in either source"
                ))
            })?;
            positions.push(pos);
        }
        // Output follows schema order regardless of how the list was written
        positions.sort_unstable();
        positions.dedup();
        Ok(positions)
    }

    fn raw_diff(pair: &SnapshotPair, options: &ComparisonOptions) -> Result<Option<String>> {
        if !options.include_raw_diff {
            return Ok(None);
        }

        let old = pair.old_snapshot();
        let new = pair.new_snapshot();
        match (old.text(), new.text()) {
            (Some(old_text), Some(new_text)) => Ok(Some(unified_diff(
                old.name(),
                old_text,
                new.name(),
                new_text,
            ))),
            _ => Err(RecdiffError::configuration(
                "Raw diff requested but the verbatim source text of both sides was not supplied",
            )),
        }
    }
}
