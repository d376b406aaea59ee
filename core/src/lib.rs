//! # recdiff-core
//!
//! Core library for recdiff - a record-set diff engine that compares two tabular
//! snapshots and reports which records were added, removed, or modified at the
//! field level.
//!
//! Loading sources and rendering reports are left to the caller (see the
//! `recdiff-cli` crate). This crate only turns two aligned tables into one
//! immutable [`DiffResult`].

pub mod classify;
pub mod config;
pub mod differ;
pub mod engine;
pub mod error;
pub mod identity;
pub mod matching;
pub mod raw_diff;
pub mod record;
pub mod result;

// Re-export the most commonly used types for convenience
pub use classify::{classify_change, ChangeClassification, ChangeKind, SimilarityThresholds};
pub use config::Config;
pub use differ::CellChange;
pub use engine::{ComparisonOptions, DiffEngine, Tolerance};
pub use error::{RecdiffError, Result, Side};
pub use identity::IdentityResolver;
pub use matching::{DuplicateKey, KeySpec, MatchMode, RowKey};
pub use record::{Row, SnapshotPair, Table};
pub use result::{DiffResult, DiffStatistics, RowChange, RowChangeKind};
