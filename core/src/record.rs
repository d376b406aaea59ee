//! Tabular snapshot model
//!
//! A [`Table`] is what a loader hands over: its own header list and the raw
//! string-keyed rows. Before comparison both tables are aligned once against a
//! unioned [`Schema`] into a [`SnapshotPair`], so every [`Record`] has one slot
//! per unioned column and an explicit `None` for cells its source never had.

use crate::error::Side;
use indexmap::IndexMap;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// One loaded row: column name to raw cell value, in header order
pub type Row = IndexMap<String, String>;

/// Loader output for a single source
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    /// Verbatim source text, only needed for the supplementary raw diff
    pub text: Option<String>,
}

impl Table {
    pub fn new<S: Into<String>>(name: S, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
            text: None,
        }
    }

    /// Build a table from positional cell values matching `columns`.
    /// Rows shorter than the header leave the trailing cells absent.
    pub fn from_values<S, I, R, V>(name: S, columns: &[&str], rows: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let mut table = Self::new(name, columns.iter().map(|c| c.to_string()).collect());
        for values in rows {
            let row: Row = table
                .columns
                .iter()
                .cloned()
                .zip(values.into_iter().map(Into::into))
                .collect();
            table.rows.push(row);
        }
        table
    }

    pub fn with_text<S: Into<String>>(mut self, text: S) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn push_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Unioned column list: old-source order first, then new-only columns appended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<String>,
    positions: HashMap<String, usize>,
}

impl Schema {
    pub fn union(old: &[String], new: &[String]) -> Self {
        let mut columns = Vec::with_capacity(old.len() + new.len());
        let mut positions = HashMap::new();

        for name in old.iter().chain(new.iter()) {
            if !positions.contains_key(name) {
                positions.insert(name.clone(), columns.len());
                columns.push(name.clone());
            }
        }

        Self { columns, positions }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.columns.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// A row aligned to a [`Schema`]; immutable once built
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    cells: Vec<Option<String>>,
}

impl Record {
    fn align(schema: &Schema, row: &Row) -> Self {
        let mut cells = vec![None; schema.len()];
        for (name, value) in row {
            if let Some(pos) = schema.position(name) {
                cells[pos] = Some(value.clone());
            }
        }
        Self { cells }
    }

    /// Cell at `index`, `None` when the source never had it
    pub fn get(&self, index: usize) -> Option<&str> {
        self.cells.get(index).and_then(|c| c.as_deref())
    }

    /// Cell at `index` with absent cells read as the empty string
    pub fn value(&self, index: usize) -> &str {
        self.get(index).unwrap_or("")
    }

    /// Every unioned cell in schema order, absent cells read as empty
    pub fn values(&self) -> impl Iterator<Item = &str> + '_ {
        self.cells.iter().map(|c| c.as_deref().unwrap_or(""))
    }

    pub fn width(&self) -> usize {
        self.cells.len()
    }
}

/// Read-only view pairing a record with the schema that names its cells.
/// Serializes as a map of the cells that are present.
#[derive(Debug, Clone, Copy)]
pub struct RecordView<'a> {
    schema: &'a Schema,
    record: &'a Record,
}

impl<'a> RecordView<'a> {
    pub fn new(schema: &'a Schema, record: &'a Record) -> Self {
        Self { schema, record }
    }

    pub fn record(&self) -> &'a Record {
        self.record
    }

    pub fn get(&self, column: &str) -> Option<&'a str> {
        self.schema
            .position(column)
            .and_then(|pos| self.record.get(pos))
    }

    /// Present cells as `(column, value)` in schema order
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        let schema = self.schema;
        let record = self.record;
        schema
            .columns()
            .iter()
            .enumerate()
            .filter_map(move |(pos, name)| record.get(pos).map(|v| (name.as_str(), v)))
    }
}

impl Serialize for RecordView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (column, value) in self.iter() {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

/// One source after alignment
#[derive(Debug, Clone)]
pub struct Snapshot {
    name: String,
    headers: HashSet<String>,
    records: Vec<Record>,
    text: Option<String>,
}

impl Snapshot {
    fn align(schema: &Schema, table: Table) -> Self {
        let records = table
            .rows
            .iter()
            .map(|row| Record::align(schema, row))
            .collect();

        Self {
            name: table.name,
            headers: table.columns.into_iter().collect(),
            records,
            text: table.text,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this source's own header list contains `column`
    pub fn has_column(&self, column: &str) -> bool {
        self.headers.contains(column)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Both sources aligned against one unioned schema
#[derive(Debug, Clone)]
pub struct SnapshotPair {
    schema: Schema,
    old: Snapshot,
    new: Snapshot,
}

impl SnapshotPair {
    pub fn new(old: Table, new: Table) -> Self {
        let schema = Schema::union(&old.columns, &new.columns);
        let old = Snapshot::align(&schema, old);
        let new = Snapshot::align(&schema, new);

        log::debug!(
            "Aligned {} old and {} new records over {} columns",
            old.len(),
            new.len(),
            schema.len()
        );

        Self { schema, old, new }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn old_snapshot(&self) -> &Snapshot {
        &self.old
    }

    pub fn new_snapshot(&self) -> &Snapshot {
        &self.new
    }

    pub fn side(&self, side: Side) -> &Snapshot {
        match side {
            Side::Old => &self.old,
            Side::New => &self.new,
        }
    }

    pub fn view(&self, side: Side, index: usize) -> Option<RecordView<'_>> {
        self.side(side)
            .records()
            .get(index)
            .map(|record| RecordView::new(&self.schema, record))
    }
}
