//! Output formatting utilities

use anyhow::Result;
use chrono::{DateTime, Utc};
use recdiff_core::{CellChange, DiffResult, IdentityResolver, RowChange, SnapshotPair};
use serde::Serialize;

/// Render a cell value as a JSON string literal
fn quote(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

fn describe_change(change: &CellChange) -> String {
    match change.classification {
        Some(classification) => format!(
            "{}: '{}' → '{}' [{}, similarity {:.2}]",
            change.column, change.old, change.new, classification.kind, classification.similarity
        ),
        None => format!("{}: '{}' → '{}'", change.column, change.old, change.new),
    }
}

fn describe_record(row: &RowChange) -> String {
    let view = row.row_new.or(row.row_old);
    let cells: Vec<String> = view
        .map(|view| view.iter().map(|(k, v)| format!("{k}={}", quote(v))).collect())
        .unwrap_or_default();
    if cells.is_empty() {
        row.key.to_string()
    } else {
        format!("{}: {}", row.key, cells.join(", "))
    }
}

/// Tree-style printer for terminal output
pub struct PrettyPrinter;

impl PrettyPrinter {
    /// Render a comparison result as a tree
    pub fn format_diff(pair: &SnapshotPair, result: &DiffResult, max_rows: usize) -> String {
        let mut lines = vec![format!(
            "🔍 Diff Results: {} → {} ({} matching)",
            pair.old_snapshot().name(),
            pair.new_snapshot().name(),
            result.mode()
        )];

        Self::push_membership(&mut lines, "➕ Added", result.added(), max_rows);
        Self::push_membership(&mut lines, "➖ Removed", result.removed(), max_rows);

        if result.modified().is_empty() {
            lines.push("├─ ✅ Modified: none".to_string());
        } else {
            lines.push(format!("├─ ✏️ Modified: {}", result.modified().len()));
            Self::push_modified(&mut lines, result.modified(), max_rows, "│  ");
        }

        if !result.duplicate_keys().is_empty() {
            lines.push(format!(
                "├─ ⚠️ Duplicate keys: {} (last occurrence kept)",
                result.duplicate_keys().len()
            ));
        }

        let stats = result.statistics();
        if stats.excluded_old + stats.excluded_new > 0 {
            lines.push(format!(
                "├─ ⚠️ Excluded (empty identity): {} old, {} new",
                stats.excluded_old, stats.excluded_new
            ));
        }

        lines.push(format!(
            "└─ Total: {} added, {} removed, {} modified ({} field changes)",
            result.added().len(),
            result.removed().len(),
            result.modified().len(),
            stats.total_field_changes
        ));

        if let Some(raw) = result.raw_diff() {
            lines.push(String::new());
            lines.push("Raw unified diff:".to_string());
            lines.push(raw.to_string());
        }

        lines.join("\n")
    }

    fn push_membership(lines: &mut Vec<String>, title: &str, rows: &[RowChange], max_rows: usize) {
        if rows.is_empty() {
            lines.push(format!("├─ {title}: none"));
            return;
        }

        lines.push(format!("├─ {title}: {}", rows.len()));
        let shown = rows.len().min(max_rows);
        for (i, row) in rows.iter().take(shown).enumerate() {
            let is_last = i + 1 == shown && rows.len() <= max_rows;
            let marker = if is_last { "└─" } else { "├─" };
            lines.push(format!("│  {marker} {}", describe_record(row)));
        }
        if rows.len() > max_rows {
            lines.push(format!("│  └─ ... and {} more", rows.len() - max_rows));
        }
    }

    fn push_modified(lines: &mut Vec<String>, rows: &[RowChange], max_rows: usize, prefix: &str) {
        let shown = rows.len().min(max_rows);
        for (i, row) in rows.iter().take(shown).enumerate() {
            let is_last = i + 1 == shown && rows.len() <= max_rows;
            let (marker, child) = if is_last { ("└─", "   ") } else { ("├─", "│  ") };
            lines.push(format!("{prefix}{marker} {}", row.key));

            for (j, change) in row.changes.iter().enumerate() {
                let change_marker = if j + 1 == row.changes.len() { "└─" } else { "├─" };
                lines.push(format!(
                    "{prefix}{child}{change_marker} {}",
                    describe_change(change)
                ));
            }
        }
        if rows.len() > max_rows {
            lines.push(format!(
                "{prefix}└─ ... and {} more modified records",
                rows.len() - max_rows
            ));
        }
    }

    /// Heading of a tracked record: its own identity cells, e.g.
    /// `Chan, Tai Man (陳大文)`, falling back to the matching key
    fn tracked_heading(row: &RowChange, identity: Option<&IdentityResolver>) -> String {
        let (Some(identity), Some(view)) = (identity, row.row_old) else {
            return row.key.to_string();
        };

        let primary = view.get(identity.primary()).unwrap_or("").trim();
        let secondary = identity
            .secondary()
            .and_then(|column| view.get(column))
            .map(str::trim)
            .filter(|value| !value.is_empty());
        match secondary {
            Some(secondary) => format!("{primary} ({secondary})"),
            None => primary.to_string(),
        }
    }

    /// Render the change-tracking report: statistics first, then every
    /// continuing record with its classified field changes
    pub fn format_tracking_report(
        pair: &SnapshotPair,
        result: &DiffResult,
        identity: Option<&IdentityResolver>,
        generated: DateTime<Utc>,
    ) -> String {
        let rule = "=".repeat(80);
        let thin = "-".repeat(40);
        let stats = result.statistics();

        let mut lines = vec![
            rule.clone(),
            "CHANGE TRACKING REPORT".to_string(),
            format!("Generated: {}", generated.format("%Y-%m-%d %H:%M:%S")),
            format!("Old: {}", pair.old_snapshot().name()),
            format!("New: {}", pair.new_snapshot().name()),
            rule.clone(),
            String::new(),
            "SUMMARY STATISTICS:".to_string(),
            thin.clone(),
            format!("Total records in old list: {}", stats.total_old_records),
            format!("Total records in new list: {}", stats.total_new_records),
            format!("Common records (analyzed): {}", stats.matched),
            format!("New joiners: {}", stats.added),
            format!("Leavers: {}", stats.removed),
            format!("Records with changes: {}", stats.records_with_changes),
            format!("Total field changes: {}", stats.total_field_changes),
        ];
        if stats.excluded_old + stats.excluded_new > 0 {
            lines.push(format!(
                "Excluded (empty identity): {} old, {} new",
                stats.excluded_old, stats.excluded_new
            ));
        }
        lines.push(String::new());

        if result.modified().is_empty() {
            lines.push("No field changes detected.".to_string());
            return lines.join("\n");
        }

        lines.push("DETAILED CHANGES:".to_string());
        lines.push(rule);
        lines.push(String::new());

        for (i, row) in result.modified().iter().enumerate() {
            lines.push(format!("{}. {}", i + 1, Self::tracked_heading(row, identity)));
            lines.push(thin.clone());
            for change in &row.changes {
                lines.push(format!("   Field: {}", change.column));
                if let Some(classification) = change.classification {
                    lines.push(format!("   Type: {}", classification.kind));
                }
                lines.push(format!("   Old: '{}'", change.old));
                lines.push(format!("   New: '{}'", change.new));
                if let Some(classification) = change.classification {
                    lines.push(format!("   Similarity: {:.2}", classification.similarity));
                }
                lines.push(String::new());
            }
        }

        lines.join("\n")
    }
}

/// Markdown report with one section per change kind
pub struct MarkdownFormatter;

impl MarkdownFormatter {
    pub fn format(result: &DiffResult, max_rows: usize) -> String {
        let mut lines = Vec::new();

        Self::section(&mut lines, "Added", result.added(), max_rows);
        Self::section(&mut lines, "Removed", result.removed(), max_rows);
        Self::section(&mut lines, "Modified", result.modified(), max_rows);

        if let Some(raw) = result.raw_diff() {
            lines.push("\n### Raw unified diff".to_string());
            lines.push("```diff".to_string());
            lines.push(raw.to_string());
            lines.push("```".to_string());
        }

        lines.join("\n")
    }

    fn section(lines: &mut Vec<String>, title: &str, rows: &[RowChange], max_rows: usize) {
        lines.push(format!("### {title}"));
        if rows.is_empty() {
            lines.push("- None".to_string());
            return;
        }
        for row in rows.iter().take(max_rows) {
            lines.push(Self::row(row));
        }
        if rows.len() > max_rows {
            lines.push(format!("- ... and more ({})", title.to_lowercase()));
        }
    }

    fn row(row: &RowChange) -> String {
        if row.changes.is_empty() {
            let kind = format!("{:?}", row.kind).to_uppercase();
            return format!("- {kind} key={}", describe_record(row));
        }

        let mut parts = vec![format!("- MODIFIED key={}", row.key)];
        for change in &row.changes {
            let mut line = format!(
                "  - {}: {} -> {}",
                change.column,
                quote(change.old),
                quote(change.new)
            );
            if let Some(classification) = change.classification {
                line.push_str(&format!(
                    " ({}, similarity {:.2})",
                    classification.kind, classification.similarity
                ));
            }
            parts.push(line);
        }
        parts.join("\n")
    }
}

/// JSON formatter for machine-readable output
pub struct JsonFormatter;

#[derive(Serialize)]
struct JsonReport<'r, 'a> {
    generated: String,
    old: &'r str,
    new: &'r str,
    #[serde(flatten)]
    result: &'r DiffResult<'a>,
}

impl JsonFormatter {
    pub fn format(
        pair: &SnapshotPair,
        result: &DiffResult,
        generated: DateTime<Utc>,
    ) -> Result<String> {
        let report = JsonReport {
            generated: generated.to_rfc3339(),
            old: pair.old_snapshot().name(),
            new: pair.new_snapshot().name(),
            result,
        };
        Ok(serde_json::to_string_pretty(&report)?)
    }
}

/// One-line machine-readable counts
pub fn format_summary(result: &DiffResult) -> String {
    format!(
        "added={} removed={} modified={}",
        result.added().len(),
        result.removed().len(),
        result.modified().len()
    )
}
