//! Supplementary line-level diff of the verbatim source texts

use similar::TextDiff;

const CONTEXT_LINES: usize = 3;

/// Unified diff of `old_text` against `new_text` with headers naming both
/// sources. Identical texts give an empty string.
pub fn unified_diff(old_name: &str, old_text: &str, new_name: &str, new_text: &str) -> String {
    let diff = TextDiff::from_lines(old_text, new_text);
    let rendered = diff
        .unified_diff()
        .context_radius(CONTEXT_LINES)
        .missing_newline_hint(false)
        .header(old_name, new_name)
        .to_string();

    rendered.trim_end_matches('\n').to_string()
}
