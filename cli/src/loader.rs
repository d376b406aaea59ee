//! CSV loading: decoding, delimiter detection and header-keyed rows

use anyhow::{anyhow, Context, Result};
use encoding_rs::Encoding;
use recdiff_core::{Row, Table};
use std::fs;
use std::path::Path;

/// How one source file is read
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Encoding label such as "utf-8", "latin1" or "windows-1252"
    pub encoding: Option<String>,
    pub delimiter: Option<u8>,
    /// Keep the decoded text for the raw diff
    pub keep_text: bool,
}

/// Load a delimited file into a [`Table`] named after its path
pub fn load_table(path: &Path, options: &LoadOptions) -> Result<Table> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let content = decode(&bytes, options.encoding.as_deref())
        .with_context(|| format!("Failed to decode {}", path.display()))?;

    let delimiter = options.delimiter.unwrap_or_else(|| sniff_delimiter(&content));
    log::debug!(
        "Reading {} with delimiter {:?}",
        path.display(),
        delimiter as char
    );

    let mut table = parse_table(&path.display().to_string(), &content, delimiter)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    if options.keep_text {
        table.text = Some(content);
    }
    Ok(table)
}

/// Decode `bytes` with an explicit encoding label, or UTF-8 with a
/// Windows-1252 fallback (common for Excel-exported CSVs)
pub fn decode(bytes: &[u8], label: Option<&str>) -> Result<String> {
    match label {
        Some(label) => {
            let encoding = Encoding::for_label(label.trim().as_bytes())
                .ok_or_else(|| anyhow!("Unknown encoding '{label}'"))?;
            let (decoded, had_errors) = encoding.decode_with_bom_removal(bytes);
            if had_errors {
                return Err(anyhow!("Input is not valid {}", encoding.name()));
            }
            Ok(decoded.into_owned())
        }
        None => {
            let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
            match std::str::from_utf8(bytes) {
                Ok(s) => Ok(s.to_string()),
                Err(_) => {
                    log::debug!("Input is not UTF-8; decoding as Windows-1252");
                    let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
                    Ok(decoded.into_owned())
                }
            }
        }
    }
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
pub fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        if counts.first().copied().unwrap_or(0) <= 1 {
            continue;
        }

        // Lines agreeing with the header width, weighted by that width
        let target = counts[0];
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Parse decoded text: the first record is the header, later records map
/// header names to cells. Short records leave trailing cells absent and
/// surplus cells are dropped.
pub fn parse_table(name: &str, content: &str, delimiter: u8) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut table = Table::new(name, columns);

    for result in reader.records() {
        let record = result?;
        if record.len() > table.columns.len() {
            log::warn!(
                "{}: line {} has {} fields but the header has {}; extra fields ignored",
                name,
                record.position().map(|p| p.line()).unwrap_or_default(),
                record.len(),
                table.columns.len()
            );
        }
        let row: Row = table
            .columns
            .iter()
            .cloned()
            .zip(record.iter().map(str::to_string))
            .collect();
        table.push_row(row);
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_sniff_delimiter() {
        assert_eq!(sniff_delimiter("a,b,c\n1,2,3\n"), b',');
        assert_eq!(sniff_delimiter("a;b;c\n1;2,5;3\n"), b';');
        assert_eq!(sniff_delimiter("a\tb\n1\t2\n"), b'\t');
        assert_eq!(sniff_delimiter("a|b|c|d\n1|2|3|4\n"), b'|');
        assert_eq!(sniff_delimiter(""), b',');
    }

    #[test]
    fn test_decode_falls_back_to_windows_1252() {
        // "café" with a Windows-1252 é
        let bytes = b"name\ncaf\xE9\n";
        assert_eq!(decode(bytes, None).unwrap(), "name\ncafé\n");

        let bom = b"\xEF\xBB\xBFid\n1\n";
        assert_eq!(decode(bom, None).unwrap(), "id\n1\n");
    }

    #[test]
    fn test_decode_with_explicit_label() {
        assert_eq!(decode(b"caf\xE9", Some("latin1")).unwrap(), "café");
        assert!(decode(b"caf\xE9", Some("utf-8")).is_err());
        assert!(decode(b"x", Some("not-an-encoding")).is_err());
    }

    #[test]
    fn test_parse_table_keeps_header_order_and_short_rows() {
        let table = parse_table("t.csv", "id,name,phone\n1,Alice,123\n2,Bob\n", b',').unwrap();

        assert_eq!(table.columns, vec!["id", "name", "phone"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0]["phone"], "123");
        assert!(!table.rows[1].contains_key("phone"));
    }

    #[test]
    fn test_quoted_fields_are_preserved_verbatim() {
        let table = parse_table(
            "t.csv",
            "Name,Post\n\"O'Brien, John\",\" Manager \"\n",
            b',',
        )
        .unwrap();
        assert_eq!(table.rows[0]["Name"], "O'Brien, John");
        assert_eq!(table.rows[0]["Post"], " Manager ");
    }

    #[test]
    fn test_load_table_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "id;name\n1;Alice\n").unwrap();

        let options = LoadOptions {
            keep_text: true,
            ..Default::default()
        };
        let table = load_table(file.path(), &options).unwrap();
        assert_eq!(table.columns, vec!["id", "name"]);
        assert_eq!(table.rows[0]["name"], "Alice");
        assert_eq!(table.text.as_deref(), Some("id;name\n1;Alice\n"));
        assert_eq!(table.name, file.path().display().to_string());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = load_table(Path::new("/nonexistent/old.csv"), &LoadOptions::default())
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}
