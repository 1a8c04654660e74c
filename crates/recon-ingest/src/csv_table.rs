use std::path::Path;

use csv::ReaderBuilder;

use crate::error::{IngestError, Result};

/// Raw CSV contents with normalized headers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// 1-based file line of each row, for error messages.
    pub lines: Vec<usize>,
}

impl CsvTable {
    /// Position of a column, matched case-insensitively on normalized text.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let wanted = normalize_header(name);
        self.headers
            .iter()
            .position(|header| header.eq_ignore_ascii_case(&wanted))
    }

    /// Cell at `row`/`column`, empty when the row is short.
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Trims, strips a BOM and collapses inner whitespace (including the
/// line breaks spreadsheet exports leave in multi-line headers).
pub fn normalize_header(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('\u{feff}');
    trimmed.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn normalize_cell(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').to_string()
}

/// Picks the header row among the first few rows.
///
/// Spreadsheet exports often carry a title or a blank banner above the real
/// header. The first row that names every `required` column wins; without
/// required columns, or when none qualifies, the first row is used.
fn detect_header_row(rows: &[Vec<String>], required: &[&str]) -> usize {
    if required.is_empty() {
        return 0;
    }
    let probe = rows.len().min(5);
    rows.iter()
        .take(probe)
        .position(|row| {
            required.iter().all(|name| {
                let wanted = normalize_header(name);
                row.iter()
                    .any(|cell| normalize_header(cell).eq_ignore_ascii_case(&wanted))
            })
        })
        .unwrap_or(0)
}

/// Reads a CSV file using the first row as header.
pub fn read_csv_table(path: &Path) -> Result<CsvTable> {
    read_csv_table_with_headers(path, &[])
}

/// Reads a CSV file, locating the header row that names `required` columns.
///
/// Fully blank lines are skipped. Short rows are padded with empty cells.
pub fn read_csv_table_with_headers(path: &Path, required: &[&str]) -> Result<CsvTable> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|err| IngestError::csv(path, err))?;
    let mut raw_rows: Vec<(usize, Vec<String>)> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| IngestError::csv(path, err))?;
        let line = record
            .position()
            .map(|pos| pos.line() as usize)
            .unwrap_or(raw_rows.len() + 1);
        let row: Vec<String> = record.iter().map(normalize_cell).collect();
        if row.iter().all(|value| value.is_empty()) {
            continue;
        }
        raw_rows.push((line, row));
    }
    if raw_rows.is_empty() {
        return Err(IngestError::EmptyCsv {
            path: path.to_path_buf(),
        });
    }
    let cells: Vec<Vec<String>> = raw_rows.iter().map(|(_, row)| row.clone()).collect();
    let header_index = detect_header_row(&cells, required);
    let headers: Vec<String> = cells[header_index]
        .iter()
        .map(|value| normalize_header(value))
        .collect();
    let mut table = CsvTable {
        headers,
        ..CsvTable::default()
    };
    for (line, record) in raw_rows.into_iter().skip(header_index + 1) {
        let mut row = Vec::with_capacity(table.headers.len());
        for idx in 0..table.headers.len() {
            row.push(record.get(idx).cloned().unwrap_or_default());
        }
        table.rows.push(row);
        table.lines.push(line);
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_whitespace_collapses() {
        assert_eq!(normalize_header("  Order Qty\n(Pack / Case) "), "Order Qty (Pack / Case)");
        assert_eq!(normalize_header("\u{feff}Code"), "Code");
    }

    #[test]
    fn detects_header_below_banner() {
        let rows = vec![
            vec!["Weekly order".to_string(), String::new()],
            vec!["Code".to_string(), "Description".to_string()],
            vec!["1001".to_string(), "Flour".to_string()],
        ];
        assert_eq!(detect_header_row(&rows, &["code", "description"]), 1);
        assert_eq!(detect_header_row(&rows, &[]), 0);
    }

    #[test]
    fn column_lookup_ignores_case() {
        let table = CsvTable {
            headers: vec!["Cost per Unit".to_string()],
            rows: vec![vec!["1.50".to_string()]],
            lines: vec![2],
        };
        assert_eq!(table.column_index("cost  per unit"), Some(0));
        assert_eq!(table.cell(0, 0), "1.50");
        assert_eq!(table.cell(3, 0), "");
    }
}
