//! Tabular documents: the first sheet, first row as header, one unit per row.

use crate::extractor::{extension, file_name, Extractor};
use calamine::{open_workbook_auto, Data, Reader};
use riskiq_core::document::{RawUnit, SourceRef};
use riskiq_core::error::IngestError;
use std::path::Path;

#[derive(Default)]
pub struct SpreadsheetExtractor;

const EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "ods"];

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string().trim().to_string(),
    }
}

/// Render data rows as `column: value` lines, skipping empty cells.
///
/// `row_index` is 0-based over data rows (the header is not counted); rows
/// with no non-empty cells produce no unit but still consume an index.
pub fn units_from_rows<I>(header: &[String], rows: I, source: &str) -> Vec<RawUnit>
where
    I: IntoIterator<Item = Vec<String>>,
{
    rows.into_iter()
        .enumerate()
        .filter_map(|(row_index, cells)| {
            let lines: Vec<String> = cells
                .iter()
                .enumerate()
                .filter(|(_, value)| !value.is_empty())
                .map(|(col, value)| {
                    let column = header
                        .get(col)
                        .filter(|h| !h.is_empty())
                        .cloned()
                        .unwrap_or_else(|| format!("column {}", col + 1));
                    format!("{column}: {value}")
                })
                .collect();
            if lines.is_empty() {
                return None;
            }
            Some(RawUnit {
                text: lines.join("\n"),
                source_ref: SourceRef::row(source, row_index as u32),
            })
        })
        .collect()
}

impl Extractor for SpreadsheetExtractor {
    fn name(&self) -> &'static str {
        "spreadsheet"
    }

    fn supports(&self, path: &Path) -> bool {
        extension(path).is_some_and(|ext| EXTENSIONS.contains(&ext.as_str()))
    }

    fn extract(&self, path: &Path) -> Result<Vec<RawUnit>, IngestError> {
        let extraction_error = |reason: String| IngestError::Extraction {
            path: path.to_path_buf(),
            reason,
        };

        let mut workbook = open_workbook_auto(path).map_err(|e| extraction_error(e.to_string()))?;
        let Some(sheet) = workbook.sheet_names().first().cloned() else {
            return Ok(Vec::new());
        };
        let range = workbook
            .worksheet_range(&sheet)
            .map_err(|e| extraction_error(e.to_string()))?;

        let mut rows = range.rows();
        let Some(header_row) = rows.next() else {
            return Ok(Vec::new());
        };
        let header: Vec<String> = header_row.iter().map(cell_text).collect();
        let data = rows.map(|row| row.iter().map(cell_text).collect::<Vec<_>>());

        Ok(units_from_rows(&header, data, &file_name(path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use riskiq_core::document::Locator;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn rows_render_column_value_pairs() {
        let header = strings(&["Control", "Owner", "Status"]);
        let rows = vec![
            strings(&["MFA", "IT", "Implemented"]),
            strings(&["Backups", "", "Partial"]),
        ];
        let units = units_from_rows(&header, rows, "controls.xlsx");
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].text, "Control: MFA\nOwner: IT\nStatus: Implemented");
        assert_eq!(units[1].text, "Control: Backups\nStatus: Partial");
        assert_eq!(units[1].source_ref.locator, Locator::Row { row_index: 1 });
    }

    #[test]
    fn empty_rows_keep_their_index() {
        let header = strings(&["A"]);
        let rows = vec![strings(&[""]), strings(&["x"])];
        let units = units_from_rows(&header, rows, "s.xlsx");
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].source_ref.locator, Locator::Row { row_index: 1 });
    }

    #[test]
    fn cells_beyond_header_get_positional_names() {
        let units = units_from_rows(&strings(&["A"]), vec![strings(&["1", "2"])], "s.xlsx");
        assert_eq!(units[0].text, "A: 1\ncolumn 2: 2");
    }

    #[test]
    fn supports_workbook_extensions() {
        let e = SpreadsheetExtractor;
        assert!(e.supports(Path::new("risk.xlsx")));
        assert!(e.supports(Path::new("risk.ODS")));
        assert!(!e.supports(Path::new("risk.csv")));
    }

    #[test]
    fn unreadable_workbook_is_an_extraction_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.xlsx");
        std::fs::write(&path, b"not a zip archive").unwrap();
        assert!(matches!(
            SpreadsheetExtractor.extract(&path),
            Err(IngestError::Extraction { .. })
        ));
    }
}
