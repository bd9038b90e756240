//! Excel import
//!
//! Reads the first worksheet of an uploaded workbook. The first row names
//! the columns; headers are matched case-insensitively so that an exported
//! file can be imported again. Cells are handed to the services as text,
//! in the same shape a user would type them into a form.

use anyhow::{Context, Result};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use rust_xlsxwriter::{Format, Workbook};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;

use crate::models::validation::format_date;

/// Header of the column appended to the result workbook
pub const RESULT_COLUMN: &str = "Rezultat";
pub const ADDED: &str = "Dodano";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ImportError {
    #[error("Datoteka nije ispravna Excel tablica: {0}")]
    Unreadable(String),

    #[error("Tablica je prazna")]
    Empty,

    #[error("Nedostaju stupci: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Tablica ima više od {max} redaka")]
    TooManyRows { max: usize },
}

/// One data row of the sheet
#[derive(Debug, Clone)]
pub struct ImportRow {
    /// 1-based row number in the sheet, header included
    pub line: usize,
    pub values: Vec<String>,
    index: Arc<HashMap<String, usize>>,
}

impl ImportRow {
    /// Trimmed text of the named column; empty if the column is absent
    pub fn get(&self, column: &str) -> &str {
        self.index
            .get(&column.trim().to_lowercase())
            .and_then(|i| self.values.get(*i))
            .map(|v| v.trim())
            .unwrap_or("")
    }
}

#[derive(Debug, Clone)]
pub struct ImportSheet {
    pub headers: Vec<String>,
    pub rows: Vec<ImportRow>,
}

/// What happened to one imported row
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Added(i64),
    Failed(String),
}

impl RowOutcome {
    pub fn text(&self) -> &str {
        match self {
            RowOutcome::Added(_) => ADDED,
            RowOutcome::Failed(message) => message,
        }
    }

    pub fn is_added(&self) -> bool {
        matches!(self, RowOutcome::Added(_))
    }
}

/// Parse the workbook and check that every `required` header is present
pub fn read_sheet(
    bytes: &[u8],
    required: &[&str],
    max_rows: usize,
) -> Result<ImportSheet, ImportError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| ImportError::Unreadable(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ImportError::Empty)?
        .map_err(|e| ImportError::Unreadable(e.to_string()))?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(row) => row.iter().map(cell_text).collect(),
        None => return Err(ImportError::Empty),
    };

    let mut index = HashMap::new();
    for (i, header) in headers.iter().enumerate() {
        index.entry(header.trim().to_lowercase()).or_insert(i);
    }
    let missing: Vec<String> = required
        .iter()
        .filter(|column| !index.contains_key(&column.to_lowercase()))
        .map(|column| column.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ImportError::MissingColumns(missing));
    }

    // range.rows() starts at the range origin, which may not be A1
    let first_line = range.start().map_or(1, |(row, _)| row as usize + 1);
    let index = Arc::new(index);
    let mut data = Vec::new();
    for (offset, row) in rows.enumerate() {
        let values: Vec<String> = row.iter().map(cell_text).collect();
        if values.iter().all(|v| v.trim().is_empty()) {
            continue;
        }
        if data.len() == max_rows {
            return Err(ImportError::TooManyRows { max: max_rows });
        }
        data.push(ImportRow {
            line: first_line + offset + 1,
            values,
            index: Arc::clone(&index),
        });
    }

    Ok(ImportSheet { headers, rows: data })
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => float_text(*f),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| format_date(d.date()))
            .unwrap_or_default(),
        other => other.to_string(),
    }
}

/// Whole numbers without a fraction (OIB, priority), others as "1234,50"
fn float_text(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value).replace('.', ",")
    }
}

/// The uploaded rows with a result column, as an xlsx download
pub fn write_result(sheet: &ImportSheet, outcomes: &[RowOutcome]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(RESULT_COLUMN)?;

    let result_col = sheet.headers.len() as u16;
    for (col, header) in sheet.headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, header, &bold)?;
    }
    worksheet.write_string_with_format(0, result_col, RESULT_COLUMN, &bold)?;

    for (i, (row, outcome)) in sheet.rows.iter().zip(outcomes).enumerate() {
        let r = i as u32 + 1;
        for (col, value) in row.values.iter().enumerate() {
            if !value.is_empty() {
                worksheet.write_string(r, col as u16, value)?;
            }
        }
        worksheet.write_string(r, result_col, outcome.text())?;
    }

    worksheet.autofit();
    workbook
        .save_to_buffer()
        .context("Failed to write import result")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::ExcelDateTime;

    fn workbook(rows: &[&[&str]]) -> Vec<u8> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                worksheet.write_string(r as u32, c as u16, *value).unwrap();
            }
        }
        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn test_headers_case_insensitive() {
        let bytes = workbook(&[&["NAZIV", "Kratica"], &["Portal", "PORT"]]);
        let sheet = read_sheet(&bytes, &["Naziv", "kratica"], 10).unwrap();

        assert_eq!(sheet.rows.len(), 1);
        assert_eq!(sheet.rows[0].get("naziv"), "Portal");
        assert_eq!(sheet.rows[0].get("Kratica"), "PORT");
        assert_eq!(sheet.rows[0].get("Opis"), "");
        assert_eq!(sheet.rows[0].line, 2);
    }

    #[test]
    fn test_missing_required_column() {
        let bytes = workbook(&[&["Naziv"], &["Portal"]]);
        let err = read_sheet(&bytes, &["Naziv", "Kratica"], 10).unwrap_err();
        assert_eq!(err, ImportError::MissingColumns(vec!["Kratica".to_string()]));
        assert_eq!(err.to_string(), "Nedostaju stupci: Kratica");
    }

    #[test]
    fn test_blank_rows_skipped_and_limit_enforced() {
        let bytes = workbook(&[&["Naziv"], &["a"], &[""], &["b"], &["c"]]);
        let sheet = read_sheet(&bytes, &["Naziv"], 3).unwrap();
        assert_eq!(sheet.rows.len(), 3);
        assert_eq!(sheet.rows[1].line, 4);

        let err = read_sheet(&bytes, &["Naziv"], 2).unwrap_err();
        assert_eq!(err, ImportError::TooManyRows { max: 2 });
    }

    #[test]
    fn test_typed_cells_become_form_text() {
        let mut workbook = Workbook::new();
        let date = Format::new().set_num_format("dd.mm.yyyy");
        let worksheet = workbook.add_worksheet();
        worksheet.write_string(0, 0, "Datum").unwrap();
        worksheet.write_string(0, 1, "Iznos").unwrap();
        worksheet.write_string(0, 2, "Prioritet").unwrap();
        let day = ExcelDateTime::from_ymd(2024, 1, 5).unwrap();
        worksheet.write_datetime_with_format(1, 0, &day, &date).unwrap();
        worksheet.write_number(1, 1, 1234.5).unwrap();
        worksheet.write_number(1, 2, 3.0).unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let sheet = read_sheet(&bytes, &[], 10).unwrap();
        let row = &sheet.rows[0];
        assert_eq!(row.get("Datum"), "05.01.2024");
        assert_eq!(row.get("Iznos"), "1234,50");
        assert_eq!(row.get("Prioritet"), "3");
    }

    #[test]
    fn test_garbage_is_unreadable() {
        let err = read_sheet(b"not a workbook", &[], 10).unwrap_err();
        assert!(matches!(err, ImportError::Unreadable(_)));
    }

    #[test]
    fn test_result_workbook_has_result_column() {
        let bytes = workbook(&[&["Naziv"], &["a"], &["b"]]);
        let sheet = read_sheet(&bytes, &["Naziv"], 10).unwrap();
        let outcomes = vec![
            RowOutcome::Added(1),
            RowOutcome::Failed("Naziv: već postoji".to_string()),
        ];
        let result = write_result(&sheet, &outcomes).unwrap();

        let again = read_sheet(&result, &["Naziv", RESULT_COLUMN], 10).unwrap();
        assert_eq!(again.rows[0].get(RESULT_COLUMN), ADDED);
        assert_eq!(again.rows[1].get(RESULT_COLUMN), "Naziv: već postoji");
    }
}
