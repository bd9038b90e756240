//! Tabular reports
//!
//! List pages, Excel exports and PDF exports all render the same `Report`:
//! a title, column headers and typed cells. Entities describe themselves
//! through `Tabular`.

pub mod excel;
pub mod import;
pub mod pdf;

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::money::format_amount;
use crate::models::validation::format_date;

pub use excel::to_xlsx;
pub use import::{ImportError, ImportRow, ImportSheet, RowOutcome};
pub use pdf::to_pdf;

/// One typed cell
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Int(i64),
    /// Amount in cents
    Amount(i64),
    Date(NaiveDate),
    Empty,
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    pub fn opt_text(value: Option<&str>) -> Self {
        match value {
            Some(v) => Cell::Text(v.to_string()),
            None => Cell::Empty,
        }
    }

    pub fn opt_date(value: Option<NaiveDate>) -> Self {
        value.map_or(Cell::Empty, Cell::Date)
    }

    /// Human-readable form used on list pages and in PDFs
    pub fn display(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Int(n) => n.to_string(),
            Cell::Amount(cents) => format_amount(*cents),
            Cell::Date(d) => format_date(*d),
            Cell::Empty => String::new(),
        }
    }

    /// Numbers and amounts are right-aligned
    pub fn is_numeric(&self) -> bool {
        matches!(self, Cell::Int(_) | Cell::Amount(_))
    }
}

/// Something that can be shown as one row of a report
pub trait Tabular {
    /// Column headers; also the header names Excel import matches against
    const COLUMNS: &'static [&'static str];

    fn cells(&self) -> Vec<Cell>;
}

/// A titled table of typed cells
#[derive(Debug, Clone)]
pub struct Report {
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Report {
    pub fn from_rows<T: Tabular>(title: impl Into<String>, rows: &[T]) -> Self {
        Self {
            title: title.into(),
            columns: T::COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: rows.iter().map(Tabular::cells).collect(),
        }
    }
}

/// Row of a list page as handed to templates
#[derive(Debug, Clone, Serialize)]
pub struct DisplayRow {
    pub id: i64,
    pub cells: Vec<DisplayCell>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DisplayCell {
    pub value: String,
    pub numeric: bool,
}

impl DisplayRow {
    pub fn new(id: i64, cells: &[Cell]) -> Self {
        Self {
            id,
            cells: cells
                .iter()
                .map(|c| DisplayCell {
                    value: c.display(),
                    numeric: c.is_numeric(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row {
        name: &'static str,
        amount: i64,
    }

    impl Tabular for Row {
        const COLUMNS: &'static [&'static str] = &["Naziv", "Iznos"];

        fn cells(&self) -> Vec<Cell> {
            vec![Cell::text(self.name), Cell::Amount(self.amount)]
        }
    }

    #[test]
    fn test_report_from_rows() {
        let report = Report::from_rows(
            "Test",
            &[
                Row { name: "a", amount: 100 },
                Row { name: "b", amount: 250 },
            ],
        );
        assert_eq!(report.columns, vec!["Naziv", "Iznos"]);
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.rows[1][1], Cell::Amount(250));
    }

    #[test]
    fn test_cell_display() {
        assert_eq!(Cell::Amount(123_456).display(), "1.234,56");
        assert_eq!(
            Cell::Date(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()).display(),
            "05.01.2024"
        );
        assert_eq!(Cell::Int(3).display(), "3");
        assert_eq!(Cell::opt_text(None).display(), "");
        assert!(Cell::Amount(1).is_numeric());
        assert!(!Cell::text("x").is_numeric());
    }

    #[test]
    fn test_display_row() {
        let row = DisplayRow::new(7, &[Cell::text("a"), Cell::Int(2)]);
        assert_eq!(row.id, 7);
        assert_eq!(row.cells[1].value, "2");
        assert!(row.cells[1].numeric);
    }
}
