//! Excel export

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook, Worksheet};

use super::{Cell, Report};
use crate::models::money::cents_to_units;
use crate::models::validation::format_date;

pub const CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const AMOUNT_FORMAT: &str = "#,##0.00";
const DATE_FORMAT: &str = "dd.mm.yyyy";

/// Excel limits sheet names to 31 characters and forbids a few symbols
pub(crate) fn sheet_name(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            c => c,
        })
        .take(31)
        .collect();
    if cleaned.trim().is_empty() {
        "Podaci".to_string()
    } else {
        cleaned
    }
}

/// Render the report as a single-sheet workbook
pub fn to_xlsx(report: &Report) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let amount = Format::new().set_num_format(AMOUNT_FORMAT);
    let date = Format::new().set_num_format(DATE_FORMAT);

    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(sheet_name(&report.title))
        .context("Invalid worksheet name")?;

    for (col, title) in report.columns.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, title, &header)?;
    }

    for (i, row) in report.rows.iter().enumerate() {
        let r = i as u32 + 1;
        for (col, cell) in row.iter().enumerate() {
            write_cell(worksheet, r, col as u16, cell, &amount, &date)?;
        }
    }

    worksheet.autofit();
    workbook
        .save_to_buffer()
        .context("Failed to write Excel workbook")
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &Cell,
    amount: &Format,
    date: &Format,
) -> Result<()> {
    match cell {
        Cell::Text(s) => {
            worksheet.write_string(row, col, s)?;
        }
        Cell::Int(n) => {
            worksheet.write_number(row, col, *n as f64)?;
        }
        Cell::Amount(cents) => {
            worksheet.write_number_with_format(row, col, cents_to_units(*cents), amount)?;
        }
        Cell::Date(d) => match excel_date(d) {
            Some(value) => {
                worksheet.write_datetime_with_format(row, col, &value, date)?;
            }
            // Excel dates start at 1900
            None => {
                worksheet.write_string(row, col, format_date(*d))?;
            }
        },
        Cell::Empty => {}
    }
    Ok(())
}

fn excel_date(d: &NaiveDate) -> Option<ExcelDateTime> {
    let year = u16::try_from(d.year()).ok()?;
    ExcelDateTime::from_ymd(year, d.month() as u8, d.day() as u8).ok()
}
