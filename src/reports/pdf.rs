//! PDF export
//!
//! A4 portrait table with builtin Helvetica. Builtin fonts only cover
//! WinAnsi, so Croatian letters are reduced to their base letters.

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use printpdf::*;
use std::io::BufWriter;

use super::Report;
use crate::models::validation::format_date;

pub const CONTENT_TYPE: &str = "application/pdf";

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 15.0;
const ROW_HEIGHT: f32 = 5.0;
const FONT_SIZE: f32 = 8.0;
/// Average Helvetica glyph width at `FONT_SIZE`, in mm
const CHAR_WIDTH: f32 = 1.55;
/// Space left for the title block on the first page
const TITLE_BLOCK: f32 = 16.0;

pub(crate) fn transliterate(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'č' | 'ć' => 'c',
            'Č' | 'Ć' => 'C',
            'đ' => 'd',
            'Đ' => 'D',
            'š' => 's',
            'Š' => 'S',
            'ž' => 'z',
            'Ž' => 'Z',
            c if c.is_ascii() => c,
            c if (c as u32) >= 0xA0 && (c as u32) <= 0xFF => c,
            _ => '?',
        })
        .collect()
}

/// Widths in mm, proportional to header length, filling the printable width
pub(crate) fn column_widths(columns: &[String]) -> Vec<f32> {
    let weights: Vec<f32> = columns
        .iter()
        .map(|c| c.chars().count().max(6) as f32)
        .collect();
    let total: f32 = weights.iter().sum();
    let usable = PAGE_WIDTH - 2.0 * MARGIN;
    weights.iter().map(|w| usable * w / total).collect()
}

/// Cut `text` so it fits `width` mm, marking the cut with ".."
pub(crate) fn fit(text: &str, width: f32) -> String {
    let max = ((width - 1.0) / CHAR_WIDTH).floor().max(1.0) as usize;
    let count = text.chars().count();
    if count <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(2).max(1);
    let mut cut: String = text.chars().take(keep).collect();
    cut.push_str("..");
    cut
}

/// Row counts per page; the first page loses room to the title block
pub(crate) fn paginate(rows: usize) -> Vec<usize> {
    let body = PAGE_HEIGHT - 2.0 * MARGIN - 2.0 * ROW_HEIGHT;
    let per_page = (body / ROW_HEIGHT).floor() as usize;
    let first = ((body - TITLE_BLOCK) / ROW_HEIGHT).floor() as usize;

    let mut pages = vec![rows.min(first)];
    let mut left = rows - pages[0];
    while left > 0 {
        let n = left.min(per_page);
        pages.push(n);
        left -= n;
    }
    pages
}

pub fn to_pdf(report: &Report, generated: NaiveDate) -> Result<Vec<u8>> {
    let title = transliterate(&report.title);
    let (doc, first_page, first_layer) =
        PdfDocument::new(&title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| anyhow!("PDF font error: {e}"))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| anyhow!("PDF font error: {e}"))?;

    let widths = column_widths(&report.columns);
    let pages = paginate(report.rows.len());
    let page_count = pages.len();
    let mut rows = report.rows.iter();

    for (index, rows_on_page) in pages.iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page, layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            doc.get_page(page).get_layer(layer)
        };

        let mut y = PAGE_HEIGHT - MARGIN;
        if index == 0 {
            layer.use_text(&title, 14.0, Mm(MARGIN), Mm(y), &bold);
            y -= 7.0;
            let date = format!("Datum: {}", format_date(generated));
            layer.use_text(date, FONT_SIZE, Mm(MARGIN), Mm(y), &font);
            y -= TITLE_BLOCK - 7.0;
        }

        let mut x = MARGIN;
        for (column, width) in report.columns.iter().zip(&widths) {
            let text = fit(&transliterate(column), *width);
            layer.use_text(text, FONT_SIZE, Mm(x), Mm(y), &bold);
            x += width;
        }
        y -= ROW_HEIGHT * 1.5;

        for row in rows.by_ref().take(*rows_on_page) {
            let mut x = MARGIN;
            for (cell, width) in row.iter().zip(&widths) {
                let text = fit(&transliterate(&cell.display()), *width);
                let offset = if cell.is_numeric() {
                    (width - 1.0 - text.chars().count() as f32 * CHAR_WIDTH).max(0.0)
                } else {
                    0.0
                };
                layer.use_text(text, FONT_SIZE, Mm(x + offset), Mm(y), &font);
                x += width;
            }
            y -= ROW_HEIGHT;
        }

        let footer = format!("Stranica {} / {}", index + 1, page_count);
        layer.use_text(
            footer,
            FONT_SIZE,
            Mm(PAGE_WIDTH / 2.0 - 12.0),
            Mm(MARGIN / 2.0),
            &font,
        );
    }

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| anyhow!("PDF save error: {e}"))?;
    buf.into_inner()
        .map_err(|e| anyhow!("PDF buffer error: {e}"))
}
