//! Spreadsheet export of a user's URLs
//!
//! The export is split in two steps: projecting entries into rows (plain data,
//! easy to check) and rendering those rows into an `.xlsx` workbook.

use chrono::{DateTime, Utc};
use rust_xlsxwriter::{DocProperties, ExcelDateTime, Format, Workbook, XlsxError};

use crate::model::UrlEntry;

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub const XLSX_CONTENT_DISPOSITION: &str = "attachment; filename=Generated_URLs.xlsx";

const SHEET_NAME: &str = "Generated_URLs";

/// (header, column width)
const COLUMNS: [(&str, f64); 3] = [("Short URL", 50.0), ("Original URL", 50.0), ("Visits", 10.0)];

/// One spreadsheet row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    pub short_url: String,
    pub original_url: String,
    pub visits: u64,
}

/// Maps entries to rows in stored order, expanding codes to full short URLs.
pub fn export_rows(entries: &[UrlEntry], prefix: &str) -> Vec<ExportRow> {
    entries
        .iter()
        .map(|entry| ExportRow {
            short_url: format!("{prefix}{}", entry.short_url),
            original_url: entry.original_url.clone(),
            visits: entry.visit_count,
        })
        .collect()
}

/// Renders rows into an in-memory `.xlsx` file with a bold header row.
///
/// `author` and `created` end up in the workbook's document properties.
pub fn render_workbook(
    rows: &[ExportRow],
    author: &str,
    created: DateTime<Utc>,
) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let created = ExcelDateTime::from_timestamp(created.timestamp())?;
    let properties = DocProperties::new()
        .set_author(author)
        .set_creation_datetime(&created);
    workbook.set_properties(&properties);

    let bold = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, (header, width)) in COLUMNS.iter().enumerate() {
        let col = u16::try_from(col).map_err(|_| XlsxError::RowColumnLimitError)?;
        worksheet.set_column_width(col, *width)?;
        worksheet.write_string_with_format(0, col, *header, &bold)?;
    }

    for (i, row) in rows.iter().enumerate() {
        let line = u32::try_from(i + 1).map_err(|_| XlsxError::RowColumnLimitError)?;
        worksheet.write_string(line, 0, &row.short_url)?;
        worksheet.write_string(line, 1, &row.original_url)?;
        worksheet.write_number(line, 2, row.visits as f64)?;
    }

    workbook.save_to_buffer()
}
