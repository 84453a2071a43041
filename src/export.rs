use chrono::{DateTime, Local};
use rust_xlsxwriter::{Format, Workbook, XlsxError};

use crate::models::{FieldValue, ResultTable};

/// OpenXML spreadsheet MIME type.
pub const XLSX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub fn export_filename(now: DateTime<Local>) -> String {
    format!("seo_extraction_{}.xlsx", now.format("%Y%m%d_%H%M%S"))
}

/// Serialize a result table into a single-sheet XLSX workbook.
pub fn workbook_bytes(table: &ResultTable) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    let header = Format::new().set_bold();

    for (col, name) in table.columns.iter().enumerate() {
        sheet.write_with_format(0, col as u16, name.as_str(), &header)?;
    }
    for (r, row) in table.rows.iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            match value {
                FieldValue::Text(s) => sheet.write(r as u32 + 1, c as u16, s.as_str())?,
                FieldValue::Count(n) => sheet.write(r as u32 + 1, c as u16, *n as f64)?,
            };
        }
    }

    workbook.save_to_buffer()
}
