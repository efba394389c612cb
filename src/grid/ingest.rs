//! Workbook parsing.
//!
//! Only the first sheet is read. Cells come out as raw [`CellValue`]s;
//! blank-row filtering and the display transform happen in
//! [`UploadGrid::from_rows`].

use super::{CellValue, UploadGrid};
use crate::error::{MeterviewError, Result};
use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use std::io::Cursor;
use std::path::Path;

/// Parse an uploaded workbook from its raw bytes.
///
/// # Errors
///
/// Returns [`MeterviewError::Ingest`] if the bytes are not a readable
/// workbook or it contains no sheets.
pub fn ingest_bytes(bytes: &[u8]) -> Result<UploadGrid> {
    let cursor = Cursor::new(bytes);
    let mut workbook: Xlsx<_> =
        Xlsx::new(cursor).map_err(|e| MeterviewError::Ingest(e.to_string()))?;
    grid_from_workbook(&mut workbook)
}

/// Parse a workbook from disk.
///
/// # Errors
///
/// Returns [`MeterviewError::Ingest`] if the file cannot be opened as a
/// workbook or it contains no sheets.
pub fn ingest_path(path: impl AsRef<Path>) -> Result<UploadGrid> {
    let mut workbook: Xlsx<std::io::BufReader<std::fs::File>> =
        open_workbook(path).map_err(|e: calamine::XlsxError| MeterviewError::Ingest(e.to_string()))?;
    grid_from_workbook(&mut workbook)
}

fn grid_from_workbook<RS>(workbook: &mut Xlsx<RS>) -> Result<UploadGrid>
where
    RS: std::io::Read + std::io::Seek,
{
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| MeterviewError::Ingest("workbook has no sheets".to_string()))?;
    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| MeterviewError::Ingest(e.to_string()))?;
    tracing::debug!(
        target: "grid.ingest",
        sheet = %sheet,
        rows = range.height(),
        cols = range.width(),
        "parsed first sheet"
    );
    Ok(UploadGrid::from_rows(rows_from_range(&range)))
}

fn rows_from_range(range: &Range<Data>) -> Vec<Vec<CellValue>> {
    range
        .rows()
        .map(|row| row.iter().map(cell_from_data).collect())
        .collect()
}

fn cell_from_data(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Blank,
        Data::String(text) => {
            if text.is_empty() {
                CellValue::Blank
            } else {
                CellValue::Text(text.clone())
            }
        }
        Data::Int(value) => CellValue::Number(*value as f64),
        Data::Float(value) => CellValue::Number(*value),
        Data::Bool(value) => CellValue::Text(value.to_string()),
        Data::DateTime(value) => CellValue::Number(value.as_f64()),
        Data::DateTimeIso(text) | Data::DurationIso(text) => CellValue::Text(text.clone()),
        Data::Error(error) => CellValue::Text(format!("{error:?}")),
    }
}
