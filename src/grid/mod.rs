//! Spreadsheet upload ingestion, validation, and submission.
//!
//! An uploaded workbook becomes an [`UploadGrid`]: two same-shaped grids,
//! one preserving exactly what was parsed (`original`, the submission
//! payload) and one with blanks substituted for on-screen rendering
//! (`display`). Validation is advisory; it highlights cells and counts
//! errors but never blocks submission.

mod ingest;
mod validate;

pub use ingest::{ingest_bytes, ingest_path};
pub use validate::{
    default_rules, validate, validate_with, CellFlag, ColumnRule, ColumnSpan, RuleSet,
    ValidationReport,
};

use crate::alert::AlertSink;
use crate::consumption::Stream;
use crate::error::Result;
use crate::relay::{Relay, RelayTarget};
use serde::{Serialize, Serializer};

/// Column index of the enrollment/identifier field.
pub const ID_COLUMN: usize = 3;

/// First of the twelve numeric consumption columns.
pub const FIRST_CONSUMPTION_COLUMN: usize = 6;

/// Column index of the name field checked for stray whitespace.
pub const NAME_COLUMN: usize = 1;

/// Sentinel rendered for a blank identifier cell.
pub const MISSING_ID_SENTINEL: f64 = 404.0;

/// One spreadsheet cell: text, number, or nothing.
#[derive(Clone, Debug, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Blank,
}

impl CellValue {
    /// Blank means an empty cell or an empty string, matching how the
    /// workbook parser represents both.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Blank => true,
            Self::Text(text) => text.is_empty(),
            Self::Number(_) => false,
        }
    }

    /// The numeric reading of this cell, if it has one.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    trimmed.parse().ok()
                }
            }
            Self::Blank => None,
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            // Blank cells go upstream as empty strings, exactly as parsed.
            Self::Blank => serializer.serialize_str(""),
            Self::Text(text) => serializer.serialize_str(text),
            Self::Number(value) => {
                if value.fract() == 0.0 && value.abs() < 9_007_199_254_740_992.0 {
                    serializer.serialize_i64(*value as i64)
                } else {
                    serializer.serialize_f64(*value)
                }
            }
        }
    }
}

impl From<&str> for CellValue {
    fn from(text: &str) -> Self {
        if text.is_empty() {
            Self::Blank
        } else {
            Self::Text(text.to_string())
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// The two parallel grids produced from one upload.
///
/// Invariant: both grids have identical dimensions and differ only where
/// blank cells were substituted for display. Row 0 is the header; fully
/// blank rows never make it in.
#[derive(Clone, Debug, Default)]
pub struct UploadGrid {
    original: Vec<Vec<CellValue>>,
    display: Vec<Vec<CellValue>>,
}

impl UploadGrid {
    /// Build a grid from parsed rows, dropping fully blank rows and
    /// deriving the display copy.
    #[must_use]
    pub fn from_rows(rows: Vec<Vec<CellValue>>) -> Self {
        let original: Vec<Vec<CellValue>> = rows
            .into_iter()
            .filter(|row| !row_is_blank(row))
            .collect();
        let display = original
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .map(|(column, cell)| display_cell(column, cell))
                    .collect()
            })
            .collect();
        Self { original, display }
    }

    /// The grid exactly as parsed; this is what gets submitted.
    #[must_use]
    pub fn original(&self) -> &[Vec<CellValue>] {
        &self.original
    }

    /// The blank-filled grid used for rendering and error highlighting.
    #[must_use]
    pub fn display(&self) -> &[Vec<CellValue>] {
        &self.display
    }

    /// Header row, when the upload had one.
    #[must_use]
    pub fn header(&self) -> Option<&[CellValue]> {
        self.display.first().map(Vec::as_slice)
    }

    /// Display rows below the header.
    #[must_use]
    pub fn data_rows(&self) -> &[Vec<CellValue>] {
        if self.display.is_empty() {
            &[]
        } else {
            &self.display[1..]
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.original.is_empty()
    }
}

fn row_is_blank(row: &[CellValue]) -> bool {
    row.iter().all(|cell| match cell {
        CellValue::Number(value) => *value == 0.0,
        other => other.is_blank(),
    })
}

fn display_cell(column: usize, cell: &CellValue) -> CellValue {
    if !cell.is_blank() {
        return cell.clone();
    }
    if column == ID_COLUMN {
        CellValue::Number(MISSING_ID_SENTINEL)
    } else {
        CellValue::Number(0.0)
    }
}

/// Format a display cell for the review table.
///
/// Numeric cells get en-IN grouping with two decimals; the serial column
/// and the missing-identifier sentinel are left as-is so they still read
/// as identifiers.
#[must_use]
pub fn format_cell(cell: &CellValue, column: usize) -> String {
    let raw = match cell {
        CellValue::Text(text) => text.clone(),
        CellValue::Number(value) => {
            if value.fract() == 0.0 {
                format!("{}", *value as i64)
            } else {
                value.to_string()
            }
        }
        CellValue::Blank => String::new(),
    };
    if column == 0 {
        return raw;
    }
    if column == ID_COLUMN && matches!(cell, CellValue::Number(v) if *v == MISSING_ID_SENTINEL) {
        return raw;
    }
    match cell.as_number() {
        Some(value) => crate::analytics::format_inr(value),
        None => raw,
    }
}

/// Submit the original (pre-blank-filled) grid, header included, to the
/// bulk-ingest path for one stream.
///
/// The outcome is reported verbatim through the alert sink either way.
/// There is no retry and no partial recovery; a failed submission is
/// retried by calling this again.
///
/// # Errors
///
/// Returns the relay error on failure, after the user has been notified.
pub async fn submit(
    grid: &UploadGrid,
    stream: Stream,
    relay: &dyn Relay,
    alerts: &dyn AlertSink,
) -> Result<()> {
    let payload = serde_json::to_value(grid.original())?;
    match relay.invoke(RelayTarget::BulkIngest(stream), Some(payload)).await {
        Ok(response) => {
            alerts.alert(&format!(
                "Data sent to backend. Please refresh the dashboard for the update. Response Status: {}",
                response.status
            ));
            Ok(())
        }
        Err(error) => {
            alerts.alert(&format!("Failed to send data to backend: {error}"));
            tracing::error!(target: "grid.submit", %stream, %error, "bulk ingest failed");
            Err(error)
        }
    }
}
