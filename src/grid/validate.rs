//! Declarative grid validation.
//!
//! Each rule binds a column span to an expectation and is evaluated
//! uniformly over the display grid's data rows. Findings are advisory:
//! they drive cell highlighting and one summary alert, never a submission
//! block.

use super::{CellValue, UploadGrid, FIRST_CONSUMPTION_COLUMN, NAME_COLUMN};
use crate::alert::AlertSink;

/// Which columns a rule applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnSpan {
    /// Exactly one column index.
    At(usize),
    /// Every column at or beyond an index.
    From(usize),
}

impl ColumnSpan {
    #[must_use]
    pub fn covers(&self, column: usize) -> bool {
        match self {
            Self::At(index) => column == *index,
            Self::From(index) => column >= *index,
        }
    }
}

/// Per-column cell expectation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnRule {
    /// Cell must be the literal 0 or parse as a number.
    Numeric,
    /// Text must carry no leading or trailing whitespace.
    TrimmedText,
    /// Text must be strictly alphanumeric. Not part of the default rule
    /// set; the upstream data has legitimate punctuation in identifiers.
    CleanText,
}

impl ColumnRule {
    fn violated_by(&self, cell: &CellValue) -> bool {
        match self {
            Self::Numeric => cell.as_number().is_none(),
            Self::TrimmedText => match cell {
                CellValue::Text(text) => text.trim() != text,
                _ => false,
            },
            Self::CleanText => match cell {
                CellValue::Text(text) => {
                    !text.chars().all(|c| c.is_ascii_alphanumeric())
                }
                _ => false,
            },
        }
    }
}

/// An ordered list of (span, rule) pairs.
#[derive(Clone, Debug, Default)]
pub struct RuleSet {
    rules: Vec<(ColumnSpan, ColumnRule)>,
}

impl RuleSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_rule(mut self, span: ColumnSpan, rule: ColumnRule) -> Self {
        self.rules.push((span, rule));
        self
    }

    #[must_use]
    pub fn rules(&self) -> &[(ColumnSpan, ColumnRule)] {
        &self.rules
    }
}

/// The rules the review table enforces: trimmed text in the name column,
/// numbers in every consumption column.
#[must_use]
pub fn default_rules() -> RuleSet {
    RuleSet::new()
        .with_rule(ColumnSpan::At(NAME_COLUMN), ColumnRule::TrimmedText)
        .with_rule(ColumnSpan::From(FIRST_CONSUMPTION_COLUMN), ColumnRule::Numeric)
}

/// One flagged cell. `row` indexes the full grid (header at row 0), so a
/// flag maps straight onto the rendered table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellFlag {
    pub row: usize,
    pub column: usize,
    pub rule: ColumnRule,
}

/// The findings of one validation pass.
#[derive(Clone, Debug, Default)]
pub struct ValidationReport {
    flags: Vec<CellFlag>,
}

impl ValidationReport {
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.flags.len()
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.flags.is_empty()
    }

    #[must_use]
    pub fn flags(&self) -> &[CellFlag] {
        &self.flags
    }

    #[must_use]
    pub fn is_flagged(&self, row: usize, column: usize) -> bool {
        self.flags
            .iter()
            .any(|flag| flag.row == row && flag.column == column)
    }

    /// Surface the advisory alert when there are findings. Submission is
    /// never blocked by this.
    pub fn announce(&self, alerts: &dyn AlertSink) {
        if self.flags.is_empty() {
            return;
        }
        alerts.alert(&format!(
            "Please make sure data is in correct format. Errors: {}. Remove unnecessary spaces and special characters.",
            self.flags.len()
        ));
    }
}

/// Validate a grid against the default rules.
#[must_use]
pub fn validate(grid: &UploadGrid) -> ValidationReport {
    validate_with(grid, &default_rules())
}

/// Single pass over the display grid's data rows; the header is exempt.
/// Re-running on an unchanged grid yields the same report.
#[must_use]
pub fn validate_with(grid: &UploadGrid, rules: &RuleSet) -> ValidationReport {
    let mut flags = Vec::new();
    for (offset, row) in grid.data_rows().iter().enumerate() {
        let row_index = offset + 1;
        for (column, cell) in row.iter().enumerate() {
            for (span, rule) in rules.rules() {
                if span.covers(column) && rule.violated_by(cell) {
                    flags.push(CellFlag {
                        row: row_index,
                        column,
                        rule: *rule,
                    });
                }
            }
        }
    }
    if !flags.is_empty() {
        tracing::info!(
            target: "grid.validate",
            errors = flags.len(),
            "validation found formatting errors"
        );
    }
    ValidationReport { flags }
}
