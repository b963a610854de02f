//! FILENAME: core/report-engine/src/error.rs

use thiserror::Error;

/// Every failure the report engine can surface.
///
/// Configuration errors come back from constructors, build errors abort the
/// whole build, and query errors are returned from lookups on a finished
/// report. None of them leave a partially built report behind.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReportError {
    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------
    #[error("Invalid range for column '{column}': lower bound {lower} is greater than upper bound {upper}")]
    InvalidRange {
        column: String,
        lower: f64,
        upper: f64,
    },

    #[error("Column display name must not be empty")]
    EmptyDisplayName,

    #[error("Duplicate column display name: {0}")]
    DuplicateColumn(String),

    #[error("Duplicate row in explicit row order: {0}")]
    DuplicateRow(String),

    #[error("A report needs at least one column")]
    NoColumns,

    #[error("Last column '{0}' is not a catch-all column")]
    MissingCatchAll(String),

    #[error("Column limit exceeded: {count} columns configured, limit is {limit}")]
    ColumnLimitExceeded { count: usize, limit: usize },

    #[error("Explicit row order lists {count} rows, limit is {limit}")]
    ExplicitRowLimitExceeded { count: usize, limit: usize },

    #[error("Invalid report definition: {0}")]
    InvalidDefinition(String),

    // ------------------------------------------------------------------
    // Build
    // ------------------------------------------------------------------
    #[error(
        "No column matched item with row key '{row_key}' ({columns_scanned} columns scanned, {processed} items processed before failure)"
    )]
    NoMatchingColumn {
        row_key: String,
        processed: usize,
        columns_scanned: usize,
    },

    #[error(
        "Item with row key '{row_key}' matched several columns {columns:?} ({processed} items processed before failure)"
    )]
    AmbiguousAssignment {
        row_key: String,
        columns: Vec<String>,
        processed: usize,
    },

    #[error("Row limit exceeded at row key '{row_key}': limit is {limit} ({processed} items processed before failure)")]
    RowLimitExceeded {
        row_key: String,
        limit: usize,
        processed: usize,
    },

    #[error("Reports do not share the same columns and cannot be merged")]
    IncompatibleColumns,

    #[error("Builders were configured with different options and cannot be merged")]
    IncompatibleOptions,

    // ------------------------------------------------------------------
    // Query
    // ------------------------------------------------------------------
    #[error("Unknown row: {0}")]
    UnknownRow(String),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Drill-down unavailable: items were not retained for this report")]
    DrillDownUnavailable,
}

impl ReportError {
    /// Returns true for errors raised while validating configuration.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            ReportError::InvalidRange { .. }
                | ReportError::EmptyDisplayName
                | ReportError::DuplicateColumn(_)
                | ReportError::DuplicateRow(_)
                | ReportError::NoColumns
                | ReportError::MissingCatchAll(_)
                | ReportError::ColumnLimitExceeded { .. }
                | ReportError::ExplicitRowLimitExceeded { .. }
                | ReportError::InvalidDefinition(_)
        )
    }
}

impl From<serde_json::Error> for ReportError {
    fn from(err: serde_json::Error) -> Self {
        ReportError::InvalidDefinition(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
