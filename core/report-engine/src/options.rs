//! FILENAME: core/report-engine/src/options.rs
//! Build options. Every field has a default so a partial JSON object is a
//! valid configuration.

use serde::{Deserialize, Serialize};

/// Default upper bound on distinct rows per report.
pub const DEFAULT_MAX_ROWS: usize = 100_000;

/// Default upper bound on columns per report.
pub const DEFAULT_MAX_COLUMNS: usize = 1_000;

/// How report rows are ordered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RowOrder {
    /// Order in which row keys were first seen. Only meaningful for sequential builds;
    /// parallel builds fall back to `Lexicographic`.
    #[default]
    FirstSeen,
    /// Sorted by row key.
    Lexicographic,
    /// These rows first, in this order, even when empty; any other rows follow
    /// in first-seen order (lexicographic under a parallel build).
    Explicit(Vec<String>),
}

/// Options recognized by `ReportBuilder`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportOptions {
    /// Silently drop items no column fits instead of failing the build.
    #[serde(default)]
    pub drop_unmatched: bool,

    /// Keep every cell's items so the report can be drilled into or re-aggregated.
    /// Costs memory proportional to the input.
    #[serde(default)]
    pub retain_items: bool,

    /// Fail the build when an item fits more than one column.
    #[serde(default)]
    pub strict_assignment: bool,

    /// Reject column lists that do not end in a catch-all column.
    #[serde(default)]
    pub require_catch_all: bool,

    #[serde(default = "default_max_rows")]
    pub max_rows: usize,

    #[serde(default = "default_max_columns")]
    pub max_columns: usize,

    #[serde(default)]
    pub row_order: RowOrder,
}

fn default_max_rows() -> usize {
    DEFAULT_MAX_ROWS
}

fn default_max_columns() -> usize {
    DEFAULT_MAX_COLUMNS
}

impl Default for ReportOptions {
    fn default() -> Self {
        ReportOptions {
            drop_unmatched: false,
            retain_items: false,
            strict_assignment: false,
            require_catch_all: false,
            max_rows: DEFAULT_MAX_ROWS,
            max_columns: DEFAULT_MAX_COLUMNS,
            row_order: RowOrder::FirstSeen,
        }
    }
}

impl ReportOptions {
    pub fn drop_unmatched(mut self, value: bool) -> Self {
        self.drop_unmatched = value;
        self
    }

    pub fn retain_items(mut self, value: bool) -> Self {
        self.retain_items = value;
        self
    }

    pub fn strict_assignment(mut self, value: bool) -> Self {
        self.strict_assignment = value;
        self
    }

    pub fn require_catch_all(mut self, value: bool) -> Self {
        self.require_catch_all = value;
        self
    }

    pub fn max_rows(mut self, limit: usize) -> Self {
        self.max_rows = limit;
        self
    }

    pub fn max_columns(mut self, limit: usize) -> Self {
        self.max_columns = limit;
        self
    }

    pub fn row_order(mut self, order: RowOrder) -> Self {
        self.row_order = order;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ReportOptions::default();
        assert!(!options.drop_unmatched);
        assert!(!options.retain_items);
        assert!(!options.strict_assignment);
        assert_eq!(options.max_rows, DEFAULT_MAX_ROWS);
        assert_eq!(options.row_order, RowOrder::FirstSeen);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let options: ReportOptions = serde_json::from_str(r#"{"retain_items": true}"#).unwrap();
        assert!(options.retain_items);
        assert!(!options.drop_unmatched);
        assert_eq!(options.max_columns, DEFAULT_MAX_COLUMNS);

        let options: ReportOptions =
            serde_json::from_str(r#"{"row_order": {"Explicit": ["B", "A"]}}"#).unwrap();
        assert_eq!(options.row_order, RowOrder::Explicit(vec!["B".to_string(), "A".to_string()]));
    }
}
