//! FILENAME: core/report-engine/src/view.rs
//! Report View - a flat, serializable snapshot of a finished report.
//!
//! This is the hand-off format for whatever presentation layer sits above the
//! engine (REST representation, CSV export, ...). It carries no behaviour.

use serde::{Deserialize, Serialize};

use crate::aggregator::{AggregationType, Aggregator};
use crate::report::{BuildStats, Report};

/// One rendered row: its key, cell values in column order, and the row total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowView<T> {
    pub key: String,
    pub cells: Vec<T>,
    pub total: T,
}

/// The whole report as plain data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportView<T> {
    pub columns: Vec<String>,
    pub rows: Vec<RowView<T>>,
    pub column_totals: Vec<T>,
    pub grand_total: T,
    pub stats: BuildStats,
}

impl<A: Aggregator> Report<A> {
    /// Renders the report, mapping every value through `render`.
    pub fn to_view_with<T, F>(&self, render: F) -> ReportView<T>
    where
        F: Fn(&A::Value) -> T,
    {
        let rows = self
            .rows()
            .iter()
            .filter_map(|key| {
                let cells = self.row_values(key).ok()?;
                let total = self.row_total(key).ok()?;
                Some(RowView {
                    key: key.clone(),
                    cells: cells.iter().map(&render).collect(),
                    total: render(total),
                })
            })
            .collect();

        ReportView {
            columns: self.column_names().into_iter().map(String::from).collect(),
            rows,
            column_totals: self.column_totals().iter().map(&render).collect(),
            grand_total: render(self.grand_total()),
            stats: *self.stats(),
        }
    }

    /// Renders the report with values copied as they are.
    pub fn to_view(&self) -> ReportView<A::Value> {
        self.to_view_with(Clone::clone)
    }
}

impl Report<AggregationType> {
    /// Renders final numbers under the report's aggregation type.
    pub fn to_number_view(&self) -> ReportView<f64> {
        let aggregation = *self.aggregator();
        self.to_view_with(|acc| acc.compute(aggregation))
    }
}
