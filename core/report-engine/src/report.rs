//! FILENAME: core/report-engine/src/report.rs
//! Report - the finished, immutable row x column grid.
//!
//! Cells are stored densely in row-major order; every (row, column) pair has
//! a value, the aggregator identity when no item landed there. Totals are
//! computed once at assembly by merging along each axis.
//!
//! When the report was built with `retain_items`, each cell also owns the
//! items assigned to it. That is what makes drill-down and re-aggregation
//! possible without re-querying; without it those operations fail with
//! `DrillDownUnavailable`.

use log::debug;
use monitor_model::QueryItem;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::aggregator::{AggregationType, Aggregator};
use crate::builder::ReportBuilder;
use crate::column::ColumnHeader;
use crate::dimension::RowDimension;
use crate::error::{ReportError, Result};
use crate::options::{ReportOptions, RowOrder};

/// Counters collected while building.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStats {
    /// Items consumed, including dropped ones.
    pub items_processed: usize,
    /// Items folded into a cell.
    pub items_assigned: usize,
    /// Items no column fit (only with `drop_unmatched`).
    pub items_dropped: usize,
    /// Items that fit more than one non-catch-all column.
    pub ambiguous_assignments: usize,
}

impl BuildStats {
    pub(crate) fn absorb(&mut self, other: &BuildStats) {
        self.items_processed += other.items_processed;
        self.items_assigned += other.items_assigned;
        self.items_dropped += other.items_dropped;
        self.ambiguous_assignments += other.ambiguous_assignments;
    }
}

/// A finished report.
#[derive(Debug, Clone)]
pub struct Report<A: Aggregator> {
    aggregator: A,
    columns: Vec<ColumnHeader>,
    rows: Vec<String>,
    row_index: FxHashMap<String, usize>,
    column_index: FxHashMap<String, usize>,

    /// Row-major cell values, `rows.len() * columns.len()` entries.
    cells: Vec<A::Value>,
    row_totals: Vec<A::Value>,
    column_totals: Vec<A::Value>,
    grand_total: A::Value,

    /// Row-major retained items, present only with `retain_items`.
    retained: Option<Vec<Vec<QueryItem>>>,

    options: ReportOptions,
    stats: BuildStats,
}

impl<A: Aggregator> Report<A> {
    /// Assembles a report from a dense grid and computes all totals.
    pub(crate) fn assemble(
        aggregator: A,
        columns: Vec<ColumnHeader>,
        rows: Vec<String>,
        cells: Vec<A::Value>,
        retained: Option<Vec<Vec<QueryItem>>>,
        options: ReportOptions,
        stats: BuildStats,
    ) -> Self {
        let width = columns.len();

        let row_totals: Vec<A::Value> = if width == 0 {
            vec![aggregator.identity(); rows.len()]
        } else {
            cells
                .chunks(width)
                .map(|row| {
                    row.iter()
                        .cloned()
                        .fold(aggregator.identity(), |acc, v| aggregator.merge(acc, v))
                })
                .collect()
        };

        let mut column_totals = vec![aggregator.identity(); width];
        if width > 0 {
            for row in cells.chunks(width) {
                for (total, value) in column_totals.iter_mut().zip(row) {
                    let acc = std::mem::replace(total, aggregator.identity());
                    *total = aggregator.merge(acc, value.clone());
                }
            }
        }

        let grand_total = row_totals
            .iter()
            .cloned()
            .fold(aggregator.identity(), |acc, v| aggregator.merge(acc, v));

        let row_index = rows
            .iter()
            .enumerate()
            .map(|(i, key)| (key.clone(), i))
            .collect();
        let column_index = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.display_name().to_string(), i))
            .collect();

        Report {
            aggregator,
            columns,
            rows,
            row_index,
            column_index,
            cells,
            row_totals,
            column_totals,
            grand_total,
            retained,
            options,
            stats,
        }
    }

    // ========================================================================
    // SHAPE
    // ========================================================================

    /// Columns in display order.
    pub fn columns(&self) -> &[ColumnHeader] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(ColumnHeader::display_name).collect()
    }

    /// Row identifiers in display order.
    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn aggregator(&self) -> &A {
        &self.aggregator
    }

    pub fn options(&self) -> &ReportOptions {
        &self.options
    }

    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    pub fn retains_items(&self) -> bool {
        self.retained.is_some()
    }

    // ========================================================================
    // LOOKUPS
    // ========================================================================

    fn row_position(&self, row: &str) -> Result<usize> {
        self.row_index
            .get(row)
            .copied()
            .ok_or_else(|| ReportError::UnknownRow(row.to_string()))
    }

    fn column_position(&self, column: &str) -> Result<usize> {
        self.column_index
            .get(column)
            .copied()
            .ok_or_else(|| ReportError::UnknownColumn(column.to_string()))
    }

    fn cell_position(&self, row: &str, column: &str) -> Result<usize> {
        let r = self.row_position(row)?;
        let c = self.column_position(column)?;
        Ok(r * self.columns.len() + c)
    }

    pub fn cell_value(&self, row: &str, column: &str) -> Result<&A::Value> {
        let index = self.cell_position(row, column)?;
        Ok(&self.cells[index])
    }

    pub fn row_total(&self, row: &str) -> Result<&A::Value> {
        let r = self.row_position(row)?;
        Ok(&self.row_totals[r])
    }

    pub fn column_total(&self, column: &str) -> Result<&A::Value> {
        let c = self.column_position(column)?;
        Ok(&self.column_totals[c])
    }

    pub fn grand_total(&self) -> &A::Value {
        &self.grand_total
    }

    /// Cell values of one row, in column order.
    pub fn row_values(&self, row: &str) -> Result<&[A::Value]> {
        let r = self.row_position(row)?;
        let width = self.columns.len();
        Ok(&self.cells[r * width..(r + 1) * width])
    }

    /// Column totals in column order.
    pub fn column_totals(&self) -> &[A::Value] {
        &self.column_totals
    }

    /// Items assigned to one cell. Requires `retain_items`.
    pub fn cell_items(&self, row: &str, column: &str) -> Result<&[QueryItem]> {
        let index = self.cell_position(row, column)?;
        let retained = self.retained.as_ref().ok_or(ReportError::DrillDownUnavailable)?;
        Ok(&retained[index])
    }

    // ========================================================================
    // DRILL-DOWN & RE-AGGREGATION
    // ========================================================================

    /// Re-partitions the items of one cell along a new row dimension and a new
    /// column list, with the same aggregator and options. The child report
    /// owns copies of those items and keeps no link to this report.
    pub fn drill_down(
        &self,
        row: &str,
        column: &str,
        row_dimension: RowDimension,
        columns: Vec<ColumnHeader>,
    ) -> Result<Report<A>> {
        let items = self.cell_items(row, column)?;
        let options = ReportOptions {
            row_order: RowOrder::FirstSeen,
            ..self.options.clone()
        };

        debug!(
            "drilling into ({}, {}): {} items over {} columns",
            row,
            column,
            items.len(),
            columns.len()
        );

        ReportBuilder::new(self.aggregator.clone(), columns, options)?
            .with_row_dimension(row_dimension)
            .build_from(items.iter().cloned())
    }

    /// Rebuilds the same grid with another aggregation function from the
    /// retained items. Rows, columns and item placement are unchanged.
    pub fn reaggregate<B: Aggregator>(&self, aggregator: B) -> Result<Report<B>> {
        let retained = self.retained.as_ref().ok_or(ReportError::DrillDownUnavailable)?;

        let cells: Vec<B::Value> = retained
            .iter()
            .map(|items| {
                items
                    .iter()
                    .fold(aggregator.identity(), |acc, item| aggregator.fold(acc, item))
            })
            .collect();

        Ok(Report::assemble(
            aggregator,
            self.columns.clone(),
            self.rows.clone(),
            cells,
            Some(retained.clone()),
            self.options.clone(),
            self.stats,
        ))
    }
}

// ============================================================================
// NUMERIC ACCESSORS FOR DEFINITION-DRIVEN REPORTS
// ============================================================================

impl Report<AggregationType> {
    /// Final numeric value of a cell under the report's aggregation type.
    pub fn cell_number(&self, row: &str, column: &str) -> Result<f64> {
        Ok(self.cell_value(row, column)?.compute(self.aggregator))
    }

    pub fn row_total_number(&self, row: &str) -> Result<f64> {
        Ok(self.row_total(row)?.compute(self.aggregator))
    }

    pub fn column_total_number(&self, column: &str) -> Result<f64> {
        Ok(self.column_total(column)?.compute(self.aggregator))
    }

    pub fn grand_total_number(&self) -> f64 {
        self.grand_total.compute(self.aggregator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::{Count, MaxOfMeasure, SumOfMeasure};

    fn columns() -> Vec<ColumnHeader> {
        vec![
            ColumnHeader::range("low", "priority", 0.0, 50.0).unwrap(),
            ColumnHeader::range("high", "priority", 51.0, 100.0).unwrap(),
        ]
    }

    fn items() -> Vec<QueryItem> {
        vec![
            QueryItem::new("A").with_attribute("priority", 10).with_measure(10.0),
            QueryItem::new("A").with_attribute("priority", 60).with_measure(60.0),
            QueryItem::new("B").with_attribute("priority", 10).with_measure(10.0),
        ]
    }

    fn build<A: Aggregator>(aggregator: A, options: ReportOptions) -> Report<A> {
        ReportBuilder::new(aggregator, columns(), options)
            .unwrap()
            .build_from(items())
            .unwrap()
    }

    #[test]
    fn test_count_example() {
        let report = build(Count, ReportOptions::default());

        assert_eq!(*report.cell_value("A", "low").unwrap(), 1);
        assert_eq!(*report.cell_value("A", "high").unwrap(), 1);
        assert_eq!(*report.cell_value("B", "low").unwrap(), 1);
        assert_eq!(*report.cell_value("B", "high").unwrap(), 0);
        assert_eq!(*report.row_total("A").unwrap(), 2);
        assert_eq!(*report.column_total("low").unwrap(), 2);
        assert_eq!(*report.grand_total(), 3);
    }

    #[test]
    fn test_sum_example() {
        let report = build(SumOfMeasure, ReportOptions::default());

        assert_eq!(*report.cell_value("A", "low").unwrap(), 10.0);
        assert_eq!(*report.cell_value("A", "high").unwrap(), 60.0);
        assert_eq!(*report.grand_total(), 80.0);
    }

    #[test]
    fn test_unknown_identifiers() {
        let report = build(Count, ReportOptions::default());

        assert_eq!(
            report.cell_value("Z", "low").unwrap_err(),
            ReportError::UnknownRow("Z".to_string())
        );
        assert_eq!(
            report.cell_value("A", "medium").unwrap_err(),
            ReportError::UnknownColumn("medium".to_string())
        );
        assert!(report.row_total("Z").is_err());
        assert!(report.column_total("medium").is_err());
    }

    #[test]
    fn test_row_values_and_shape() {
        let report = build(Count, ReportOptions::default());
        assert_eq!(report.row_values("A").unwrap(), &[1, 1]);
        assert_eq!(report.column_totals(), &[2, 1]);
        assert_eq!(report.column_names(), vec!["low", "high"]);
        assert_eq!(report.row_count(), 2);
        assert_eq!(report.column_count(), 2);
    }

    #[test]
    fn test_non_additive_totals_merge() {
        let report = build(MaxOfMeasure, ReportOptions::default());
        assert_eq!(*report.cell_value("B", "high").unwrap(), None);
        assert_eq!(*report.row_total("A").unwrap(), Some(60.0));
        assert_eq!(*report.column_total("low").unwrap(), Some(10.0));
        assert_eq!(*report.grand_total(), Some(60.0));
    }

    #[test]
    fn test_drill_down_requires_retention() {
        let report = build(Count, ReportOptions::default());
        assert!(!report.retains_items());

        let err = report
            .drill_down("A", "low", RowDimension::ItemKey, columns())
            .unwrap_err();
        assert_eq!(err, ReportError::DrillDownUnavailable);
        assert_eq!(report.reaggregate(SumOfMeasure).unwrap_err(), ReportError::DrillDownUnavailable);
    }

    #[test]
    fn test_drill_down_unknown_cell() {
        let report = build(Count, ReportOptions::default().retain_items(true));
        let err = report
            .drill_down("Z", "low", RowDimension::ItemKey, columns())
            .unwrap_err();
        assert_eq!(err, ReportError::UnknownRow("Z".to_string()));
    }

    #[test]
    fn test_cell_items() {
        let report = build(Count, ReportOptions::default().retain_items(true));
        let low = report.cell_items("A", "low").unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].number("priority"), Some(10.0));
        assert!(report.cell_items("B", "high").unwrap().is_empty());
    }

    #[test]
    fn test_reaggregate() {
        let report = build(Count, ReportOptions::default().retain_items(true));
        let sums = report.reaggregate(SumOfMeasure).unwrap();

        assert_eq!(sums.rows(), report.rows());
        assert_eq!(*sums.cell_value("A", "high").unwrap(), 60.0);
        assert_eq!(*sums.grand_total(), 80.0);
        assert!(sums.retains_items());
    }

    #[test]
    fn test_aggregation_type_numbers() {
        let report = build(AggregationType::Average, ReportOptions::default());
        assert_eq!(report.cell_number("A", "low").unwrap(), 10.0);
        assert_eq!(report.row_total_number("A").unwrap(), 35.0);
        assert_eq!(report.column_total_number("low").unwrap(), 10.0);
        assert_eq!(report.grand_total_number(), 80.0 / 3.0);
        assert_eq!(report.cell_number("B", "high").unwrap(), 0.0);
    }
}
