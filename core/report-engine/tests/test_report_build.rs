//! FILENAME: tests/test_report_build.rs
//! Integration tests for sequential report builds.

mod common;

use common::{assert_totals_consistent, TaskFixture};
use report_engine::{
    Aggregator, ColumnHeader, Count, MinOfMeasure, QueryItem, ReportBuilder, ReportError,
    ReportOptions, RowDimension, SumOfMeasure,
};

// ============================================================================
// WORKED EXAMPLES
// ============================================================================

fn example_items() -> Vec<QueryItem> {
    vec![
        QueryItem::new("A").with_attribute("priority", 10).with_measure(10.0),
        QueryItem::new("A").with_attribute("priority", 60).with_measure(60.0),
        QueryItem::new("B").with_attribute("priority", 10).with_measure(10.0),
    ]
}

#[test]
fn test_count_report_example() {
    let report = ReportBuilder::new(Count, TaskFixture::priority_columns(), ReportOptions::default())
        .unwrap()
        .build_from(example_items())
        .unwrap();

    assert_eq!(*report.cell_value("A", "low").unwrap(), 1);
    assert_eq!(*report.cell_value("A", "high").unwrap(), 1);
    assert_eq!(*report.cell_value("B", "low").unwrap(), 1);
    assert_eq!(*report.cell_value("B", "high").unwrap(), 0);
    assert_eq!(*report.row_total("A").unwrap(), 2);
    assert_eq!(*report.column_total("low").unwrap(), 2);
    assert_eq!(*report.grand_total(), 3);
}

#[test]
fn test_sum_report_example() {
    let report = ReportBuilder::new(SumOfMeasure, TaskFixture::priority_columns(), ReportOptions::default())
        .unwrap()
        .build_from(example_items())
        .unwrap();

    assert_eq!(*report.cell_value("A", "low").unwrap(), 10.0);
    assert_eq!(*report.cell_value("A", "high").unwrap(), 60.0);
}

#[test]
fn test_unknown_row_lookup() {
    let report = ReportBuilder::new(Count, TaskFixture::priority_columns(), ReportOptions::default())
        .unwrap()
        .build_from(example_items())
        .unwrap();

    assert_eq!(
        report.cell_value("Z", "low").unwrap_err(),
        ReportError::UnknownRow("Z".to_string())
    );
}

// ============================================================================
// PROPERTIES
// ============================================================================

#[test]
fn test_catch_all_never_fails() {
    let mut items = TaskFixture::generated(500);
    items.push(QueryItem::new("NO-PRIORITY"));
    items.push(QueryItem::new("TEXT-PRIORITY").with_attribute("priority", "urgent"));

    let report = ReportBuilder::new(Count, TaskFixture::exhaustive_priority_columns(), ReportOptions::default())
        .unwrap()
        .build_from(items)
        .unwrap();

    assert_eq!(*report.row_total("NO-PRIORITY").unwrap(), 1);
    assert_eq!(*report.cell_value("TEXT-PRIORITY", "other").unwrap(), 1);
}

#[test]
fn test_count_grand_total_equals_item_count() {
    let items = TaskFixture::generated(777);
    let report = ReportBuilder::new(Count, TaskFixture::exhaustive_priority_columns(), ReportOptions::default())
        .unwrap()
        .build_from(items)
        .unwrap();

    assert_eq!(*report.grand_total(), 777);
    assert_eq!(report.stats().items_assigned, 777);
}

#[test]
fn test_additive_totals_agree() {
    let report = ReportBuilder::new(SumOfMeasure, TaskFixture::state_columns(), ReportOptions::default())
        .unwrap()
        .build_from(TaskFixture::generated(300))
        .unwrap();

    assert!(report.aggregator().is_additive());
    assert_totals_consistent(&report);

    let by_rows: f64 = report.rows().iter().map(|r| *report.row_total(r).unwrap()).sum();
    let by_columns: f64 = report.column_totals().iter().sum();
    assert_eq!(by_rows, *report.grand_total());
    assert_eq!(by_columns, *report.grand_total());
}

#[test]
fn test_non_additive_totals_are_merged() {
    let report = ReportBuilder::new(MinOfMeasure, TaskFixture::state_columns(), ReportOptions::default())
        .unwrap()
        .build_from(TaskFixture::items())
        .unwrap();

    assert_totals_consistent(&report);
    assert_eq!(*report.grand_total(), Some(0.5));
    assert_eq!(*report.row_total("WB-GPK").unwrap(), Some(1.5));
}

// ============================================================================
// ASSIGNMENT POLICY
// ============================================================================

fn overlapping_columns() -> Vec<ColumnHeader> {
    vec![
        ColumnHeader::range("0-60", "priority", 0.0, 60.0).unwrap(),
        ColumnHeader::range("40-100", "priority", 40.0, 100.0).unwrap(),
    ]
}

#[test]
fn test_overlap_resolves_to_first_column() {
    let report = ReportBuilder::new(Count, overlapping_columns(), ReportOptions::default())
        .unwrap()
        .build_from(vec![QueryItem::new("A").with_attribute("priority", 50)])
        .unwrap();

    assert_eq!(*report.cell_value("A", "0-60").unwrap(), 1);
    assert_eq!(*report.cell_value("A", "40-100").unwrap(), 0);
    assert_eq!(report.stats().ambiguous_assignments, 1);
}

#[test]
fn test_strict_mode_rejects_overlap() {
    let err = ReportBuilder::new(Count, overlapping_columns(), ReportOptions::default().strict_assignment(true))
        .unwrap()
        .build_from(vec![
            QueryItem::new("A").with_attribute("priority", 10),
            QueryItem::new("A").with_attribute("priority", 50),
        ])
        .unwrap_err();

    assert_eq!(
        err,
        ReportError::AmbiguousAssignment {
            row_key: "A".to_string(),
            columns: vec!["0-60".to_string(), "40-100".to_string()],
            processed: 1,
        }
    );
}

#[test]
fn test_unmatched_item_aborts_build() {
    let mut items = TaskFixture::items();
    items.insert(3, QueryItem::new("WB-LOST").with_attribute("priority", 250));

    let err = ReportBuilder::new(Count, TaskFixture::priority_columns(), ReportOptions::default())
        .unwrap()
        .build_from(items)
        .unwrap_err();

    assert_eq!(
        err,
        ReportError::NoMatchingColumn { row_key: "WB-LOST".to_string(), processed: 3, columns_scanned: 2 }
    );
}

#[test]
fn test_require_catch_all() {
    let result = ReportBuilder::new(
        Count,
        TaskFixture::priority_columns(),
        ReportOptions::default().require_catch_all(true),
    );
    assert!(matches!(result, Err(ReportError::MissingCatchAll(ref c)) if c == "high"));
}

#[test]
fn test_custom_column_and_row_dimension() {
    let columns = vec![
        ColumnHeader::custom("long-running", |i: &QueryItem| i.measure() >= 6.0).unwrap(),
        ColumnHeader::catch_all("short").unwrap(),
    ];
    let report = ReportBuilder::new(Count, columns, ReportOptions::default())
        .unwrap()
        .with_row_dimension(RowDimension::attribute("classification"))
        .build_from(TaskFixture::items())
        .unwrap();

    assert_eq!(report.rows(), &["L10000", "L20000", "L30000"].map(String::from));
    assert_eq!(*report.cell_value("L10000", "long-running").unwrap(), 2);
    assert_eq!(*report.cell_value("L20000", "long-running").unwrap(), 1);
    assert_eq!(*report.cell_value("L30000", "short").unwrap(), 2);
}

#[test]
fn test_empty_input_builds_empty_report() {
    let report = ReportBuilder::new(Count, TaskFixture::priority_columns(), ReportOptions::default())
        .unwrap()
        .build()
        .unwrap();

    assert_eq!(report.row_count(), 0);
    assert_eq!(report.column_count(), 2);
    assert_eq!(*report.grand_total(), 0);
    assert_eq!(*report.column_total("high").unwrap(), 0);
}
