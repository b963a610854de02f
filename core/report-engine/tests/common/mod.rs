//! FILENAME: tests/common/mod.rs
//! Fixtures and assertion helpers for report-engine integration tests.

#![allow(dead_code)]

use report_engine::{Aggregator, ColumnHeader, QueryItem, Report};

// ============================================================================
// FIXTURES
// ============================================================================

/// A small task population spread over three workbaskets.
pub struct TaskFixture;

impl TaskFixture {
    /// (workbasket, classification, domain, priority, state, duration in hours)
    pub fn data() -> Vec<(&'static str, &'static str, &'static str, f64, &'static str, f64)> {
        vec![
            ("WB-GPK", "L10000", "DOMAIN_A", 10.0, "READY", 4.0),
            ("WB-GPK", "L10000", "DOMAIN_A", 60.0, "CLAIMED", 8.0),
            ("WB-GPK", "L20000", "DOMAIN_A", 45.0, "READY", 1.5),
            ("WB-KSC", "L10000", "DOMAIN_B", 90.0, "READY", 12.0),
            ("WB-KSC", "L30000", "DOMAIN_B", 5.0, "COMPLETED", 0.5),
            ("WB-TPK", "L20000", "DOMAIN_A", 51.0, "CLAIMED", 3.0),
            ("WB-TPK", "L20000", "DOMAIN_B", 100.0, "READY", 6.0),
            ("WB-TPK", "L30000", "DOMAIN_B", 0.0, "READY", 2.0),
        ]
    }

    pub fn items() -> Vec<QueryItem> {
        Self::data()
            .into_iter()
            .map(|(wb, classification, domain, priority, state, duration)| {
                QueryItem::new(wb)
                    .with_attribute("classification", classification)
                    .with_attribute("domain", domain)
                    .with_attribute("priority", priority)
                    .with_attribute("state", state)
                    .with_measure(duration)
            })
            .collect()
    }

    /// Deterministic larger population for parallel/property tests.
    pub fn generated(count: usize) -> Vec<QueryItem> {
        let states = ["READY", "CLAIMED", "COMPLETED"];
        (0..count)
            .map(|i| {
                QueryItem::new(format!("WB-{:03}", (i * 7) % 23))
                    .with_attribute("priority", ((i * 37) % 130) as f64)
                    .with_attribute("state", states[i % states.len()])
                    .with_attribute("classification", format!("L{}", i % 5))
                    .with_measure((i % 17) as f64)
            })
            .collect()
    }

    /// Priority buckets without a catch-all.
    pub fn priority_columns() -> Vec<ColumnHeader> {
        vec![
            ColumnHeader::range("low", "priority", 0.0, 50.0).unwrap(),
            ColumnHeader::range("high", "priority", 51.0, 100.0).unwrap(),
        ]
    }

    /// Priority buckets closed by a catch-all.
    pub fn exhaustive_priority_columns() -> Vec<ColumnHeader> {
        let mut columns = Self::priority_columns();
        columns.push(ColumnHeader::catch_all("other").unwrap());
        columns
    }

    pub fn state_columns() -> Vec<ColumnHeader> {
        vec![
            ColumnHeader::exact_match("ready", "state", "READY").unwrap(),
            ColumnHeader::exact_match("claimed", "state", "CLAIMED").unwrap(),
            ColumnHeader::catch_all("other").unwrap(),
        ]
    }
}

// ============================================================================
// ASSERTION HELPERS
// ============================================================================

/// Asserts row totals and column totals equal the merge of their cells.
pub fn assert_totals_consistent<A: Aggregator>(report: &Report<A>) {
    let agg = report.aggregator();

    for row in report.rows() {
        let merged = report
            .row_values(row)
            .unwrap()
            .iter()
            .cloned()
            .fold(agg.identity(), |acc, v| agg.merge(acc, v));
        assert_eq!(&merged, report.row_total(row).unwrap(), "row total mismatch for {}", row);
    }

    for column in report.column_names() {
        let merged = report
            .rows()
            .iter()
            .map(|row| report.cell_value(row, column).unwrap().clone())
            .fold(agg.identity(), |acc, v| agg.merge(acc, v));
        assert_eq!(&merged, report.column_total(column).unwrap(), "column total mismatch for {}", column);
    }
}
