//! FILENAME: core/report-engine/src/lib.rs
//! Monitoring report engine.
//!
//! Classifies a stream of flat `QueryItem`s into a two-dimensional report:
//! rows come from a row dimension (workbasket, classification, ...), columns
//! are caller-defined membership predicates, and every cell holds an
//! aggregate (count, sum of a measure, ...) with row, column and grand totals.
//!
//! Layers:
//! - `column`, `dimension`, `aggregator`: the pluggable parts of a report
//! - `options`, `definition`: configuration (what the report IS)
//! - `builder`, `parallel`: the assignment pipeline (HOW we compute)
//! - `report`: the finished grid, drill-down and re-aggregation
//! - `view`: serializable output for a presentation layer (WHAT we display)

pub mod aggregator;
pub mod builder;
pub mod column;
pub mod definition;
pub mod dimension;
pub mod error;
pub mod options;
pub mod parallel;
pub mod report;
pub mod view;

pub use aggregator::{
    AggregateAccumulator, AggregationType, Aggregator, Count, FnAggregator, MaxOfMeasure,
    MinOfMeasure, SumOfMeasure,
};
pub use builder::{ItemPreprocessor, ReportBuilder};
pub use column::{validate_columns, ColumnHeader, ColumnPredicate, HeaderKind};
pub use definition::{ColumnDefinition, ReportDefinition};
pub use dimension::{RowDimension, RowDimensionDefinition, RowKeyFn, BLANK_ROW};
pub use error::{ReportError, Result};
pub use options::{ReportOptions, RowOrder, DEFAULT_MAX_COLUMNS, DEFAULT_MAX_ROWS};
pub use report::{BuildStats, Report};
pub use view::{ReportView, RowView};

pub use monitor_model::{AttributeValue, QueryItem};
