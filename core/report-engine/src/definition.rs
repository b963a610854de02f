//! FILENAME: core/report-engine/src/definition.rs
//! Report Definition - the serializable configuration.
//!
//! This module contains the types needed to DESCRIBE a report without code:
//! - which attribute (or the item key) defines the rows
//! - the ordered column list (exact-match, range, catch-all)
//! - the aggregation function
//! - build options
//!
//! Custom predicates and extractors are function values and therefore only
//! available through the builder API, not through a definition.

use log::debug;
use monitor_model::{AttributeValue, QueryItem};
use serde::{Deserialize, Serialize};

use crate::aggregator::AggregationType;
use crate::builder::ReportBuilder;
use crate::column::ColumnHeader;
use crate::dimension::{RowDimension, RowDimensionDefinition};
use crate::error::Result;
use crate::options::ReportOptions;
use crate::report::Report;

/// Serializable description of one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum ColumnDefinition {
    ExactMatch {
        name: String,
        attribute: String,
        value: AttributeValue,
    },
    Range {
        name: String,
        attribute: String,
        lower: f64,
        upper: f64,
    },
    CatchAll {
        name: String,
    },
}

impl ColumnDefinition {
    /// Validates and converts into a live column header.
    pub fn to_header(&self) -> Result<ColumnHeader> {
        match self {
            ColumnDefinition::ExactMatch { name, attribute, value } => {
                ColumnHeader::exact_match(name.clone(), attribute.clone(), value.clone())
            }
            ColumnDefinition::Range { name, attribute, lower, upper } => {
                ColumnHeader::range(name.clone(), attribute.clone(), *lower, *upper)
            }
            ColumnDefinition::CatchAll { name } => ColumnHeader::catch_all(name.clone()),
        }
    }
}

/// The complete, serializable definition of a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDefinition {
    /// User-friendly report name.
    #[serde(default)]
    pub name: Option<String>,

    /// How items map onto rows.
    #[serde(default)]
    pub rows: RowDimensionDefinition,

    /// Columns in priority order (first match wins).
    pub columns: Vec<ColumnDefinition>,

    #[serde(default)]
    pub aggregation: AggregationType,

    #[serde(default)]
    pub options: ReportOptions,
}

impl ReportDefinition {
    pub fn new(columns: Vec<ColumnDefinition>, aggregation: AggregationType) -> Self {
        ReportDefinition {
            name: None,
            rows: RowDimensionDefinition::ItemKey,
            columns,
            aggregation,
            options: ReportOptions::default(),
        }
    }

    /// Parses a definition from JSON. Malformed input yields `InvalidDefinition`.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Converts every column definition, failing on the first invalid one.
    pub fn column_headers(&self) -> Result<Vec<ColumnHeader>> {
        self.columns.iter().map(ColumnDefinition::to_header).collect()
    }

    pub fn row_dimension(&self) -> RowDimension {
        RowDimension::from(&self.rows)
    }

    /// Creates a configured, empty builder.
    pub fn builder(&self) -> Result<ReportBuilder<AggregationType>> {
        Ok(
            ReportBuilder::new(self.aggregation, self.column_headers()?, self.options.clone())?
                .with_row_dimension(self.row_dimension()),
        )
    }

    /// Builds a report from `items` in one call.
    pub fn build_report<I>(&self, items: I) -> Result<Report<AggregationType>>
    where
        I: IntoIterator<Item = QueryItem>,
    {
        if let Some(name) = &self.name {
            debug!("building report '{}'", name);
        }
        self.builder()?.build_from(items)
    }
}
