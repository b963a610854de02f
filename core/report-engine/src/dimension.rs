//! FILENAME: core/report-engine/src/dimension.rs
//! Row dimensions - how a query item is mapped onto a report row.

use std::fmt;
use std::sync::Arc;

use monitor_model::QueryItem;
use serde::{Deserialize, Serialize};

/// Label of the row collecting items that lack the grouping attribute.
pub const BLANK_ROW: &str = "(blank)";

/// Caller-supplied row key extractor.
pub type RowKeyFn = Arc<dyn Fn(&QueryItem) -> String + Send + Sync>;

/// Row-key extractor for a report.
#[derive(Clone, Default)]
pub enum RowDimension {
    /// The item's own row key.
    #[default]
    ItemKey,
    /// The display text of a named attribute; missing attributes map to `BLANK_ROW`.
    Attribute(String),
    /// A caller-supplied function.
    Custom(RowKeyFn),
}

impl RowDimension {
    pub fn attribute(name: impl Into<String>) -> Self {
        RowDimension::Attribute(name.into())
    }

    pub fn custom<F>(extractor: F) -> Self
    where
        F: Fn(&QueryItem) -> String + Send + Sync + 'static,
    {
        RowDimension::Custom(Arc::new(extractor))
    }

    /// Returns the row identifier for an item.
    pub fn row_key(&self, item: &QueryItem) -> String {
        match self {
            RowDimension::ItemKey => item.row_key().to_string(),
            RowDimension::Attribute(name) => item
                .attribute(name)
                .map(|v| v.display_value())
                .unwrap_or_else(|| BLANK_ROW.to_string()),
            RowDimension::Custom(extractor) => extractor(item),
        }
    }
}

impl fmt::Debug for RowDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowDimension::ItemKey => f.write_str("ItemKey"),
            RowDimension::Attribute(name) => f.debug_tuple("Attribute").field(name).finish(),
            RowDimension::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Serializable form of a row dimension (custom extractors cannot be serialized).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum RowDimensionDefinition {
    #[default]
    ItemKey,
    Attribute { name: String },
}

impl From<&RowDimensionDefinition> for RowDimension {
    fn from(def: &RowDimensionDefinition) -> Self {
        match def {
            RowDimensionDefinition::ItemKey => RowDimension::ItemKey,
            RowDimensionDefinition::Attribute { name } => RowDimension::Attribute(name.clone()),
        }
    }
}
