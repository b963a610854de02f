//! FILENAME: core/monitor-model/src/item.rs
//! PURPOSE: `QueryItem`, one flat row of an upstream monitoring query.
//! CONTEXT: Items are built once by the query adapter and never mutated
//! afterwards. The report engine reads the row key, attributes and measure.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::value::AttributeValue;

/// Inline capacity for attributes; typical monitor queries carry 1-4.
type Attributes = SmallVec<[(String, AttributeValue); 4]>;

/// One row of raw input data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryItem {
    /// Identifies the report row (workbasket key, classification key, ...).
    row_key: String,

    /// Named attribute values used by column predicates and row dimensions.
    #[serde(default)]
    attributes: Attributes,

    /// Numeric measure (task count, age in days, duration, ...).
    #[serde(default)]
    measure: f64,
}

impl QueryItem {
    pub fn new(row_key: impl Into<String>) -> Self {
        QueryItem {
            row_key: row_key.into(),
            attributes: SmallVec::new(),
            measure: 0.0,
        }
    }

    /// Sets an attribute, replacing any existing value under the same name.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
        self
    }

    pub fn with_measure(mut self, measure: f64) -> Self {
        self.measure = measure;
        self
    }

    /// Returns a copy of this item under a different row key.
    pub fn with_row_key(mut self, row_key: impl Into<String>) -> Self {
        self.row_key = row_key.into();
        self
    }

    pub fn row_key(&self) -> &str {
        &self.row_key
    }

    pub fn measure(&self) -> f64 {
        self.measure
    }

    /// Looks up an attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Looks up a numeric attribute. Non-numeric or missing attributes yield `None`.
    pub fn number(&self, name: &str) -> Option<f64> {
        self.attribute(name).and_then(AttributeValue::as_number)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.attributes.iter().map(|(n, v)| (n.as_str(), v))
    }
}
