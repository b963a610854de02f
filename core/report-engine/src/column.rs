//! FILENAME: core/report-engine/src/column.rs
//! Column headers - named membership predicates over query items.
//!
//! A report's columns are an ordered list of headers. During a build each item
//! lands in the FIRST header whose predicate fits it, so the list order is
//! part of the report's meaning. The built-in kinds cover the common
//! bucketing strategies; anything else goes through `HeaderKind::Custom`.

use std::fmt;
use std::sync::Arc;

use monitor_model::{AttributeValue, QueryItem};

use crate::error::{ReportError, Result};

/// Caller-supplied membership test for a custom column.
pub type ColumnPredicate = Arc<dyn Fn(&QueryItem) -> bool + Send + Sync>;

/// The bucketing strategy of a column.
#[derive(Clone)]
pub enum HeaderKind {
    /// Fits iff the named attribute equals `value`.
    ExactMatch {
        attribute: String,
        value: AttributeValue,
    },
    /// Fits iff the named numeric attribute lies in `[lower, upper]`.
    Range {
        attribute: String,
        lower: f64,
        upper: f64,
    },
    /// Always fits.
    CatchAll,
    /// Fits iff the predicate returns true.
    Custom(ColumnPredicate),
}

impl fmt::Debug for HeaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderKind::ExactMatch { attribute, value } => f
                .debug_struct("ExactMatch")
                .field("attribute", attribute)
                .field("value", value)
                .finish(),
            HeaderKind::Range { attribute, lower, upper } => f
                .debug_struct("Range")
                .field("attribute", attribute)
                .field("lower", lower)
                .field("upper", upper)
                .finish(),
            HeaderKind::CatchAll => f.write_str("CatchAll"),
            HeaderKind::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// A named column of a report.
#[derive(Debug, Clone)]
pub struct ColumnHeader {
    name: String,
    kind: HeaderKind,
}

impl ColumnHeader {
    /// Column holding items whose `attribute` equals `value`.
    pub fn exact_match(
        name: impl Into<String>,
        attribute: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Result<Self> {
        Self::with_kind(
            name,
            HeaderKind::ExactMatch {
                attribute: attribute.into(),
                value: value.into(),
            },
        )
    }

    /// Column holding items whose numeric `attribute` lies in `[lower, upper]`.
    /// Fails with `InvalidRange` when `lower > upper` or a bound is NaN.
    pub fn range(
        name: impl Into<String>,
        attribute: impl Into<String>,
        lower: f64,
        upper: f64,
    ) -> Result<Self> {
        let name = name.into();
        if lower.is_nan() || upper.is_nan() || lower > upper {
            return Err(ReportError::InvalidRange { column: name, lower, upper });
        }
        Self::with_kind(
            name,
            HeaderKind::Range {
                attribute: attribute.into(),
                lower,
                upper,
            },
        )
    }

    /// Column that accepts every item. Put it last to make a column list exhaustive.
    pub fn catch_all(name: impl Into<String>) -> Result<Self> {
        Self::with_kind(name, HeaderKind::CatchAll)
    }

    /// Column backed by a caller-supplied predicate.
    /// The predicate must be pure and must not panic for any item.
    pub fn custom<F>(name: impl Into<String>, predicate: F) -> Result<Self>
    where
        F: Fn(&QueryItem) -> bool + Send + Sync + 'static,
    {
        Self::with_kind(name, HeaderKind::Custom(Arc::new(predicate)))
    }

    fn with_kind(name: impl Into<String>, kind: HeaderKind) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ReportError::EmptyDisplayName);
        }
        Ok(ColumnHeader { name, kind })
    }

    pub fn display_name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &HeaderKind {
        &self.kind
    }

    pub fn is_catch_all(&self) -> bool {
        matches!(self.kind, HeaderKind::CatchAll)
    }

    /// Membership test. Total: a missing or non-numeric attribute simply does not fit.
    pub fn fits(&self, item: &QueryItem) -> bool {
        match &self.kind {
            HeaderKind::ExactMatch { attribute, value } => {
                item.attribute(attribute).map_or(false, |v| v == value)
            }
            HeaderKind::Range { attribute, lower, upper } => item
                .number(attribute)
                .map_or(false, |n| n >= *lower && n <= *upper),
            HeaderKind::CatchAll => true,
            HeaderKind::Custom(predicate) => predicate(item),
        }
    }
}

/// Checks a column list: non-empty, unique names, within `max_columns`, and
/// (when `require_catch_all`) ending in a catch-all.
pub fn validate_columns(
    columns: &[ColumnHeader],
    max_columns: usize,
    require_catch_all: bool,
) -> Result<()> {
    let Some(last) = columns.last() else {
        return Err(ReportError::NoColumns);
    };

    if columns.len() > max_columns {
        return Err(ReportError::ColumnLimitExceeded {
            count: columns.len(),
            limit: max_columns,
        });
    }

    for (i, column) in columns.iter().enumerate() {
        if columns[..i].iter().any(|c| c.name == column.name) {
            return Err(ReportError::DuplicateColumn(column.name.clone()));
        }
    }

    if require_catch_all && !last.is_catch_all() {
        return Err(ReportError::MissingCatchAll(last.name.clone()));
    }

    Ok(())
}

/// True when both lists name the same columns in the same order.
pub(crate) fn same_columns(a: &[ColumnHeader], b: &[ColumnHeader]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.name == y.name)
}
