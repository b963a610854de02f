//! FILENAME: core/report-engine/src/aggregator.rs
//! Aggregators - combining functions for report cells.
//!
//! Every aggregator must be associative and commutative in `merge`, and
//! `merge(identity, x) == x`. The parallel build relies on this: partial
//! grids are folded independently and merged cell by cell afterwards.
//! Breaking the contract is not detected; it just produces wrong numbers
//! under `build_parallel`.
//!
//! Additive aggregators (Count, SumOfMeasure) satisfy
//! `sum(row totals) == sum(column totals) == grand total`. Min/Max/Average
//! do not; their totals are computed by merging, not by adding cell values.

use std::fmt;
use std::sync::Arc;

use monitor_model::QueryItem;
use serde::{Deserialize, Serialize};

/// A commutative, associative combining function over query items.
pub trait Aggregator: Clone + fmt::Debug + Send + Sync {
    type Value: Clone + fmt::Debug + PartialEq + Send + Sync;

    /// The value of a cell no item has landed in.
    fn identity(&self) -> Self::Value;

    /// Folds one item into an accumulated value.
    fn fold(&self, acc: Self::Value, item: &QueryItem) -> Self::Value;

    /// Combines two partial values.
    fn merge(&self, a: Self::Value, b: Self::Value) -> Self::Value;

    /// Whether totals equal the plain sum of cell values.
    fn is_additive(&self) -> bool {
        false
    }
}

// ============================================================================
// BUILT-IN AGGREGATORS
// ============================================================================

/// Number of items. Additive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Count;

impl Aggregator for Count {
    type Value = u64;

    fn identity(&self) -> u64 {
        0
    }

    fn fold(&self, acc: u64, _item: &QueryItem) -> u64 {
        acc + 1
    }

    fn merge(&self, a: u64, b: u64) -> u64 {
        a + b
    }

    fn is_additive(&self) -> bool {
        true
    }
}

/// Sum of the items' measure (e.g. task durations). Additive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SumOfMeasure;

impl Aggregator for SumOfMeasure {
    type Value = f64;

    fn identity(&self) -> f64 {
        0.0
    }

    fn fold(&self, acc: f64, item: &QueryItem) -> f64 {
        acc + item.measure()
    }

    fn merge(&self, a: f64, b: f64) -> f64 {
        a + b
    }

    fn is_additive(&self) -> bool {
        true
    }
}

/// Smallest measure, `None` for an empty cell. Not additive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MinOfMeasure;

impl Aggregator for MinOfMeasure {
    type Value = Option<f64>;

    fn identity(&self) -> Option<f64> {
        None
    }

    fn fold(&self, acc: Option<f64>, item: &QueryItem) -> Option<f64> {
        self.merge(acc, Some(item.measure()))
    }

    fn merge(&self, a: Option<f64>, b: Option<f64>) -> Option<f64> {
        match (a, b) {
            (Some(x), Some(y)) => Some(x.min(y)),
            (x, None) => x,
            (None, y) => y,
        }
    }
}

/// Largest measure, `None` for an empty cell. Not additive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaxOfMeasure;

impl Aggregator for MaxOfMeasure {
    type Value = Option<f64>;

    fn identity(&self) -> Option<f64> {
        None
    }

    fn fold(&self, acc: Option<f64>, item: &QueryItem) -> Option<f64> {
        self.merge(acc, Some(item.measure()))
    }

    fn merge(&self, a: Option<f64>, b: Option<f64>) -> Option<f64> {
        match (a, b) {
            (Some(x), Some(y)) => Some(x.max(y)),
            (x, None) => x,
            (None, y) => y,
        }
    }
}

// ============================================================================
// CLOSURE-BACKED AGGREGATOR
// ============================================================================

/// A caller-defined aggregator built from three function values.
pub struct FnAggregator<V> {
    identity: Arc<dyn Fn() -> V + Send + Sync>,
    fold: Arc<dyn Fn(V, &QueryItem) -> V + Send + Sync>,
    merge: Arc<dyn Fn(V, V) -> V + Send + Sync>,
    additive: bool,
}

impl<V> FnAggregator<V> {
    pub fn new<I, F, M>(identity: I, fold: F, merge: M) -> Self
    where
        I: Fn() -> V + Send + Sync + 'static,
        F: Fn(V, &QueryItem) -> V + Send + Sync + 'static,
        M: Fn(V, V) -> V + Send + Sync + 'static,
    {
        FnAggregator {
            identity: Arc::new(identity),
            fold: Arc::new(fold),
            merge: Arc::new(merge),
            additive: false,
        }
    }

    /// Declares the aggregator additive (totals equal sums of cells).
    pub fn additive(mut self) -> Self {
        self.additive = true;
        self
    }
}

impl<V> Clone for FnAggregator<V> {
    fn clone(&self) -> Self {
        FnAggregator {
            identity: Arc::clone(&self.identity),
            fold: Arc::clone(&self.fold),
            merge: Arc::clone(&self.merge),
            additive: self.additive,
        }
    }
}

impl<V> fmt::Debug for FnAggregator<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnAggregator")
            .field("additive", &self.additive)
            .finish_non_exhaustive()
    }
}

impl<V> Aggregator for FnAggregator<V>
where
    V: Clone + fmt::Debug + PartialEq + Send + Sync,
{
    type Value = V;

    fn identity(&self) -> V {
        (self.identity)()
    }

    fn fold(&self, acc: V, item: &QueryItem) -> V {
        (self.fold)(acc, item)
    }

    fn merge(&self, a: V, b: V) -> V {
        (self.merge)(a, b)
    }

    fn is_additive(&self) -> bool {
        self.additive
    }
}

// ============================================================================
// DEFINITION-DRIVEN AGGREGATION
// ============================================================================

/// Aggregation functions selectable from a serialized report definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AggregationType {
    #[default]
    Count,
    Sum,
    Average,
    Min,
    Max,
}

/// Accumulator carrying enough state to answer every `AggregationType`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateAccumulator {
    pub count: u64,
    pub sum: f64,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl AggregateAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one measure value.
    pub fn add_number(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
    }

    /// Merges another accumulator into this one.
    pub fn merge(&mut self, other: &AggregateAccumulator) {
        if other.count == 0 {
            return;
        }
        self.count += other.count;
        self.sum += other.sum;
        if let Some(other_min) = other.min {
            self.min = Some(self.min.map_or(other_min, |m| m.min(other_min)));
        }
        if let Some(other_max) = other.max {
            self.max = Some(self.max.map_or(other_max, |m| m.max(other_max)));
        }
    }

    /// Computes the final value. Empty accumulators yield 0 for every function.
    pub fn compute(&self, aggregation: AggregationType) -> f64 {
        match aggregation {
            AggregationType::Count => self.count as f64,
            AggregationType::Sum => self.sum,
            AggregationType::Average => {
                if self.count > 0 {
                    self.sum / (self.count as f64)
                } else {
                    0.0
                }
            }
            AggregationType::Min => self.min.unwrap_or(0.0),
            AggregationType::Max => self.max.unwrap_or(0.0),
        }
    }
}

impl Aggregator for AggregationType {
    type Value = AggregateAccumulator;

    fn identity(&self) -> AggregateAccumulator {
        AggregateAccumulator::new()
    }

    fn fold(&self, mut acc: AggregateAccumulator, item: &QueryItem) -> AggregateAccumulator {
        acc.add_number(item.measure());
        acc
    }

    fn merge(&self, mut a: AggregateAccumulator, b: AggregateAccumulator) -> AggregateAccumulator {
        a.merge(&b);
        a
    }

    fn is_additive(&self) -> bool {
        matches!(self, AggregationType::Count | AggregationType::Sum)
    }
}
