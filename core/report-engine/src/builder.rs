//! FILENAME: core/report-engine/src/builder.rs
//! Report Builder - streams query items into a row x column grid.
//!
//! Algorithm, per item:
//! 1. Run the optional preprocessor.
//! 2. Extract the row identifier via the configured `RowDimension`.
//! 3. Scan the columns in order; the FIRST column that fits wins. Later
//!    non-catch-all columns are still tested so overlapping definitions are
//!    reported (`AmbiguousAssignment`, fatal only in strict mode).
//! 4. Register the row on first sight (bounded by `max_rows`).
//! 5. Fold the item into the cell via the aggregator, and retain it when
//!    drill-down is enabled.
//!
//! The first failure poisons the builder: later `add_item` and `build` calls
//! return the same error and no partial report is ever produced.

use std::mem;
use std::sync::Arc;

use log::{debug, trace, warn};
use monitor_model::QueryItem;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::aggregator::Aggregator;
use crate::column::{same_columns, validate_columns, ColumnHeader};
use crate::dimension::RowDimension;
use crate::error::{ReportError, Result};
use crate::options::{ReportOptions, RowOrder};
use crate::report::{BuildStats, Report};

/// Transformation applied to every item before assignment.
pub type ItemPreprocessor = Arc<dyn Fn(QueryItem) -> QueryItem + Send + Sync>;

/// Accumulates query items into a report. Not meant to be shared between
/// threads while items are being added; see `build_parallel` instead.
pub struct ReportBuilder<A: Aggregator> {
    aggregator: A,
    columns: Vec<ColumnHeader>,
    row_dimension: RowDimension,
    preprocessor: Option<ItemPreprocessor>,
    options: ReportOptions,

    /// Row identifiers in registration order.
    rows: Vec<String>,
    row_index: FxHashMap<String, usize>,

    /// Item position (`items_processed`) at which each row was registered.
    first_seen: Vec<usize>,

    /// Number of leading rows that came from an explicit row order.
    explicit_rows: usize,

    /// Cell values, indexed `[row][column]`.
    cells: Vec<Vec<A::Value>>,

    /// Retained items, indexed `[row][column]`. Empty unless `retain_items`.
    retained: Vec<Vec<Vec<QueryItem>>>,

    stats: BuildStats,

    /// Set once partial builders have been merged; first-seen order is then meaningless.
    merged: bool,

    failure: Option<ReportError>,
}

impl<A: Aggregator> ReportBuilder<A> {
    /// Creates a builder, validating the column list and row order up front.
    pub fn new(aggregator: A, columns: Vec<ColumnHeader>, options: ReportOptions) -> Result<Self> {
        validate_columns(&columns, options.max_columns, options.require_catch_all)?;

        let mut builder = ReportBuilder {
            aggregator,
            columns,
            row_dimension: RowDimension::ItemKey,
            preprocessor: None,
            options,
            rows: Vec::new(),
            row_index: FxHashMap::default(),
            first_seen: Vec::new(),
            explicit_rows: 0,
            cells: Vec::new(),
            retained: Vec::new(),
            stats: BuildStats::default(),
            merged: false,
            failure: None,
        };

        if let RowOrder::Explicit(order) = &builder.options.row_order {
            let order = order.clone();
            if order.len() > builder.options.max_rows {
                return Err(ReportError::ExplicitRowLimitExceeded {
                    count: order.len(),
                    limit: builder.options.max_rows,
                });
            }
            for key in order {
                if builder.row_index.contains_key(&key) {
                    return Err(ReportError::DuplicateRow(key));
                }
                builder.push_row(key, 0);
            }
            builder.explicit_rows = builder.rows.len();
        }

        Ok(builder)
    }

    /// Sets the row-key extractor (default: the item's own row key).
    pub fn with_row_dimension(mut self, dimension: RowDimension) -> Self {
        self.row_dimension = dimension;
        self
    }

    /// Installs a preprocessor run on every item before assignment.
    pub fn with_preprocessor<F>(mut self, preprocessor: F) -> Self
    where
        F: Fn(QueryItem) -> QueryItem + Send + Sync + 'static,
    {
        self.preprocessor = Some(Arc::new(preprocessor));
        self
    }

    pub fn columns(&self) -> &[ColumnHeader] {
        &self.columns
    }

    pub fn options(&self) -> &ReportOptions {
        &self.options
    }

    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    /// Returns an empty builder with the same configuration.
    pub fn fork(&self) -> Self {
        let mut fork = ReportBuilder {
            aggregator: self.aggregator.clone(),
            columns: self.columns.clone(),
            row_dimension: self.row_dimension.clone(),
            preprocessor: self.preprocessor.clone(),
            options: self.options.clone(),
            rows: Vec::new(),
            row_index: FxHashMap::default(),
            first_seen: Vec::new(),
            explicit_rows: 0,
            cells: Vec::new(),
            retained: Vec::new(),
            stats: BuildStats::default(),
            merged: false,
            failure: None,
        };
        for key in &self.rows[..self.explicit_rows] {
            fork.push_row(key.clone(), 0);
        }
        fork.explicit_rows = self.explicit_rows;
        fork
    }

    // ========================================================================
    // ITEM ASSIGNMENT
    // ========================================================================

    /// Adds one item. On error the builder is poisoned.
    pub fn add_item(&mut self, item: QueryItem) -> Result<()> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        let result = self.assign(item);
        if let Err(err) = &result {
            debug!("report build aborted after {} items: {}", self.stats.items_processed, err);
            self.failure = Some(err.clone());
        }
        result
    }

    /// Adds every item, stopping at the first failure.
    pub fn add_items<I>(&mut self, items: I) -> Result<()>
    where
        I: IntoIterator<Item = QueryItem>,
    {
        for item in items {
            self.add_item(item)?;
        }
        Ok(())
    }

    fn assign(&mut self, item: QueryItem) -> Result<()> {
        let item = match &self.preprocessor {
            Some(preprocess) => preprocess(item),
            None => item,
        };
        let processed = self.stats.items_processed;
        let row_key = self.row_dimension.row_key(&item);

        let Some(column) = self.select_column(&item, processed)? else {
            if self.options.drop_unmatched {
                trace!("dropping unmatched item with row key '{}'", item.row_key());
                self.stats.items_processed += 1;
                self.stats.items_dropped += 1;
                return Ok(());
            }
            return Err(ReportError::NoMatchingColumn {
                row_key: item.row_key().to_string(),
                processed,
                columns_scanned: self.columns.len(),
            });
        };

        let row = self.row_slot(&row_key)?;
        trace!(
            "assigning item '{}' to ({}, {})",
            item.row_key(),
            row_key,
            self.columns[column].display_name()
        );

        let cell = &mut self.cells[row][column];
        let acc = mem::replace(cell, self.aggregator.identity());
        *cell = self.aggregator.fold(acc, &item);

        if self.options.retain_items {
            self.retained[row][column].push(item);
        }

        self.stats.items_processed += 1;
        self.stats.items_assigned += 1;
        Ok(())
    }

    /// First-match-wins column scan. A catch-all column ends the scan and never
    /// counts towards ambiguity.
    fn select_column(&mut self, item: &QueryItem, processed: usize) -> Result<Option<usize>> {
        let mut chosen: Option<usize> = None;
        let mut overlapping: SmallVec<[usize; 4]> = SmallVec::new();

        for (index, column) in self.columns.iter().enumerate() {
            if column.is_catch_all() {
                if chosen.is_none() {
                    chosen = Some(index);
                }
                break;
            }
            if column.fits(item) {
                match chosen {
                    None => chosen = Some(index),
                    Some(_) => overlapping.push(index),
                }
            }
        }

        if let (Some(first), false) = (chosen, overlapping.is_empty()) {
            self.stats.ambiguous_assignments += 1;
            let columns: Vec<String> = std::iter::once(first)
                .chain(overlapping.iter().copied())
                .map(|i| self.columns[i].display_name().to_string())
                .collect();

            if self.options.strict_assignment {
                return Err(ReportError::AmbiguousAssignment {
                    row_key: item.row_key().to_string(),
                    columns,
                    processed,
                });
            }
            debug!(
                "item '{}' fits columns {:?}; assigned to '{}'",
                item.row_key(),
                columns,
                columns[0]
            );
        }

        Ok(chosen)
    }

    /// Returns the index of a row, registering it if unseen.
    fn row_slot(&mut self, key: &str) -> Result<usize> {
        if let Some(&index) = self.row_index.get(key) {
            return Ok(index);
        }
        if self.rows.len() >= self.options.max_rows {
            return Err(ReportError::RowLimitExceeded {
                row_key: key.to_string(),
                limit: self.options.max_rows,
                processed: self.stats.items_processed,
            });
        }
        Ok(self.push_row(key.to_string(), self.stats.items_processed))
    }

    fn push_row(&mut self, key: String, first_seen: usize) -> usize {
        let index = self.rows.len();
        let width = self.columns.len();
        self.row_index.insert(key.clone(), index);
        self.rows.push(key);
        self.first_seen.push(first_seen);
        self.cells.push(vec![self.aggregator.identity(); width]);
        if self.options.retain_items {
            self.retained.push(vec![Vec::new(); width]);
        }
        index
    }

    // ========================================================================
    // MERGE
    // ========================================================================

    /// Merges a partial builder into this one, cell by cell.
    ///
    /// Both builders must share the same columns and options. `other` is taken
    /// to hold the items that directly follow the ones already in `self`, so
    /// every error it carries (or a row limit hit while merging) is reported at
    /// its position in the combined input.
    pub fn merge(mut self, mut other: ReportBuilder<A>) -> Result<Self> {
        if let Some(err) = self.failure.take() {
            return Err(err);
        }
        if !same_columns(&self.columns, &other.columns) {
            return Err(ReportError::IncompatibleColumns);
        }
        if self.options != other.options {
            return Err(ReportError::IncompatibleOptions);
        }

        let offset = self.stats.items_processed;

        // Rows of `other` are in registration order, so the first overflow
        // found here is the earliest one in the combined input.
        let mut new_rows = 0;
        for (key, &seen) in other.rows.iter().zip(&other.first_seen) {
            if self.row_index.contains_key(key) {
                continue;
            }
            if self.rows.len() + new_rows >= self.options.max_rows {
                return Err(ReportError::RowLimitExceeded {
                    row_key: key.clone(),
                    limit: self.options.max_rows,
                    processed: offset + seen,
                });
            }
            new_rows += 1;
        }

        if let Some(err) = other.failure.take() {
            return Err(Self::offset_failure(err, offset));
        }

        let mut other_retained = other.retained.into_iter();
        let rows = other.rows.into_iter().zip(other.first_seen).zip(other.cells);
        for ((key, seen), other_cells) in rows {
            let row = match self.row_index.get(&key) {
                Some(&index) => index,
                None => self.push_row(key, offset + seen),
            };
            for (cell, value) in self.cells[row].iter_mut().zip(other_cells) {
                let acc = mem::replace(cell, self.aggregator.identity());
                *cell = self.aggregator.merge(acc, value);
            }
            if self.options.retain_items {
                if let Some(other_items) = other_retained.next() {
                    for (bucket, items) in self.retained[row].iter_mut().zip(other_items) {
                        bucket.extend(items);
                    }
                }
            }
        }

        self.stats.absorb(&other.stats);
        self.merged = true;
        Ok(self)
    }

    // ========================================================================
    // FINALIZATION
    // ========================================================================

    /// Adds all items and builds.
    pub fn build_from<I>(mut self, items: I) -> Result<Report<A>>
    where
        I: IntoIterator<Item = QueryItem>,
    {
        self.add_items(items)?;
        self.build()
    }

    /// Materializes the report. Fails if any earlier item failed.
    pub fn build(mut self) -> Result<Report<A>> {
        if let Some(err) = self.failure.take() {
            return Err(err);
        }

        let order = self.row_permutation();
        let width = self.columns.len();

        let mut slots: Vec<Option<(String, Vec<A::Value>)>> = self
            .rows
            .into_iter()
            .zip(self.cells)
            .map(Some)
            .collect();
        let mut retained_slots: Vec<Option<Vec<Vec<QueryItem>>>> =
            self.retained.into_iter().map(Some).collect();

        let mut rows = Vec::with_capacity(order.len());
        let mut cells = Vec::with_capacity(order.len() * width);
        let mut retained = self.options.retain_items.then(|| Vec::with_capacity(order.len() * width));

        for index in order {
            if let Some((key, row_cells)) = slots[index].take() {
                rows.push(key);
                cells.extend(row_cells);
            }
            if let (Some(all), Some(Some(row_items))) =
                (retained.as_mut(), retained_slots.get_mut(index).map(Option::take))
            {
                all.extend(row_items);
            }
        }

        if self.stats.items_dropped > 0 {
            warn!("{} unmatched items were dropped from the report", self.stats.items_dropped);
        }
        if self.stats.ambiguous_assignments > 0 {
            warn!(
                "{} items fit more than one column and were assigned to the first match",
                self.stats.ambiguous_assignments
            );
        }
        debug!(
            "built report: {} rows x {} columns from {} items",
            rows.len(),
            width,
            self.stats.items_processed
        );

        Ok(Report::assemble(
            self.aggregator,
            self.columns,
            rows,
            cells,
            retained,
            self.options,
            self.stats,
        ))
    }

    /// Final display order of the registered rows, as indices into `self.rows`.
    fn row_permutation(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.rows.len()).collect();
        let sort_lexically = |slice: &mut [usize]| {
            slice.sort_by(|&a, &b| self.rows[a].cmp(&self.rows[b]));
        };

        match &self.options.row_order {
            RowOrder::Lexicographic => sort_lexically(&mut order),
            RowOrder::FirstSeen if self.merged => sort_lexically(&mut order),
            RowOrder::Explicit(_) if self.merged => sort_lexically(&mut order[self.explicit_rows..]),
            RowOrder::FirstSeen | RowOrder::Explicit(_) => {}
        }
        order
    }

    /// Shifts the item position of a partial's failure by `offset`.
    fn offset_failure(err: ReportError, offset: usize) -> ReportError {
        match err {
            ReportError::NoMatchingColumn { row_key, processed, columns_scanned } => {
                ReportError::NoMatchingColumn { row_key, processed: processed + offset, columns_scanned }
            }
            ReportError::AmbiguousAssignment { row_key, columns, processed } => {
                ReportError::AmbiguousAssignment { row_key, columns, processed: processed + offset }
            }
            ReportError::RowLimitExceeded { row_key, limit, processed } => {
                ReportError::RowLimitExceeded { row_key, limit, processed: processed + offset }
            }
            other => other,
        }
    }

    pub(crate) fn mark_merged(&mut self) {
        self.merged = true;
    }
}
