//! FILENAME: core/report-engine/src/parallel.rs
//! Parallel build - partition, fold independently, merge.
//!
//! Each partition is folded by its own forked builder on the rayon pool; no
//! state is shared while folding. Partials are then merged cell by cell in
//! input order, which keeps retained items in input order too.
//!
//! Caller-visible difference from `build`: first-seen row order is not
//! defined across partitions, so rows come out sorted by key (after any
//! explicit rows).

use log::debug;
use monitor_model::QueryItem;
use rayon::prelude::*;

use crate::aggregator::Aggregator;
use crate::builder::ReportBuilder;
use crate::error::Result;
use crate::report::Report;

impl<A: Aggregator> ReportBuilder<A> {
    /// Builds the report from `items` split into `partitions` chunks
    /// (`0` means one per rayon worker thread).
    ///
    /// On failure the error of the earliest failing partition is returned,
    /// with `processed` counted from the start of the whole input.
    pub fn build_parallel(self, items: Vec<QueryItem>, partitions: usize) -> Result<Report<A>> {
        let requested = if partitions == 0 {
            rayon::current_num_threads()
        } else {
            partitions
        };
        let partitions = requested.min(items.len()).max(1);
        let chunk_size = items.len().div_ceil(partitions).max(1);

        let mut chunks: Vec<Vec<QueryItem>> = Vec::with_capacity(partitions);
        let mut rest = items.into_iter().peekable();
        while rest.peek().is_some() {
            chunks.push(rest.by_ref().take(chunk_size).collect());
        }

        debug!(
            "parallel report build: {} partitions of up to {} items",
            chunks.len(),
            chunk_size
        );

        // A failing partial keeps its error; `merge` places it in the whole input.
        let template = &self;
        let partials: Vec<ReportBuilder<A>> = chunks
            .into_par_iter()
            .map(|chunk| {
                let mut partial = template.fork();
                if let Err(err) = partial.add_items(chunk) {
                    debug!("parallel partition failed: {}", err);
                }
                partial
            })
            .collect();

        let mut merged = self;
        for partial in partials {
            merged = merged.merge(partial)?;
        }
        merged.mark_merged();
        merged.build()
    }
}
