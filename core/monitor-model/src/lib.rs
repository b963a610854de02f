//! FILENAME: core/monitor-model/src/lib.rs
//! PURPOSE: Shared input types for the monitoring report engine.
//! CONTEXT: The upstream query layer produces `QueryItem`s; the report engine
//! only ever reads them. Nothing in this crate knows about columns or reports.

pub mod item;
pub mod value;

pub use item::QueryItem;
pub use value::AttributeValue;
