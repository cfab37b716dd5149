//! Tabular results and the aggregation transforms that build them.

pub mod table;
pub mod transforms;

pub use table::{Column, TabularResult};
