//! Analysis modules.
//!
//! Normalization of raw tables, mode bucketing, and share aggregation.

pub mod aggregator;
pub mod buckets;
pub mod normalizer;

pub use aggregator::*;
pub use buckets::ModeBuckets;
pub use normalizer::{normalize, ColumnNames};
