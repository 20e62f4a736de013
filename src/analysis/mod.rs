//! Case aggregation.
//!
//! Validation, grouping, deltas and rankings over an in-memory dataset.

pub mod aggregator;

pub use aggregator::*;
