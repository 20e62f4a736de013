//! Report writers.

pub mod generator;

pub use generator::*;
