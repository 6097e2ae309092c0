//! Pseudo-model table for the blended ensemble.
//!
//! Models are plain data records so the estimator can iterate them uniformly.

pub mod model;

pub use model::*;
