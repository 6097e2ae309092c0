//! Domain types used throughout the crate.
//!
//! This module defines:
//!
//! - house attributes and their domains (`HouseAttributes`, `Attribute`)
//! - the neighborhood tier record (`NeighborhoodTier`)
//! - estimator outputs (`PredictionResult`, `ModelEstimate`)

pub mod types;

pub use types::*;
