//! Generated data for the exploratory charts.

pub mod sample;

pub use sample::{DEFAULT_SCATTER_POINTS, ScatterData, ScatterPoint, generate_scatter};
