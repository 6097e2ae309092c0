//! Input/output helpers.
//!
//! - batch CSV read/evaluate/write (`batch`)
//! - single prediction JSON export (`export`)

pub mod batch;
pub mod export;

pub use batch::*;
pub use export::*;
