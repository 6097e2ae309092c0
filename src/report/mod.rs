//! Reporting utilities: prediction summaries and the static report pages.

pub mod format;

pub use format::*;
