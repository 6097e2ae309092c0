//! Plain-text charts for the CLI.

pub mod ascii;

pub use ascii::{Bar, render_bars, render_scatter};
