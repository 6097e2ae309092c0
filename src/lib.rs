//! `ames-blend` library crate.
//!
//! The binary (`ames`) is a thin wrapper around this library so that:
//!
//! - the estimator is testable without spawning processes
//! - the CLI, batch runner and TUI share one pipeline
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod estimator;
pub mod io;
pub mod models;
pub mod plot;
pub mod report;
pub mod tui;
