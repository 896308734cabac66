//! `km-curves` library crate.
//!
//! The binary (`km`) is a thin wrapper around this library so that:
//!
//! - the estimator is testable without spawning processes
//! - the CLI and the TUI share one pipeline
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod estimate;
pub mod io;
pub mod plot;
pub mod report;
pub mod tui;
