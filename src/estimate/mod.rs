//! Survival estimation.
//!
//! The Kaplan-Meier product-limit estimator is implemented from scratch as a
//! small pure function so the CLI, the TUI and the tests can share it.

pub mod kaplan_meier;

pub use kaplan_meier::*;
