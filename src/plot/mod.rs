//! Plot preparation and terminal rendering.
//!
//! - `steps`: the renderer-agnostic step-post series and axis bounds
//! - `ascii`: fixed-grid text rendering for the CLI

pub mod ascii;
pub mod steps;

pub use ascii::*;
pub use steps::*;
