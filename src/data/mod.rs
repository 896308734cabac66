//! Built-in datasets.
//!
//! - `reference`: the fixed 20-patient cohort substituted when an input table
//!   cannot be used
//! - `fixture`: generator for `PatientID,time,event` CSV fixtures

pub mod fixture;
pub mod reference;

pub use fixture::*;
pub use reference::*;
