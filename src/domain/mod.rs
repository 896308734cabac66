//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - input observations (`Observation`)
//! - estimator output (`SurvivalCurve`, `CurvePoint`)
//! - run configuration and provenance (`KmConfig`, `DataSource`, `Notice`)

pub mod types;

pub use types::*;
