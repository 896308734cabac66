//! Read/write curve JSON files.
//!
//! Curve JSON is the "portable" representation of an estimate: the full
//! product-limit table plus where the data came from, so `km plot` can redraw
//! it later without the source table.
//!
//! The schema is defined by `domain::CurveFile`.

use std::fs::File;
use std::path::Path;

use chrono::Utc;

use crate::domain::{CurveFile, DataSource, SurvivalCurve};
use crate::error::AppError;

/// Write a curve JSON file.
pub fn write_curve_json(path: &Path, curve: &SurvivalCurve, source: &DataSource) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create curve JSON '{}': {e}", path.display())))?;

    let saved = CurveFile {
        tool: "km".to_string(),
        generated_at: Utc::now(),
        source: source.clone(),
        curve: curve.clone(),
    };

    serde_json::to_writer_pretty(file, &saved)
        .map_err(|e| AppError::new(2, format!("Failed to write curve JSON: {e}")))?;

    Ok(())
}

/// Read a curve JSON file.
pub fn read_curve_json(path: &Path) -> Result<CurveFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open curve JSON '{}': {e}", path.display())))?;
    let curve: CurveFile =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid curve JSON: {e}")))?;
    Ok(curve)
}
