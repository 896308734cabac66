//! Export the product-limit table to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::SurvivalCurve;
use crate::error::AppError;

pub const TABLE_HEADER: &str = "time,survival,at_risk,events,censored,std_err,ci_lower,ci_upper";

/// Write one row per event time.
pub fn write_table_csv(path: &Path, curve: &SurvivalCurve) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_table(file, curve)
}

pub fn write_table<W: Write>(mut out: W, curve: &SurvivalCurve) -> Result<(), AppError> {
    writeln!(out, "{TABLE_HEADER}")
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for p in &curve.points {
        writeln!(
            out,
            "{},{:.10},{},{},{},{:.10},{:.10},{:.10}",
            p.time, p.survival, p.at_risk, p.events, p.censored, p.std_err, p.ci_lower, p.ci_upper,
        )
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Observation;
    use crate::estimate::estimate;

    #[test]
    fn table_has_one_row_per_event_time() {
        let curve = estimate(&[
            Observation::event(5.0),
            Observation::censored(6.0),
            Observation::event(6.0),
            Observation::event(7.0),
        ])
        .unwrap();

        let mut buf = Vec::new();
        write_table(&mut buf, &curve).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], TABLE_HEADER);
        assert_eq!(lines.len(), 4);
        assert!(lines[2].starts_with("6,0.5000000000,3,1,1,"));
    }
}
