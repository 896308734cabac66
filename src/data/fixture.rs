//! Fixture CSV generation (`PatientID,time,event`).
//!
//! Two flavours:
//! - the fixed 20-row table used for manual testing of the chart
//! - a seeded synthetic cohort: exponential event times, exponential
//!   (random) censoring, plus administrative censoring at the end of follow-up
//!
//! Synthetic output is deterministic for a given `FixtureSpec`.

use std::fs::File;
use std::path::Path;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Exp};

use crate::error::AppError;

const FIXED_TIMES: [f64; 20] = [
    5.0, 6.0, 6.0, 7.0, 9.0, 10.0, 12.0, 15.0, 17.0, 25.0, 30.0, 32.0, 33.0, 34.0, 40.0, 8.0,
    11.0, 13.0, 18.0, 22.0,
];

const FIXED_EVENTS: [u8; 20] = [1, 0, 1, 1, 1, 0, 1, 1, 1, 1, 1, 0, 1, 1, 1, 1, 0, 1, 1, 1];

#[derive(Debug, Clone, PartialEq)]
pub struct FixtureRow {
    pub patient_id: usize,
    pub time: f64,
    pub event: u8,
}

/// Parameters for a synthetic cohort.
#[derive(Debug, Clone)]
pub struct FixtureSpec {
    pub count: usize,
    pub seed: u64,
    /// Median of the event-time distribution.
    pub median_survival: f64,
    /// Median of the random-censoring distribution.
    pub median_censoring: f64,
    /// Administrative end of study; everyone still event-free is censored here.
    pub follow_up: f64,
}

impl Default for FixtureSpec {
    fn default() -> Self {
        Self {
            count: 100,
            seed: 42,
            median_survival: 15.0,
            median_censoring: 60.0,
            follow_up: 40.0,
        }
    }
}

pub fn fixed_fixture() -> Vec<FixtureRow> {
    FIXED_TIMES
        .iter()
        .zip(FIXED_EVENTS.iter())
        .enumerate()
        .map(|(i, (&time, &event))| FixtureRow {
            patient_id: i + 1,
            time,
            event,
        })
        .collect()
}

pub fn synthetic_fixture(spec: &FixtureSpec) -> Result<Vec<FixtureRow>, AppError> {
    let event_dist = exp_with_median(spec.median_survival, "--median")?;
    let censor_dist = exp_with_median(spec.median_censoring, "--censor-median")?;
    if !(spec.follow_up.is_finite() && spec.follow_up > 0.0) {
        return Err(AppError::new(2, "--follow-up must be finite and > 0."));
    }

    let mut rng = StdRng::seed_from_u64(spec.seed);
    let mut rows = Vec::with_capacity(spec.count);
    for i in 0..spec.count {
        let event_time: f64 = event_dist.sample(&mut rng);
        let censor_time: f64 = censor_dist.sample(&mut rng).min(spec.follow_up);

        let (time, event) = if event_time <= censor_time {
            (event_time, 1)
        } else {
            (censor_time, 0)
        };

        rows.push(FixtureRow {
            patient_id: i + 1,
            time: (time * 10.0).round() / 10.0,
            event,
        });
    }

    Ok(rows)
}

fn exp_with_median(median: f64, flag: &str) -> Result<Exp<f64>, AppError> {
    if !(median.is_finite() && median > 0.0) {
        return Err(AppError::new(2, format!("{flag} must be finite and > 0.")));
    }
    Exp::new(std::f64::consts::LN_2 / median)
        .map_err(|e| AppError::new(2, format!("Invalid {flag}: {e}")))
}

/// Write fixture rows as CSV.
pub fn write_fixture_csv(path: &Path, rows: &[FixtureRow]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create fixture CSV '{}': {e}", path.display())))?;
    let mut writer = csv::Writer::from_writer(file);

    writer
        .write_record(["PatientID", "time", "event"])
        .map_err(|e| AppError::new(2, format!("Failed to write fixture CSV header: {e}")))?;
    for row in rows {
        writer
            .write_record([
                row.patient_id.to_string(),
                row.time.to_string(),
                row.event.to_string(),
            ])
            .map_err(|e| AppError::new(2, format!("Failed to write fixture CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush fixture CSV: {e}")))?;

    Ok(())
}
