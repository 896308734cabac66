//! The built-in reference cohort.
//!
//! Twenty synthetic patients with preset follow-up times and event flags. The
//! pipeline falls back to this cohort (with a visible warning) whenever the
//! supplied table is missing columns or has no valid rows.

use crate::domain::Observation;

pub const REFERENCE_TIMES: [f64; 20] = [
    5.0, 6.0, 6.0, 7.0, 9.0, 10.0, 12.0, 15.0, 17.0, 25.0, 30.0, 32.0, 33.0, 34.0, 40.0, 5.0, 8.0,
    11.0, 13.0, 18.0,
];

pub const REFERENCE_EVENTS: [u8; 20] = [1, 0, 1, 1, 1, 0, 1, 1, 1, 1, 1, 0, 1, 1, 1, 1, 0, 1, 1, 1];

pub fn reference_observations() -> Vec<Observation> {
    REFERENCE_TIMES
        .iter()
        .zip(REFERENCE_EVENTS.iter())
        .map(|(&t, &e)| Observation::new(t, e == 1))
        .collect()
}
