//! Kaplan-Meier product-limit estimator.
//!
//! For each distinct event time `t_i` (ascending):
//!
//! - `n_i` = subjects with `duration >= t_i` (the risk set)
//! - `d_i` = events at exactly `t_i`
//! - `S(t_i) = Π_{t_j <= t_i} (n_j - d_j) / n_j`
//!
//! Ties are aggregated: every observation sharing a duration is consumed as one
//! group, so simultaneous events produce one combined step. Censoring-only
//! durations contribute a factor of exactly 1.0 and only shrink later risk sets.
//!
//! Variance uses Greenwood's formula; pointwise limits use the log(-log)
//! transform so they stay inside `[0, 1]`.

use crate::domain::{CurvePoint, Observation, SurvivalCurve};
use crate::error::{ComputationError, DataError, SurvivalError};

/// Two-sided 95% normal quantile.
const Z_95: f64 = 1.959_963_984_540_054;

/// Estimate the survival function from right-censored observations.
///
/// Input order is irrelevant; a sorted copy is made internally.
pub fn estimate(observations: &[Observation]) -> Result<SurvivalCurve, SurvivalError> {
    if observations.is_empty() {
        return Err(DataError::EmptyDataset { rows_read: 0 }.into());
    }
    for (idx, obs) in observations.iter().enumerate() {
        obs.validate(idx)?;
    }

    let mut sorted = observations.to_vec();
    sorted.sort_by(|a, b| a.duration.total_cmp(&b.duration));

    let n_total = sorted.len();
    let mut points = Vec::new();
    let mut censor_times = Vec::new();
    let mut survival = 1.0_f64;
    let mut greenwood_sum = 0.0_f64;
    let mut consumed = 0usize;

    let mut start = 0usize;
    while start < n_total {
        let time = sorted[start].duration;
        let mut end = start;
        while end < n_total && sorted[end].duration == time {
            end += 1;
        }
        let group = &sorted[start..end];

        let at_risk = n_total
            .checked_sub(consumed)
            .ok_or_else(|| ComputationError::new(time, "negative risk set"))?;
        let events = group.iter().filter(|o| o.event_observed).count();
        let censored = group.len() - events;
        censor_times.extend(std::iter::repeat_n(time, censored));

        if events > 0 && at_risk > 0 {
            if events > at_risk {
                return Err(ComputationError::new(
                    time,
                    format!("{events} events exceed risk set of {at_risk}"),
                )
                .into());
            }

            let n = at_risk as f64;
            let d = events as f64;
            survival *= (n - d) / n;
            if at_risk > events {
                greenwood_sum += d / (n * (n - d));
            }

            let (std_err, ci_lower, ci_upper) = confidence(survival, greenwood_sum);
            points.push(CurvePoint {
                time,
                survival,
                at_risk,
                events,
                censored,
                std_err,
                ci_lower,
                ci_upper,
            });
        }

        consumed += group.len();
        start = end;
    }

    let n_events: usize = points.iter().map(|p| p.events).sum();
    let max_duration = sorted.last().map(|o| o.duration).unwrap_or(0.0);

    Ok(SurvivalCurve {
        points,
        censor_times,
        n_observations: n_total,
        n_events,
        n_censored: n_total - n_events,
        max_duration,
    })
}

/// Greenwood standard error and 95% log(-log) limits for one step.
fn confidence(survival: f64, greenwood_sum: f64) -> (f64, f64, f64) {
    if survival <= 0.0 {
        return (0.0, 0.0, 0.0);
    }
    let std_err = survival * greenwood_sum.sqrt();
    if survival >= 1.0 || greenwood_sum <= 0.0 {
        return (std_err, survival, survival);
    }

    let log_s = survival.ln();
    let theta_se = greenwood_sum.sqrt() / log_s.abs();
    let lower = survival.powf((Z_95 * theta_se).exp());
    let upper = survival.powf((-Z_95 * theta_se).exp());
    (std_err, lower.clamp(0.0, 1.0), upper.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(pairs: &[(f64, u8)]) -> Vec<Observation> {
        pairs
            .iter()
            .map(|&(t, e)| Observation::new(t, e == 1))
            .collect()
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-12, "expected {b}, got {a}");
    }

    #[test]
    fn known_scenario_matches_hand_computation() {
        let curve = estimate(&obs(&[(5.0, 1), (6.0, 0), (6.0, 1), (7.0, 1)])).unwrap();
        let steps: Vec<(f64, f64)> = curve.points.iter().map(|p| (p.time, p.survival)).collect();
        assert_eq!(steps.len(), 3);
        assert_close(steps[0].0, 5.0);
        assert_close(steps[0].1, 0.75);
        assert_close(steps[1].0, 6.0);
        assert_close(steps[1].1, 0.5);
        assert_close(steps[2].0, 7.0);
        assert_close(steps[2].1, 0.0);

        assert_eq!(curve.points[0].at_risk, 4);
        assert_eq!(curve.points[1].at_risk, 3);
        assert_eq!(curve.points[1].events, 1);
        assert_eq!(curve.points[1].censored, 1);
        assert_eq!(curve.points[2].at_risk, 1);
        assert_eq!(curve.censor_times, vec![6.0]);
        assert_eq!(curve.n_events, 3);
        assert_eq!(curve.n_censored, 1);
    }

    #[test]
    fn greenwood_standard_error() {
        let curve = estimate(&obs(&[(5.0, 1), (6.0, 0), (6.0, 1), (7.0, 1)])).unwrap();
        // 0.75 * sqrt(1/12)
        assert!((curve.points[0].std_err - 0.216_506_350_946_109_6).abs() < 1e-12);
        // 0.5 * sqrt(1/12 + 1/6)
        assert!((curve.points[1].std_err - 0.25).abs() < 1e-12);
        assert_eq!(curve.points[2].std_err, 0.0);

        for p in &curve.points {
            assert!(p.ci_lower <= p.survival && p.survival <= p.ci_upper);
            assert!((0.0..=1.0).contains(&p.ci_lower));
            assert!((0.0..=1.0).contains(&p.ci_upper));
        }
    }

    #[test]
    fn input_order_is_irrelevant() {
        let a = estimate(&obs(&[(5.0, 1), (6.0, 0), (6.0, 1), (7.0, 1)])).unwrap();
        let b = estimate(&obs(&[(7.0, 1), (6.0, 1), (5.0, 1), (6.0, 0)])).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn tied_events_produce_one_step() {
        let curve = estimate(&obs(&[(3.0, 1), (3.0, 1)])).unwrap();
        assert_eq!(curve.points.len(), 1);
        assert_eq!(curve.points[0].at_risk, 2);
        assert_eq!(curve.points[0].events, 2);
        assert_eq!(curve.points[0].survival, 0.0);
    }

    #[test]
    fn censoring_only_is_flat() {
        let curve = estimate(&obs(&[(2.0, 0), (4.0, 0), (9.0, 0)])).unwrap();
        assert!(curve.points.is_empty());
        assert!(curve.is_flat());
        assert_eq!(curve.survival_at(0.0), 1.0);
        assert_eq!(curve.survival_at(100.0), 1.0);
        assert_eq!(curve.max_duration, 9.0);
        assert_eq!(curve.n_censored, 3);
    }

    #[test]
    fn censoring_shrinks_later_risk_sets_without_dropping() {
        let curve = estimate(&obs(&[(1.0, 0), (1.0, 0), (2.0, 1), (3.0, 1)])).unwrap();
        assert_eq!(curve.points.len(), 2);
        assert_eq!(curve.points[0].at_risk, 2);
        assert_close(curve.points[0].survival, 0.5);
        assert_eq!(curve.survival_at(1.5), 1.0);
    }

    #[test]
    fn monotone_and_bounded_on_reference_data() {
        let curve = estimate(&crate::data::reference_observations()).unwrap();
        let mut prev = 1.0;
        for p in &curve.points {
            assert!(p.survival <= prev, "curve rose at t={}", p.time);
            assert!((0.0..=1.0).contains(&p.survival));
            prev = p.survival;
        }
        // Two events at t=5 out of 20 at risk.
        assert_close(curve.points[0].time, 5.0);
        assert_close(curve.points[0].survival, 0.9);
    }

    #[test]
    fn repeated_estimation_is_bit_identical() {
        let data = crate::data::reference_observations();
        let a = estimate(&data).unwrap();
        let b = estimate(&data).unwrap();
        assert_eq!(a.points.len(), b.points.len());
        for (x, y) in a.points.iter().zip(&b.points) {
            assert_eq!(x.survival.to_bits(), y.survival.to_bits());
            assert_eq!(x.std_err.to_bits(), y.std_err.to_bits());
        }
    }

    #[test]
    fn invariants_hold_on_seeded_random_cohorts() {
        use rand::rngs::StdRng;
        use rand::seq::SliceRandom;
        use rand::{Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(20_240_917);
        for case in 0..500 {
            let n = rng.gen_range(1..=40);
            // Every fourth cohort is censoring-only; a small time grid forces ties.
            let event_rate = match case % 4 {
                0 => 0.0,
                1 => 1.0,
                _ => rng.gen_range(0.1..0.9),
            };
            let mut data: Vec<Observation> = (0..n)
                .map(|_| Observation::new(f64::from(rng.gen_range(0u8..12)), rng.gen_bool(event_rate)))
                .collect();

            let curve = estimate(&data).unwrap();
            assert_eq!(curve.n_events + curve.n_censored, n, "case {case}");
            assert_eq!(curve.censor_times.len(), curve.n_censored, "case {case}");
            if event_rate == 0.0 {
                assert!(curve.is_flat(), "case {case}");
            }

            let mut prev_time = f64::NEG_INFINITY;
            let mut prev_survival = 1.0;
            for p in &curve.points {
                assert!(p.time > prev_time, "case {case}: times not increasing");
                assert!(p.survival <= prev_survival, "case {case}: curve rose at t={}", p.time);
                assert!((0.0..=1.0).contains(&p.survival), "case {case}");
                assert!(p.events <= p.at_risk, "case {case}");
                assert!(p.ci_lower <= p.survival && p.survival <= p.ci_upper, "case {case}");
                assert!(p.ci_lower >= 0.0 && p.ci_upper <= 1.0, "case {case}");
                prev_time = p.time;
                prev_survival = p.survival;
            }

            assert_eq!(estimate(&data).unwrap(), curve, "case {case}: not idempotent");
            data.shuffle(&mut rng);
            assert_eq!(estimate(&data).unwrap(), curve, "case {case}: order dependent");
        }
    }

    #[test]
    fn event_at_time_zero() {
        let curve = estimate(&obs(&[(0.0, 1), (1.0, 0)])).unwrap();
        assert_close(curve.points[0].time, 0.0);
        assert_close(curve.points[0].survival, 0.5);
    }

    #[test]
    fn empty_and_invalid_inputs_are_data_errors() {
        assert!(matches!(
            estimate(&[]),
            Err(SurvivalError::Data(DataError::EmptyDataset { .. }))
        ));
        assert!(matches!(
            estimate(&obs(&[(1.0, 1), (-2.0, 0)])),
            Err(SurvivalError::Data(DataError::InvalidObservation { index: 1, .. }))
        ));
        assert!(matches!(
            estimate(&[Observation::event(f64::INFINITY)]),
            Err(SurvivalError::Data(_))
        ));
    }
}
