//! Rendering data for a Kaplan-Meier chart.
//!
//! The curve is drawn "steps-post": the value recorded at `t_i` holds on
//! `[t_i, t_{i+1})`. We expand it into explicit polyline vertices so any line
//! renderer (ASCII grid, Plotters) draws the same shape.

use crate::domain::SurvivalCurve;

/// Headroom applied to both axes.
pub const AXIS_PAD: f64 = 1.05;

/// Everything a chart needs, computed outside the render call.
#[derive(Debug, Clone, PartialEq)]
pub struct StepPlot {
    /// Polyline vertices starting at `(0, 1.0)`.
    pub vertices: Vec<(f64, f64)>,
    /// `(time, S(time))` for each censored subject.
    pub censor_marks: Vec<(f64, f64)>,
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
}

pub fn step_plot(curve: &SurvivalCurve) -> StepPlot {
    let mut vertices = Vec::with_capacity(curve.points.len() * 2 + 2);
    vertices.push((0.0, 1.0));

    let mut prev = 1.0;
    for p in &curve.points {
        vertices.push((p.time, prev));
        vertices.push((p.time, p.survival));
        prev = p.survival;
    }

    // A flat curve has no event times; run it out to the longest follow-up.
    if curve.points.is_empty() && curve.max_duration > 0.0 {
        vertices.push((curve.max_duration, 1.0));
    }

    let x_extent = curve.last_event_time().unwrap_or(curve.max_duration);
    let x_max = if x_extent.is_finite() && x_extent > 0.0 {
        x_extent * AXIS_PAD
    } else {
        AXIS_PAD
    };

    // Follow-up past the axis end has no place on the chart.
    let censor_marks = curve
        .censor_times
        .iter()
        .filter(|&&t| t <= x_max)
        .map(|&t| (t, curve.survival_at(t)))
        .collect();

    StepPlot {
        vertices,
        censor_marks,
        x_bounds: [0.0, x_max],
        y_bounds: [0.0, AXIS_PAD],
    }
}
