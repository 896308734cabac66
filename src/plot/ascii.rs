//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - horizontal runs of the survival curve: `-`
//! - drops at event times: `|`
//! - optional censoring marks: `+`

use crate::domain::SurvivalCurve;
use crate::plot::steps::{StepPlot, step_plot};

/// Render a plot for an in-memory curve.
pub fn render_ascii_plot(curve: &SurvivalCurve, width: usize, height: usize, censor_marks: bool) -> String {
    render_step_plot(&step_plot(curve), width, height, censor_marks)
}

/// Render precomputed step data.
pub fn render_step_plot(plot: &StepPlot, width: usize, height: usize, censor_marks: bool) -> String {
    let width = width.max(10);
    let height = height.max(5);
    let [x_min, x_max] = plot.x_bounds;
    let [y_min, y_max] = plot.y_bounds;

    let mut grid = vec![vec![' '; width]; height];

    let mut prev: Option<(usize, usize)> = None;
    for &(t, s) in &plot.vertices {
        let x = map_x(t, x_min, x_max, width);
        let y = map_y(s, y_min, y_max, height);
        match prev {
            Some((x0, y0)) => {
                let ch = if y0 == y { '-' } else { '|' };
                draw_line(&mut grid, x0, y0, x, y, ch);
            }
            None => grid[y][x] = '-',
        }
        prev = Some((x, y));
    }

    if censor_marks {
        for &(t, s) in &plot.censor_marks {
            let x = map_x(t, x_min, x_max, width);
            let y = map_y(s, y_min, y_max, height);
            grid[y][x] = '+';
        }
    }

    // Build final string. We include a small header with ranges.
    let mut out = String::new();
    out.push_str(&format!(
        "Plot: time=[{x_min:.3}, {x_max:.3}] | survival=[{y_min:.2}, {y_max:.2}]\n"
    ));

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    out
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham-ish). Only fills blank cells.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
