//! Plotters-powered Kaplan-Meier chart widget for Ratatui.
//!
//! We render Plotters output into the Ratatui buffer using `plotters-ratatui-backend`.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// A lightweight, render-only chart description.
///
/// All series and bounds are computed outside the render call (see
/// `plot::step_plot`), so `render()` only draws.
pub struct KmPlottersChart<'a> {
    /// Step-post polyline of the survival curve.
    pub steps: &'a [(f64, f64)],
    /// Censoring marks (drawn only when `show_censor` is set).
    pub censor: &'a [(f64, f64)],
    pub show_censor: bool,
    /// X bounds (time).
    pub x_bounds: [f64; 2],
    /// Y bounds (survival probability).
    pub y_bounds: [f64; 2],
    pub x_label: &'a str,
    pub y_label: &'a str,
}

impl Widget for KmPlottersChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // When the available area is too small, Plotters may fail to build a chart.
        // In that case, we render a small hint rather than panicking.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let x0 = self.x_bounds[0];
        let x1 = self.x_bounds[1];
        let y0 = self.y_bounds[0];
        let y1 = self.y_bounds[1];

        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                // Terminal cells are low-res, so keep label areas compact.
                .set_label_area_size(LabelAreaPosition::Left, 6)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc(self.x_label)
                .y_desc(self.y_label)
                .x_labels(5)
                .y_labels(5)
                .x_label_formatter(&|v| format!("{v:.1}"))
                .y_label_formatter(&|v| format!("{v:.2}"))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            let curve_color = RGBColor(0, 160, 255);
            let censor_color = RGBColor(255, 200, 0);

            chart.draw_series(LineSeries::new(self.steps.iter().copied(), &curve_color))?;

            // `Pixel` rather than `Cross`/`Circle`: the backend scales marker
            // sizes badly on terminal canvases.
            if self.show_censor {
                chart.draw_series(
                    self.censor
                        .iter()
                        .map(|&(x, y)| Pixel::new((x, y), censor_color)),
                )?;
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}
