//! Plotters-powered area/price scatter widget for Ratatui.
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
/// All series and bounds are computed outside the render call so the data prep
/// can be tested on its own.
pub struct ScatterPlottersChart<'a> {
    /// Points kept by the cleaning rule.
    pub kept: &'a [(f64, f64)],
    /// Points dropped as outliers.
    pub outliers: &'a [(f64, f64)],
    /// Living-area cut-off drawn as a vertical line.
    pub threshold: f64,
    /// X bounds (sq ft).
    pub x_bounds: [f64; 2],
    /// Y bounds (USD).
    pub y_bounds: [f64; 2],
    pub x_label: &'a str,
    pub y_label: &'a str,
    pub fmt_x: fn(f64) -> String,
    pub fmt_y: fn(f64) -> String,
}

impl<'a> Widget for ScatterPlottersChart<'a> {
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

        let [x0, x1] = self.x_bounds;
        let [y0, y1] = self.y_bounds;
        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                // Terminal cells are low-res, so keep label areas compact.
                .set_label_area_size(LabelAreaPosition::Left, 8)
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
                .x_label_formatter(&|v| (self.fmt_x)(*v))
                .y_label_formatter(&|v| (self.fmt_y)(*v))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            let kept_color = RGBColor(136, 132, 216);
            let outlier_color = RGBColor(239, 68, 68);

            // 1) Cleaning threshold.
            chart.draw_series(LineSeries::new(
                [(self.threshold, y0), (self.threshold, y1)],
                &outlier_color,
            ))?;

            // 2) Kept points.
            chart.draw_series(self.kept.iter().map(|&(x, y)| Pixel::new((x, y), kept_color)))?;

            // 3) Outliers. `Circle`/`Cross` markers are mis-scaled by the ratatui
            // backend, so these stay single pixels in a louder colour.
            chart.draw_series(self.outliers.iter().map(|&(x, y)| Pixel::new((x, y), outlier_color)))?;

            Ok(())
        });

        widget.render(area, buf);
    }
}
