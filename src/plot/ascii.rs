//! ASCII/Unicode plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - horizontal bars: `#`
//! - scatter points: `o` (kept), `X` (outlier)
//! - cleaning threshold: `|`

use crate::data::ScatterPoint;

/// One labelled bar.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub value: f64,
    /// Pre-formatted value shown after the bar.
    pub display: String,
}

impl Bar {
    pub fn new(label: impl Into<String>, value: f64, display: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value,
            display: display.into(),
        }
    }
}

/// Render horizontal bars where `full_scale` fills `width` columns.
///
/// Bars are measured by absolute value (so negative coefficients draw left to
/// right as well) and capped at the full width.
pub fn render_bars(bars: &[Bar], full_scale: f64, width: usize) -> String {
    let width = width.max(1);
    let label_w = bars.iter().map(|b| b.label.chars().count()).max().unwrap_or(0);

    let mut out = String::new();
    for bar in bars {
        let filled = bar_len(bar.value, full_scale, width);
        let line = format!(
            "{:<label_w$} |{}{} {}",
            bar.label,
            "#".repeat(filled),
            " ".repeat(width - filled),
            bar.display,
        );
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

fn bar_len(value: f64, full_scale: f64, width: usize) -> usize {
    if !(value.is_finite() && full_scale.is_finite() && full_scale > 0.0) {
        return 0;
    }
    let u = (value.abs() / full_scale).clamp(0.0, 1.0);
    (u * width as f64).round() as usize
}

/// Render the area/price scatter with the cleaning threshold.
pub fn render_scatter(points: &[ScatterPoint], threshold: f64, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (x_min, x_max) = range(points.iter().map(|p| p.area).chain(std::iter::once(threshold)))
        .unwrap_or((0.0, 1.0));
    let (y_min, y_max) = range(points.iter().map(|p| p.price)).unwrap_or((0.0, 1.0));
    let (x_min, x_max) = pad_range(x_min, x_max, 0.02);
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Threshold first so points overlay it.
    let tx = map_x(threshold, x_min, x_max, width);
    draw_line(&mut grid, tx, 0, tx, height - 1, '|');

    for p in points {
        let x = map_x(p.area, x_min, x_max, width);
        let y = map_y(p.price, y_min, y_max, height);
        grid[y][x] = if p.outlier { 'X' } else { 'o' };
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: area=[{x_min:.0}, {x_max:.0}] sq ft | price=[{y_min:.0}, {y_max:.0}] | threshold={threshold:.0}\n"
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out
}

fn range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for v in values {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if lo.is_finite() && hi.is_finite() && hi > lo {
        Some((lo, hi))
    } else {
        None
    }
}

fn pad_range(lo: f64, hi: f64, frac: f64) -> (f64, f64) {
    let pad = ((hi - lo).abs() * frac).max(1e-12);
    (lo - pad, hi + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham-ish).
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
