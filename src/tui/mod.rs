//! Ratatui-based terminal dashboard.
//!
//! Three pages:
//! - Simulator: adjust the house attributes and watch every pseudo-model react
//! - Models: single-model RMSLE and the ensemble weights
//! - EDA: outlier scatter and the strongest feature correlations

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use chrono::Local;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Clear, Gauge, List, ListItem, Paragraph},
};

use crate::app::pipeline::{self, NoiseMode};
use crate::catalog::{MODEL_PERFORMANCE, SUMMARY, TOP_FEATURES};
use crate::cli::TuiArgs;
use crate::data::{DEFAULT_SCATTER_POINTS, ScatterData, generate_scatter};
use crate::domain::{Attribute, HouseAttributes, PredictionResult};
use crate::error::AppError;
use crate::estimator::{Estimator, row_seed};
use crate::io::{PredictionFile, write_prediction_json};
use crate::report::{PRICE_BAR_FULL_SCALE, fmt_usd};

mod plotters_chart;

use plotters_chart::ScatterPlottersChart;

/// Start the TUI.
pub fn run(args: TuiArgs) -> Result<(), AppError> {
    let estimator = pipeline::build_estimator(&args.estimator)?;
    let mut app = App::new(estimator, args.seed)?;

    let _guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Simulator,
    Models,
    Eda,
}

impl View {
    const ALL: [View; 3] = [View::Simulator, View::Models, View::Eda];

    fn title(self) -> &'static str {
        match self {
            View::Simulator => "1 Simulator",
            View::Models => "2 Models",
            View::Eda => "3 EDA",
        }
    }

    fn next(self) -> Self {
        match self {
            View::Simulator => View::Models,
            View::Models => View::Eda,
            View::Eda => View::Simulator,
        }
    }

    fn prev(self) -> Self {
        match self {
            View::Simulator => View::Eda,
            View::Models => View::Simulator,
            View::Eda => View::Models,
        }
    }
}

struct App {
    estimator: Estimator,
    attrs: HouseAttributes,
    selected_field: usize,
    view: View,
    noise_enabled: bool,
    /// Session seed; each recompute derives its own draw seed from it.
    seed: u64,
    draws: usize,
    draw_seed: u64,
    result: Option<PredictionResult>,
    scatter: ScatterData,
    status: String,
}

impl App {
    fn new(estimator: Estimator, seed: Option<u64>) -> Result<Self, AppError> {
        let seed = seed.unwrap_or_else(rand::random);
        let scatter = generate_scatter(DEFAULT_SCATTER_POINTS, seed)?;
        let mut app = Self {
            estimator,
            attrs: HouseAttributes::default(),
            selected_field: 0,
            view: View::Simulator,
            noise_enabled: true,
            seed,
            draws: 0,
            draw_seed: seed,
            result: None,
            scatter,
            status: String::new(),
        };
        app.recompute();
        app.status = format!("seed: {seed}");
        Ok(app)
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the user asked to quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Tab => self.view = self.view.next(),
            KeyCode::BackTab => self.view = self.view.prev(),
            KeyCode::Char('1') => self.view = View::Simulator,
            KeyCode::Char('2') => self.view = View::Models,
            KeyCode::Char('3') => self.view = View::Eda,
            KeyCode::Up => {
                if self.selected_field > 0 {
                    self.selected_field -= 1;
                }
            }
            KeyCode::Down => {
                if self.selected_field + 1 < Attribute::ALL.len() {
                    self.selected_field += 1;
                }
            }
            KeyCode::Left => self.adjust_field(-1),
            KeyCode::Right => self.adjust_field(1),
            KeyCode::Char('r') => {
                self.recompute();
                self.status = if self.noise_enabled {
                    format!("Redrew noise (draw seed: {}).", self.draw_seed)
                } else {
                    "Noise is off.".to_string()
                };
            }
            KeyCode::Char('n') => {
                self.noise_enabled = !self.noise_enabled;
                self.recompute();
                self.status = if self.noise_enabled {
                    "Noise on.".to_string()
                } else {
                    "Noise off (deterministic prices).".to_string()
                };
            }
            KeyCode::Char('e') => self.export(),
            _ => {}
        }
        false
    }

    fn selected_attribute(&self) -> Attribute {
        Attribute::ALL[self.selected_field.min(Attribute::ALL.len() - 1)]
    }

    fn adjust_field(&mut self, delta: i32) {
        let attr = self.selected_attribute();
        self.attrs.nudge(attr, delta);
        self.recompute();
        self.status = format!("{}: {}", attr.label(), self.attrs.get(attr));
    }

    fn noise_mode(&self) -> NoiseMode {
        if self.noise_enabled {
            NoiseMode::Seeded(self.draw_seed)
        } else {
            NoiseMode::Off
        }
    }

    /// Re-run the estimate. With noise on, every call draws fresh offsets from
    /// a new stream so `estimate --seed <draw seed>` reproduces what is shown.
    fn recompute(&mut self) {
        if self.noise_enabled {
            self.draw_seed = row_seed(self.seed, self.draws);
            self.draws += 1;
        }
        match pipeline::run_estimate(&self.estimator, &self.attrs, self.noise_mode()) {
            Ok(result) => self.result = Some(result),
            Err(err) => {
                tracing::warn!(%err, "estimate failed");
                self.result = None;
                self.status = err.to_string();
            }
        }
    }

    fn export(&mut self) {
        let Some(result) = &self.result else {
            self.status = "Nothing to export.".to_string();
            return;
        };
        let path = PathBuf::from(format!("ames_prediction_{}.json", Local::now().format("%Y%m%d_%H%M%S")));
        let file = PredictionFile::new(result.clone(), self.noise_mode().seed(), self.estimator.noise_amplitude());
        self.status = match write_prediction_json(&path, &file) {
            Ok(()) => format!("Wrote {}", path.display()),
            Err(err) => format!("Export failed: {err}"),
        };
    }

    fn draw(&self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        match self.view {
            View::Simulator => self.draw_simulator(frame, chunks[1]),
            View::Models => self.draw_models(frame, chunks[1]),
            View::Eda => self.draw_eda(frame, chunks[1]),
        }
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut tabs = vec![
            Span::styled("ames", Style::default().fg(Color::Cyan)),
            Span::raw(" | "),
        ];
        for view in View::ALL {
            let style = if view == self.view {
                Style::default().fg(Color::Black).bg(Color::White)
            } else {
                Style::default().fg(Color::Gray)
            };
            tabs.push(Span::styled(format!(" {} ", view.title()), style));
            tabs.push(Span::raw(" "));
        }

        let price = self
            .result
            .as_ref()
            .map(|r| fmt_usd(r.final_price))
            .unwrap_or_else(|| "-".to_string());
        let summary = Line::from(vec![
            Span::raw("Final price (weighted ensemble): "),
            Span::styled(price, Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
            Span::styled(
                format!(
                    "  | public score {:.5} | RMSLE {:.4}",
                    SUMMARY.public_score, SUMMARY.final_rmsle
                ),
                Style::default().fg(Color::Gray),
            ),
        ]);

        let p = Paragraph::new(Text::from(vec![Line::from(tabs), summary]))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_simulator(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(46), Constraint::Min(0)])
            .split(area);

        self.draw_settings(frame, chunks[0]);
        self.draw_breakdown(frame, chunks[1]);
    }

    fn draw_settings(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let items: Vec<ListItem> = Attribute::ALL
            .iter()
            .map(|&attr| {
                let value = self.attrs.get(attr);
                let text = match attr {
                    Attribute::NeighborhoodRank => {
                        let tier = self
                            .estimator
                            .tier(value)
                            .map(|t| format!("{} (x{:.2})", t.name, t.price_mod))
                            .unwrap_or_else(|| "unlisted".to_string());
                        format!("{}: {value}  {tier}", attr.label())
                    }
                    _ => {
                        let (lo, hi) = attr.domain();
                        format!("{}: {value}  [{lo}-{hi}]", attr.label())
                    }
                };
                ListItem::new(text)
            })
            .collect();

        let list = List::new(items)
            .block(Block::default().title("House").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ratatui::widgets::ListState::default();
        state.select(Some(self.selected_field));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_breakdown(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default()
            .title("Per-model estimates (heterogeneous mix)")
            .borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some(result) = &self.result else {
            let msg = Paragraph::new("No estimate (see status line).").style(Style::default().fg(Color::Yellow));
            frame.render_widget(msg, inner);
            return;
        };

        let base = format!(
            "raw {}  x{:.2}  = {}",
            fmt_usd(result.raw_value),
            result.price_mod,
            fmt_usd(result.adjusted_value)
        );
        let rows: Vec<GaugeRow> = result
            .estimates
            .iter()
            .map(|e| GaugeRow {
                label: format!("{:<11} {:>10}  w={:.2}", e.name, fmt_usd(e.price), e.weight),
                ratio: e.price / PRICE_BAR_FULL_SCALE,
                color: parse_hex_color(&e.color).unwrap_or(Color::Gray),
            })
            .collect();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Min(0)])
            .split(inner);
        frame.render_widget(Paragraph::new(base).style(Style::default().fg(Color::Gray)), chunks[0]);
        draw_gauge_rows(frame, chunks[1], &rows);
    }

    fn draw_models(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(area);

        // RMSLE scaled to integers for the bar chart.
        let bars: Vec<Bar> = MODEL_PERFORMANCE
            .iter()
            .map(|m| {
                let color = if m.name == "Lasso" { Color::Blue } else { Color::Gray };
                Bar::default()
                    .value((m.rmsle * 10_000.0).round() as u64)
                    .text_value(format!("{:.4}", m.rmsle))
                    .label(Line::from(m.name))
                    .style(Style::default().fg(color))
            })
            .collect();
        let chart = BarChart::default()
            .block(Block::default().title("Single-model RMSLE (lower is better)").borders(Borders::ALL))
            .data(BarGroup::default().bars(&bars))
            .bar_width(9)
            .bar_gap(2)
            .max(1500);
        frame.render_widget(chart, chunks[0]);

        let block = Block::default().title("Ensemble weights").borders(Borders::ALL);
        let inner = block.inner(chunks[1]);
        frame.render_widget(block, chunks[1]);
        let rows: Vec<GaugeRow> = self
            .estimator
            .models()
            .iter()
            .zip(self.estimator.weights())
            .map(|(m, &w)| GaugeRow {
                label: format!("{:<11} {:>4.0}%  {}", m.name, w * 100.0, m.role),
                ratio: w,
                color: parse_hex_color(&m.color).unwrap_or(Color::Gray),
            })
            .collect();
        draw_gauge_rows(frame, inner, &rows);
    }

    fn draw_eda(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(area);

        let block = Block::default()
            .title(format!(
                "GrLivArea vs SalePrice ({} outliers above {:.0} sq ft)",
                self.scatter.stats.n_outliers, self.scatter.threshold
            ))
            .borders(Borders::ALL);
        let inner = block.inner(chunks[0]);
        frame.render_widget(block, chunks[0]);
        frame.render_widget(Clear, inner);

        let series = scatter_series(&self.scatter);
        let widget = ScatterPlottersChart {
            kept: &series.kept,
            outliers: &series.outliers,
            threshold: self.scatter.threshold,
            x_bounds: series.x_bounds,
            y_bounds: series.y_bounds,
            x_label: "living area (sq ft)",
            y_label: "price ($)",
            fmt_x: fmt_axis_area,
            fmt_y: fmt_axis_price,
        };
        frame.render_widget(widget, inner);

        let block = Block::default().title("Correlation with SalePrice").borders(Borders::ALL);
        let inner = block.inner(chunks[1]);
        frame.render_widget(block, chunks[1]);
        let rows: Vec<GaugeRow> = TOP_FEATURES
            .iter()
            .map(|f| GaugeRow {
                label: format!("{:<12} {:.2}", f.feature, f.correlation),
                ratio: f.correlation,
                color: Color::Blue,
            })
            .collect();
        draw_gauge_rows(frame, inner, &rows);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "Tab/1-3 page  ↑/↓ select  ←/→ adjust  r redraw  n noise  e export  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

struct GaugeRow {
    label: String,
    ratio: f64,
    color: Color,
}

/// One single-line gauge per row, top to bottom, as many as fit.
fn draw_gauge_rows(frame: &mut ratatui::Frame<'_>, area: Rect, rows: &[GaugeRow]) {
    for (i, row) in rows.iter().enumerate() {
        let y = area.y + (i as u16) * 2;
        if y >= area.y + area.height {
            break;
        }
        let rect = Rect {
            x: area.x,
            y,
            width: area.width,
            height: 1,
        };
        let ratio = if row.ratio.is_finite() { row.ratio.clamp(0.0, 1.0) } else { 0.0 };
        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(row.color).bg(Color::Black))
            .ratio(ratio)
            .label(row.label.clone());
        frame.render_widget(gauge, rect);
    }
}

/// Parse `#rrggbb`.
fn parse_hex_color(s: &str) -> Option<Color> {
    let hex = s.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?))
}

struct ScatterSeries {
    kept: Vec<(f64, f64)>,
    outliers: Vec<(f64, f64)>,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
}

/// Split the scatter for Plotters and pad the bounds.
fn scatter_series(data: &ScatterData) -> ScatterSeries {
    let mut kept = Vec::with_capacity(data.points.len());
    let mut outliers = Vec::new();
    for p in &data.points {
        if p.outlier {
            outliers.push((p.area, p.price));
        } else {
            kept.push((p.area, p.price));
        }
    }

    let s = &data.stats;
    let x_lo = s.area_min.min(data.threshold);
    let x_hi = s.area_max.max(data.threshold);
    let (mut y_lo, mut y_hi) = (s.price_min, s.price_max);
    if !(y_lo.is_finite() && y_hi.is_finite()) || y_hi <= y_lo {
        y_lo = 0.0;
        y_hi = 1.0;
    }

    let x_pad = ((x_hi - x_lo).abs() * 0.03).max(1.0);
    let y_pad = ((y_hi - y_lo).abs() * 0.05).max(1.0);
    ScatterSeries {
        kept,
        outliers,
        x_bounds: [x_lo - x_pad, x_hi + x_pad],
        y_bounds: [(y_lo - y_pad).max(0.0), y_hi + y_pad],
    }
}

fn fmt_axis_area(v: f64) -> String {
    format!("{v:.0}")
}

fn fmt_axis_price(v: f64) -> String {
    format!("{:.0}k", v / 1000.0)
}
