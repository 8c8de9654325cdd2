//! Animated and static chart rendering.
//!
//! A `PlotSeries` becomes two artifacts:
//! - a GIF whose frame `k` draws the first `k + 1` points, with the completed
//!   chart held for a while before the animation loops
//! - a JPEG of the completed chart
//!
//! Axes are fixed to the full series extent so the line grows inside a stable
//! frame instead of rescaling every step.

use std::path::Path;

use chrono::NaiveDate;
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use tracing::info;

use crate::domain::{PlotSeries, RenderStyle};
use crate::error::AppError;

pub mod font;

pub use font::{discover_font, enable_text};

const PANEL_BACKGROUND: RGBColor = RGBColor(229, 229, 229);
const LINE_ALPHA: f64 = 0.5;
const LINE_WIDTH: u32 = 5;

/// What was written by [`render_animation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSummary {
    pub frames: usize,
    pub text: bool,
}

/// Write the animated GIF and the static JPEG for `plot`.
pub fn render_animation(
    plot: &PlotSeries,
    style: &RenderStyle,
    gif_path: &Path,
    jpg_path: &Path,
) -> Result<RenderSummary, AppError> {
    let bounds = Bounds::of(&plot.points)
        .ok_or_else(|| AppError::new(3, format!("Nothing to plot for '{}'.", plot.title)))?;
    let text = enable_text(style.font.as_deref());

    let frames = render_gif(plot, style, &bounds, text, gif_path)?;
    render_still(plot, style, &bounds, text, jpg_path)?;

    info!(
        gif = %gif_path.display(),
        jpg = %jpg_path.display(),
        frames,
        text,
        "rendered chart"
    );
    Ok(RenderSummary { frames, text })
}

/// Frames appended after the last point so the finished chart stays visible.
pub fn hold_frames(style: &RenderStyle) -> usize {
    if style.frame_delay_ms == 0 {
        return 0;
    }
    style.final_hold_ms.div_ceil(style.frame_delay_ms) as usize
}

fn render_gif(
    plot: &PlotSeries,
    style: &RenderStyle,
    bounds: &Bounds,
    text: bool,
    path: &Path,
) -> Result<usize, AppError> {
    crate::io::ensure_parent_dir(path)?;
    let root = BitMapBackend::gif(path, (style.width, style.height), style.frame_delay_ms)
        .map_err(|e| AppError::new(5, format!("Failed to create GIF '{}': {e}", path.display())))?
        .into_drawing_area();

    let n = plot.points.len();
    let visible_per_frame = (1..=n).chain(std::iter::repeat_n(n, hold_frames(style)));

    let mut frames = 0usize;
    for visible in visible_per_frame {
        draw_frame(&root, plot, visible, bounds, style, text).map_err(render_error)?;
        root.present().map_err(render_error)?;
        frames += 1;
    }
    Ok(frames)
}

fn render_still(
    plot: &PlotSeries,
    style: &RenderStyle,
    bounds: &Bounds,
    text: bool,
    path: &Path,
) -> Result<(), AppError> {
    crate::io::ensure_parent_dir(path)?;
    let root = BitMapBackend::new(path, (style.width, style.height)).into_drawing_area();
    draw_frame(&root, plot, plot.points.len(), bounds, style, text).map_err(render_error)?;
    root.present().map_err(render_error)?;
    Ok(())
}

fn render_error<E: std::error::Error + Send + Sync>(err: DrawingAreaErrorKind<E>) -> AppError {
    AppError::new(5, format!("Failed to render chart: {err}"))
}

/// Draw one frame showing the first `visible` points.
fn draw_frame<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    plot: &PlotSeries,
    visible: usize,
    bounds: &Bounds,
    style: &RenderStyle,
    text: bool,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    root.fill(&WHITE)?;

    let mut builder = ChartBuilder::on(root);
    builder.margin(20);
    if text {
        builder
            .caption(&plot.title, (font::FONT_FAMILY, 30))
            .x_label_area_size(50)
            .y_label_area_size(90);
    }
    let mut chart = builder.build_cartesian_2d(bounds.x0..bounds.x1, bounds.y0..bounds.y1)?;

    chart.plotting_area().fill(&PANEL_BACKGROUND)?;

    // Without a registered font any label would fail to draw, so the mesh
    // (which always carries tick labels) is skipped entirely.
    if text {
        chart
            .configure_mesh()
            .bold_line_style(WHITE)
            .light_line_style(WHITE.mix(0.0))
            .x_labels(8)
            .y_labels(8)
            .x_label_formatter(&|v| format_month(*v))
            .y_label_formatter(&|v| format_thousands(*v))
            .y_desc(&plot.y_label)
            .label_style((font::FONT_FAMILY, 18))
            .draw()?;
    }

    let (r, g, b) = style.color.rgb();
    let line_style = RGBColor(r, g, b).mix(LINE_ALPHA).stroke_width(LINE_WIDTH);
    chart.draw_series(LineSeries::new(
        plot.points
            .iter()
            .take(visible)
            .map(|&(date, y)| (day_number(date), y)),
        line_style,
    ))?;

    Ok(())
}

/// Chart extent in (day number, value) space.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Bounds {
    x0: f64,
    x1: f64,
    y0: f64,
    y1: f64,
}

impl Bounds {
    fn of(points: &[(NaiveDate, f64)]) -> Option<Self> {
        let (first, last) = (points.first()?, points.last()?);
        let (mut x0, mut x1) = (day_number(first.0), day_number(last.0));
        if x1 <= x0 {
            x0 -= 3.5;
            x1 += 3.5;
        }

        let y_max = points
            .iter()
            .map(|&(_, y)| y)
            .filter(|y| y.is_finite())
            .fold(f64::NEG_INFINITY, f64::max);
        let y_min = points
            .iter()
            .map(|&(_, y)| y)
            .filter(|y| y.is_finite())
            .fold(f64::INFINITY, f64::min);
        if !(y_max.is_finite() && y_min.is_finite()) {
            return None;
        }

        // Counts start at zero; leave 5% headroom above the peak.
        let y0 = y_min.min(0.0);
        let span = (y_max - y0).max(1.0);
        Some(Self {
            x0,
            x1,
            y0,
            y1: y0 + span * 1.05,
        })
    }
}

fn day_number(date: NaiveDate) -> f64 {
    f64::from(chrono::Datelike::num_days_from_ce(&date))
}

/// Abbreviated month name for an x tick.
pub fn format_month(day: f64) -> String {
    NaiveDate::from_num_days_from_ce_opt(day.round() as i32)
        .map(|d| d.format("%b").to_string())
        .unwrap_or_default()
}

/// Integer part of `v` with thousands separators (`12345.9` → `12,345`).
pub fn format_thousands(v: f64) -> String {
    let n = v.trunc() as i64;
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
