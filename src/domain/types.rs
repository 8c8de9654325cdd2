//! Shared domain types.
//!
//! These types are intentionally kept lightweight so they can be:
//!
//! - produced by the CSV loaders
//! - folded into weekly series by the normalization pipeline
//! - exported to JSON/CSV and reloaded later for plotting

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// One row of a daily dataset: a region's count on a given day.
///
/// Counts and populations are kept as signed integers exactly as read, so the
/// pipeline can reject negative counts and report non-positive populations
/// instead of the loader silently dropping them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub date: NaiveDate,
    pub region: String,
    pub count: i64,
    pub population: i64,
}

/// One week of a normalized series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPoint {
    /// Monday following the last day of the week (Mon..Sun bucket).
    pub week_ending: NaiveDate,
    /// Sum of the week's daily `count / population * 100_000` values.
    pub value_per_100k: f64,
    /// Sum of the week's raw counts.
    pub raw_count: u64,
}

/// Weekly series for a single region, ascending by `week_ending`.
///
/// Produced by [`crate::normalize::normalize`], which guarantees that week
/// labels are strictly increasing and exactly seven days apart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Series {
    points: Vec<NormalizedPoint>,
}

impl Series {
    pub(crate) fn from_points(points: Vec<NormalizedPoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[NormalizedPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&NormalizedPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&NormalizedPoint> {
        self.points.last()
    }

    /// Week with the highest per-100k value (first one wins on ties).
    pub fn peak(&self) -> Option<&NormalizedPoint> {
        self.points.iter().fold(None, |best: Option<&NormalizedPoint>, p| match best {
            Some(b) if b.value_per_100k >= p.value_per_100k => Some(b),
            _ => Some(p),
        })
    }

    pub fn into_points(self) -> Vec<NormalizedPoint> {
        self.points
    }
}

/// Pipeline result: the weekly series plus data-quality metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizeOutput {
    pub series: Series,
    /// Records that passed filtering and contributed to a bucket.
    pub records_used: usize,
    /// Records excluded because their population was not positive.
    pub skipped_population: usize,
}

/// Which ECDC count column feeds the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Cases,
    Deaths,
}

impl Metric {
    pub const ALL: [Metric; 2] = [Metric::Cases, Metric::Deaths];

    /// Column name in the ECDC CSV.
    pub fn column(self) -> &'static str {
        match self {
            Metric::Cases => "cases",
            Metric::Deaths => "deaths",
        }
    }

    /// Title-case label for chart titles.
    pub fn display_name(self) -> &'static str {
        match self {
            Metric::Cases => "Cases",
            Metric::Deaths => "Deaths",
        }
    }

    /// Line color used when none is given explicitly.
    pub fn default_color(self) -> LineColor {
        match self {
            Metric::Cases => LineColor::Red,
            Metric::Deaths => LineColor::Black,
        }
    }
}

/// CLI-level metric selection (`both` renders one chart per metric).
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MetricSelection {
    Cases,
    Deaths,
    Both,
}

impl MetricSelection {
    pub fn metrics(self) -> Vec<Metric> {
        match self {
            MetricSelection::Cases => vec![Metric::Cases],
            MetricSelection::Deaths => vec![Metric::Deaths],
            MetricSelection::Both => Metric::ALL.to_vec(),
        }
    }
}

/// What to do with the final weekly bucket.
///
/// The last week of a dataset is usually cut off mid-week, and a partial sum
/// reads as a misleading dip at the end of the chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TrailingWeek {
    /// Always discard the final bucket.
    #[default]
    Drop,
    /// Discard the final bucket only if the data ends before its Sunday.
    DropPartial,
    /// Keep every bucket.
    Keep,
}

/// Named line colors accepted by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LineColor {
    Red,
    Black,
    Blue,
    Green,
    Orange,
    Purple,
}

impl LineColor {
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            LineColor::Red => (255, 0, 0),
            LineColor::Black => (0, 0, 0),
            LineColor::Blue => (0, 0, 255),
            LineColor::Green => (0, 128, 0),
            LineColor::Orange => (255, 165, 0),
            LineColor::Purple => (128, 0, 128),
        }
    }
}

/// Already-weekly count from the CDC provisional deaths dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeeklyCount {
    pub week_start: NaiveDate,
    pub count: u64,
}

/// Renderer input: dated y-values plus labels.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotSeries {
    pub title: String,
    pub y_label: String,
    pub points: Vec<(NaiveDate, f64)>,
}

impl PlotSeries {
    pub fn from_series(series: &Series, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            y_label: "per 100,000".to_string(),
            points: series
                .points()
                .iter()
                .map(|p| (p.week_ending, p.value_per_100k))
                .collect(),
        }
    }

    pub fn from_weekly_counts(counts: &[WeeklyCount], title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            y_label: "deaths".to_string(),
            points: counts
                .iter()
                .map(|c| (c.week_start, c.count as f64))
                .collect(),
        }
    }
}

/// Chart appearance and animation timing.
#[derive(Debug, Clone)]
pub struct RenderStyle {
    pub color: LineColor,
    pub width: u32,
    pub height: u32,
    /// Delay between GIF frames.
    pub frame_delay_ms: u32,
    /// How long the completed chart stays up before the GIF loops.
    pub final_hold_ms: u32,
    /// TrueType font used for caption and tick labels.
    pub font: Option<PathBuf>,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            color: LineColor::Blue,
            width: 1000,
            height: 1000,
            frame_delay_ms: 200,
            final_hold_ms: 2000,
            font: None,
        }
    }
}

/// A saved series file (JSON).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesFile {
    pub tool: String,
    pub region: String,
    pub metric: Metric,
    pub start_date: Option<NaiveDate>,
    pub trailing_week: TrailingWeek,
    pub title: String,
    pub series: Series,
}

/// Configuration for a `covplot weekly` run.
///
/// This is derived from CLI flags (plus env/defaults).
#[derive(Debug, Clone)]
pub struct WeeklyConfig {
    pub csv_path: PathBuf,
    pub region: String,
    pub metrics: Vec<Metric>,
    pub start_date: Option<NaiveDate>,
    pub trailing_week: TrailingWeek,
    /// Overrides the metric's default color when set.
    pub color: Option<LineColor>,
    /// Overrides the generated title when set (single-metric runs).
    pub title: Option<String>,
    pub out_dir: PathBuf,
    pub render: bool,
    pub style: RenderStyle,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    pub export_csv: bool,
    pub export_json: bool,
}

/// Configuration for a `covplot deaths` run.
#[derive(Debug, Clone)]
pub struct DeathsConfig {
    pub csv_path: PathBuf,
    pub state: String,
    pub title: Option<String>,
    pub out_dir: PathBuf,
    pub render: bool,
    pub style: RenderStyle,
    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,
}
