//! Command-line parsing for `covplot`.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! pipeline and rendering code. Paths that usually stay fixed between runs can
//! also come from the environment (or a `.env` file).

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{ArgAction, Args, Parser, Subcommand};

use crate::domain::{LineColor, MetricSelection, TrailingWeek};

/// First day of the weekly charts: the US outbreak start of March 2020.
pub const DEFAULT_START: &str = "2020-03-01";

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "covplot",
    version,
    about = "Weekly per-100k COVID-19 series and animated charts"
)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resample ECDC daily counts into weekly per-100k series and chart them.
    Weekly(WeeklyArgs),
    /// Chart CDC provisional weekly death counts for one state.
    Deaths(DeathsArgs),
    /// Re-render a series JSON written by `covplot weekly --export-json`.
    Plot(PlotArgs),
}

/// Options for the ECDC weekly per-100k pipeline.
#[derive(Debug, Args, Clone)]
pub struct WeeklyArgs {
    /// ECDC "COVID-19 cases worldwide" CSV.
    #[arg(long, env = "COVPLOT_ECDC_CSV", value_name = "CSV")]
    pub csv: PathBuf,

    /// Region as written in `countriesAndTerritories`.
    #[arg(short = 'r', long, default_value = "United_States_of_America")]
    pub region: String,

    /// Which count column(s) to chart.
    #[arg(short = 'm', long, value_enum, default_value_t = MetricSelection::Both)]
    pub metric: MetricSelection,

    /// Drop records before this date (YYYY-MM-DD).
    #[arg(long, value_name = "DATE", default_value = DEFAULT_START)]
    pub start: NaiveDate,

    /// Keep every date instead of applying `--start`.
    #[arg(long, conflicts_with = "start")]
    pub all_dates: bool,

    /// What to do with the final (usually incomplete) week.
    #[arg(long, value_enum, default_value_t = TrailingWeek::Drop)]
    pub trailing_week: TrailingWeek,

    /// Line color (defaults: cases red, deaths black).
    #[arg(long, value_enum)]
    pub color: Option<LineColor>,

    /// Chart title (single-metric runs only; otherwise generated).
    #[arg(long)]
    pub title: Option<String>,

    /// Write `<metric>_weekly.csv` into the output directory.
    #[arg(long)]
    pub export_csv: bool,

    /// Write `<metric>_weekly.json` into the output directory.
    #[arg(long)]
    pub export_json: bool,

    #[command(flatten)]
    pub render: RenderArgs,

    #[command(flatten)]
    pub terminal: TerminalPlotArgs,
}

/// Options for the CDC weekly deaths chart.
#[derive(Debug, Args, Clone)]
pub struct DeathsArgs {
    /// CDC "Provisional COVID-19 death counts by week ending date and state" CSV.
    #[arg(long, env = "COVPLOT_CDC_CSV", value_name = "CSV")]
    pub csv: PathBuf,

    /// Value of the `State` column to chart.
    #[arg(short = 's', long, default_value = "United States")]
    pub state: String,

    /// Line color.
    #[arg(long, value_enum, default_value_t = LineColor::Blue)]
    pub color: LineColor,

    /// Chart title.
    #[arg(long)]
    pub title: Option<String>,

    #[command(flatten)]
    pub render: RenderArgs,

    #[command(flatten)]
    pub terminal: TerminalPlotArgs,
}

/// Options for re-plotting a saved series.
#[derive(Debug, Args, Clone)]
pub struct PlotArgs {
    /// Series JSON produced by `covplot weekly --export-json`.
    #[arg(long, value_name = "JSON")]
    pub series: PathBuf,

    /// Line color (defaults to the series metric's color).
    #[arg(long, value_enum)]
    pub color: Option<LineColor>,

    #[command(flatten)]
    pub render: RenderArgs,

    #[command(flatten)]
    pub terminal: TerminalPlotArgs,
}

/// Image output options shared by all subcommands.
#[derive(Debug, Args, Clone)]
pub struct RenderArgs {
    /// Directory for GIF/JPEG (and export) files.
    #[arg(long, env = "COVPLOT_OUT_DIR", default_value = "plots")]
    pub out_dir: PathBuf,

    /// Skip writing the GIF/JPEG.
    #[arg(long)]
    pub no_render: bool,

    /// Image width in pixels.
    #[arg(long, default_value_t = 1000)]
    pub image_width: u32,

    /// Image height in pixels.
    #[arg(long, default_value_t = 1000)]
    pub image_height: u32,

    /// Delay between GIF frames in milliseconds.
    #[arg(long, default_value_t = 200)]
    pub frame_delay_ms: u32,

    /// How long the finished chart is shown before the GIF loops (milliseconds).
    #[arg(long, default_value_t = 2000)]
    pub hold_ms: u32,

    /// TrueType font for titles and tick labels (a system font is used if found).
    #[arg(long, env = "COVPLOT_FONT", value_name = "TTF")]
    pub font: Option<PathBuf>,
}

/// ASCII preview options.
#[derive(Debug, Args, Clone)]
pub struct TerminalPlotArgs {
    /// Print an ASCII chart of the series.
    #[arg(long)]
    pub plot: bool,

    /// ASCII chart width (columns).
    #[arg(long, default_value_t = 100)]
    pub plot_width: usize,

    /// ASCII chart height (rows).
    #[arg(long, default_value_t = 25)]
    pub plot_height: usize,
}
