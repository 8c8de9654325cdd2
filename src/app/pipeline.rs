//! Shared "load → normalize" workflow used by the CLI subcommands.
//!
//! Keeping this in one place means `app` only deals with presentation and
//! artifacts (summaries, plots, exports) while this module owns the data path:
//! CSV ingest -> region/date filter -> weekly per-100k series.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::domain::{DeathsConfig, Metric, NormalizeOutput, PlotSeries, SeriesFile, WeeklyConfig};
use crate::error::AppError;
use crate::io::ingest::{LoadedRecords, LoadedWeeklyDeaths, RowError};
use crate::io::series_file::TOOL_NAME;
use crate::normalize::{NormalizeOptions, normalize_with};

/// Outputs of a `covplot weekly` run: shared ingest stats + one entry per metric.
#[derive(Debug, Clone)]
pub struct WeeklyRun {
    pub rows_read: usize,
    pub row_errors: Vec<RowError>,
    pub metrics: Vec<MetricRun>,
}

/// Outputs of one metric in a `covplot weekly` run.
#[derive(Debug, Clone)]
pub struct MetricRun {
    pub metric: Metric,
    pub output: NormalizeOutput,
    pub title: String,
}

impl MetricRun {
    pub fn plot_series(&self) -> PlotSeries {
        PlotSeries::from_series(&self.output.series, self.title.clone())
    }

    pub fn series_file(&self, config: &WeeklyConfig) -> SeriesFile {
        SeriesFile {
            tool: TOOL_NAME.to_string(),
            region: config.region.clone(),
            metric: self.metric,
            start_date: config.start_date,
            trailing_week: config.trailing_week,
            title: self.title.clone(),
            series: self.output.series.clone(),
        }
    }
}

/// Output file locations for one chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub gif: PathBuf,
    pub jpg: PathBuf,
    pub csv: PathBuf,
    pub json: PathBuf,
}

impl ArtifactPaths {
    /// `<out_dir>/<stem>_animation.{gif,jpg}` and `<out_dir>/<stem>_weekly.{csv,json}`.
    pub fn new(out_dir: &Path, stem: &str) -> Self {
        Self {
            gif: out_dir.join(format!("{stem}_animation.gif")),
            jpg: out_dir.join(format!("{stem}_animation.jpg")),
            csv: out_dir.join(format!("{stem}_weekly.csv")),
            json: out_dir.join(format!("{stem}_weekly.json")),
        }
    }
}

/// Load the ECDC CSV once and normalize every requested metric.
pub fn run_weekly(config: &WeeklyConfig) -> Result<WeeklyRun, AppError> {
    let loaded = crate::io::ingest::load_ecdc(&config.csv_path, &config.metrics)?;
    let metrics = loaded
        .metrics
        .into_iter()
        .map(|records| run_metric(records, config))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(WeeklyRun {
        rows_read: loaded.rows_read,
        row_errors: loaded.row_errors,
        metrics,
    })
}

/// Normalize already-loaded records for the configured region.
pub fn run_metric(loaded: LoadedRecords, config: &WeeklyConfig) -> Result<MetricRun, AppError> {
    let options = NormalizeOptions::new(config.region.clone())
        .start_date(config.start_date)
        .trailing_week(config.trailing_week);

    let output = normalize_with(&loaded.records, &options)?;

    let title = match (&config.title, config.metrics.len()) {
        (Some(title), 1) => title.clone(),
        _ => crate::report::default_title(&config.region, loaded.metric, &output.series),
    };

    info!(
        metric = loaded.metric.column(),
        region = %config.region,
        weeks = output.series.len(),
        skipped_population = output.skipped_population,
        "weekly series ready"
    );

    Ok(MetricRun {
        metric: loaded.metric,
        output,
        title,
    })
}

/// Load the CDC weekly deaths CSV for the configured state.
pub fn run_deaths(config: &DeathsConfig) -> Result<(LoadedWeeklyDeaths, PlotSeries), AppError> {
    let loaded = crate::io::ingest::load_weekly_deaths(&config.csv_path, &config.state)?;
    let title = config
        .title
        .clone()
        .unwrap_or_else(|| crate::report::deaths_title(&config.state));
    let plot = PlotSeries::from_weekly_counts(&loaded.counts, title);
    Ok((loaded, plot))
}
