//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - runs the load → normalize pipeline
//! - prints summaries/plots
//! - writes optional exports and the rendered charts

use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::{debug, warn};

use crate::cli::{Command, DeathsArgs, PlotArgs, RenderArgs, WeeklyArgs};
use crate::domain::{DeathsConfig, LineColor, PlotSeries, RenderStyle, WeeklyConfig};
use crate::error::AppError;

pub mod pipeline;

use pipeline::ArtifactPaths;

/// File stem for the CDC deaths chart.
const DEATHS_STEM: &str = "weekly_deaths";

/// Entry point for the `covplot` binary.
pub fn run() -> Result<(), AppError> {
    // Paths and the font may live in a local `.env`.
    dotenvy::dotenv().ok();
    let cli = crate::cli::Cli::parse();
    crate::logging::init(cli.verbose);

    match cli.command {
        Command::Weekly(args) => handle_weekly(args),
        Command::Deaths(args) => handle_deaths(args),
        Command::Plot(args) => handle_plot(args),
    }
}

fn handle_weekly(args: WeeklyArgs) -> Result<(), AppError> {
    let config = weekly_config_from_args(&args);
    let weekly = pipeline::run_weekly(&config)?;
    println!("{}", crate::report::format_weekly_summary(&weekly, &config));

    for run in &weekly.metrics {
        println!("{}", crate::report::format_metric_summary(run));

        let plot = run.plot_series();
        if config.plot {
            println!(
                "{}",
                crate::plot::render_ascii_plot(&plot.points, config.plot_width, config.plot_height)
            );
        }

        let paths = ArtifactPaths::new(&config.out_dir, run.metric.column());
        if config.export_csv {
            crate::io::write_series_csv(&paths.csv, &run.output.series)?;
            println!("Wrote {}", paths.csv.display());
        }
        if config.export_json {
            crate::io::write_series_json(&paths.json, &run.series_file(&config))?;
            println!("Wrote {}", paths.json.display());
        }

        if config.render {
            let color = config.color.unwrap_or_else(|| run.metric.default_color());
            render(&plot, &with_color(&config.style, color), &paths)?;
        }
    }

    Ok(())
}

fn handle_deaths(args: DeathsArgs) -> Result<(), AppError> {
    let config = deaths_config_from_args(&args);
    let (loaded, plot) = pipeline::run_deaths(&config)?;

    println!("{}", crate::report::format_deaths_summary(&loaded, &config));
    if config.plot {
        println!(
            "{}",
            crate::plot::render_ascii_plot(&plot.points, config.plot_width, config.plot_height)
        );
    }

    if config.render {
        let paths = ArtifactPaths::new(&config.out_dir, DEATHS_STEM);
        render(&plot, &config.style, &paths)?;
    }
    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let file = crate::io::read_series_json(&args.series)?;
    debug!(
        path = %args.series.display(),
        tool = %file.tool,
        region = %file.region,
        weeks = file.series.len(),
        "loaded series file"
    );

    let plot = PlotSeries::from_series(&file.series, file.title.clone());
    if args.terminal.plot {
        println!(
            "{}",
            crate::plot::render_ascii_plot(&plot.points, args.terminal.plot_width, args.terminal.plot_height)
        );
    }

    if !args.render.no_render {
        let color = args.color.unwrap_or_else(|| file.metric.default_color());
        let style = render_style_from_args(&args.render, color);
        let paths = ArtifactPaths::new(&args.render.out_dir, &plot_stem(&args.series));
        render(&plot, &style, &paths)?;
    }
    Ok(())
}

fn render(plot: &PlotSeries, style: &RenderStyle, paths: &ArtifactPaths) -> Result<(), AppError> {
    let summary = crate::render::render_animation(plot, style, &paths.gif, &paths.jpg)?;
    if !summary.text {
        warn!("no usable font found; chart written without title and axis labels (use --font)");
    }
    println!(
        "Wrote {} ({} frames) and {}",
        paths.gif.display(),
        summary.frames,
        paths.jpg.display()
    );
    Ok(())
}

fn with_color(style: &RenderStyle, color: LineColor) -> RenderStyle {
    RenderStyle {
        color,
        ..style.clone()
    }
}

/// `cases_weekly.json` → `cases_weekly`, so re-plots land next to the exported files
/// without overwriting them.
fn plot_stem(series_path: &Path) -> String {
    series_path
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("series")
        .to_string()
}

fn resolve_font(arg: Option<&PathBuf>) -> Option<PathBuf> {
    arg.cloned().or_else(crate::render::discover_font)
}

pub fn render_style_from_args(args: &RenderArgs, color: LineColor) -> RenderStyle {
    RenderStyle {
        color,
        width: args.image_width,
        height: args.image_height,
        frame_delay_ms: args.frame_delay_ms,
        final_hold_ms: args.hold_ms,
        font: resolve_font(args.font.as_ref()),
    }
}

pub fn weekly_config_from_args(args: &WeeklyArgs) -> WeeklyConfig {
    WeeklyConfig {
        csv_path: args.csv.clone(),
        region: args.region.clone(),
        metrics: args.metric.metrics(),
        start_date: (!args.all_dates).then_some(args.start),
        trailing_week: args.trailing_week,
        color: args.color,
        title: args.title.clone(),
        out_dir: args.render.out_dir.clone(),
        render: !args.render.no_render,
        // Per-metric color is applied at render time.
        style: render_style_from_args(&args.render, LineColor::Blue),
        plot: args.terminal.plot,
        plot_width: args.terminal.plot_width,
        plot_height: args.terminal.plot_height,
        export_csv: args.export_csv,
        export_json: args.export_json,
    }
}

pub fn deaths_config_from_args(args: &DeathsArgs) -> DeathsConfig {
    DeathsConfig {
        csv_path: args.csv.clone(),
        state: args.state.clone(),
        title: args.title.clone(),
        out_dir: args.render.out_dir.clone(),
        render: !args.render.no_render,
        style: render_style_from_args(&args.render, args.color),
        plot: args.terminal.plot,
        plot_width: args.terminal.plot_width,
        plot_height: args.terminal.plot_height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use crate::domain::{Metric, TrailingWeek};
    use chrono::NaiveDate;

    fn weekly_args(extra: &[&str]) -> WeeklyArgs {
        let mut argv = vec!["covplot", "weekly", "--csv", "ecdc.csv", "--font", "/fonts/x.ttf"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Command::Weekly(args) => args,
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn weekly_config_maps_flags() {
        let config = weekly_config_from_args(&weekly_args(&[
            "--metric",
            "cases",
            "--trailing-week",
            "keep",
            "--no-render",
            "--export-csv",
            "--image-width",
            "640",
            "--hold-ms",
            "500",
        ]));

        assert_eq!(config.metrics, vec![Metric::Cases]);
        assert_eq!(config.trailing_week, TrailingWeek::Keep);
        assert_eq!(config.start_date, NaiveDate::from_ymd_opt(2020, 3, 1));
        assert!(!config.render);
        assert!(config.export_csv);
        assert!(!config.export_json);
        assert_eq!(config.style.width, 640);
        assert_eq!(config.style.height, 1000);
        assert_eq!(config.style.final_hold_ms, 500);
        assert_eq!(config.style.font, Some(PathBuf::from("/fonts/x.ttf")));
    }

    #[test]
    fn all_dates_clears_the_start_filter() {
        let config = weekly_config_from_args(&weekly_args(&["--all-dates"]));
        assert_eq!(config.start_date, None);

        let config = weekly_config_from_args(&weekly_args(&["--start", "2020-06-01"]));
        assert_eq!(config.start_date, NaiveDate::from_ymd_opt(2020, 6, 1));
    }

    #[test]
    fn deaths_config_uses_requested_color() {
        let cli = Cli::parse_from(["covplot", "deaths", "--csv", "cdc.csv", "--color", "green", "--font", "f.ttf"]);
        let Command::Deaths(args) = cli.command else {
            panic!("expected deaths subcommand");
        };
        let config = deaths_config_from_args(&args);
        assert_eq!(config.state, "United States");
        assert_eq!(config.style.color, LineColor::Green);
        assert!(config.render);
    }

    #[test]
    fn with_color_keeps_the_rest_of_the_style() {
        let base = RenderStyle {
            width: 320,
            ..RenderStyle::default()
        };
        let styled = with_color(&base, LineColor::Red);
        assert_eq!(styled.color, LineColor::Red);
        assert_eq!(styled.width, 320);
    }

    #[test]
    fn plot_stem_uses_file_name() {
        assert_eq!(plot_stem(Path::new("out/cases_weekly.json")), "cases_weekly");
        assert_eq!(plot_stem(Path::new("/")), "series");
    }
}
