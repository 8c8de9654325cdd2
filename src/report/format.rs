//! Formatted terminal output: run summaries and chart titles.
//!
//! We keep formatting code in one place so:
//! - the pipeline code stays clean and testable
//! - output changes are localized (golden tests below)

use chrono::{Datelike, NaiveDate};

use crate::app::pipeline::{MetricRun, WeeklyRun};
use crate::domain::{DeathsConfig, Metric, Series, TrailingWeek, WeeklyConfig};
use crate::io::ingest::{LoadedWeeklyDeaths, RowError};
use crate::render::format_thousands;

/// Row errors listed individually before the rest are summarized.
const ROW_ERROR_SAMPLE: usize = 5;

/// `United_States_of_America` → `United States of America`.
pub fn display_region(region: &str) -> String {
    region.replace('_', " ")
}

/// Chart title for a weekly per-100k series, e.g.
/// `United States of America COVID-19 Weekly Cases Per 100,000 Persons, Mar-Nov 2020`.
pub fn default_title(region: &str, metric: Metric, series: &Series) -> String {
    let base = format!(
        "{} COVID-19 Weekly {} Per 100,000 Persons",
        display_region(region),
        metric.display_name()
    );
    match (series.first(), series.last()) {
        (Some(first), Some(last)) => format!("{base}, {}", month_span(first.week_ending, last.week_ending)),
        _ => base,
    }
}

/// Chart title for the CDC weekly death counts.
pub fn deaths_title(state: &str) -> String {
    format!("{state} COVID-19 Death Counts by Week")
}

fn month_span(start: NaiveDate, end: NaiveDate) -> String {
    let same_year = start.year() == end.year();
    let same_month = same_year && start.month() == end.month();
    if same_month {
        start.format("%b %Y").to_string()
    } else if same_year {
        format!("{}-{}", start.format("%b"), end.format("%b %Y"))
    } else {
        format!("{}-{}", start.format("%b %Y"), end.format("%b %Y"))
    }
}

/// Header of a `covplot weekly` run: source, selection and ingest stats.
pub fn format_weekly_summary(run: &WeeklyRun, config: &WeeklyConfig) -> String {
    let mut out = String::new();

    out.push_str("=== covplot - weekly per 100k ===\n");
    out.push_str(&format!("Source: {}\n", config.csv_path.display()));
    out.push_str(&format!(
        "Region: {} | start: {} | trailing week: {}\n",
        config.region,
        config
            .start_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string()),
        trailing_label(config),
    ));
    out.push_str(&format!(
        "Rows: read={} | row errors={}\n",
        run.rows_read,
        run.row_errors.len(),
    ));

    out.push_str(&format_row_errors(&run.row_errors));
    out
}

/// Per-metric section of a `covplot weekly` run.
pub fn format_metric_summary(run: &MetricRun) -> String {
    let mut out = String::new();
    let output = &run.output;

    out.push_str(&format!("--- {} ---\n", run.metric.display_name().to_lowercase()));
    out.push_str(&format!(
        "Records: used={} | skipped (population<=0)={}\n",
        output.records_used, output.skipped_population,
    ));

    match (output.series.first(), output.series.last()) {
        (Some(first), Some(last)) => out.push_str(&format!(
            "Weeks: n={} | {} .. {}\n",
            output.series.len(),
            first.week_ending,
            last.week_ending
        )),
        _ => out.push_str("Weeks: n=0\n"),
    }

    if let Some(peak) = output.series.peak() {
        out.push_str(&format!(
            "Peak: week ending {} = {:.2} per 100k (raw {})\n",
            peak.week_ending,
            peak.value_per_100k,
            format_thousands(peak.raw_count as f64),
        ));
    }
    out
}

/// Summary of a `covplot deaths` run.
pub fn format_deaths_summary(loaded: &LoadedWeeklyDeaths, config: &DeathsConfig) -> String {
    let mut out = String::new();

    out.push_str("=== covplot - weekly death counts ===\n");
    out.push_str(&format!("Source: {}\n", config.csv_path.display()));
    out.push_str(&format!("State: {}\n", loaded.state));
    out.push_str(&format!(
        "Rows: read={} | footnoted={} | duplicates={} | row errors={}\n",
        loaded.rows_read,
        loaded.rows_footnoted,
        loaded.rows_duplicate,
        loaded.row_errors.len(),
    ));

    if let (Some(first), Some(last)) = (loaded.counts.first(), loaded.counts.last()) {
        out.push_str(&format!(
            "Weeks: n={} | {} .. {}\n",
            loaded.counts.len(),
            first.week_start,
            last.week_start
        ));
        let total: u64 = loaded.counts.iter().map(|c| c.count).sum();
        out.push_str(&format!("Total deaths: {}\n", format_thousands(total as f64)));
    }

    out.push_str(&format_row_errors(&loaded.row_errors));
    out
}

fn trailing_label(config: &WeeklyConfig) -> &'static str {
    match config.trailing_week {
        TrailingWeek::Drop => "drop",
        TrailingWeek::DropPartial => "drop-partial",
        TrailingWeek::Keep => "keep",
    }
}

fn format_row_errors(errors: &[RowError]) -> String {
    let mut out = String::new();
    if errors.is_empty() {
        return out;
    }

    out.push_str("\nSkipped rows:\n");
    for e in errors.iter().take(ROW_ERROR_SAMPLE) {
        out.push_str(&format!("  line {}: {}\n", e.line, e.message));
    }
    if errors.len() > ROW_ERROR_SAMPLE {
        out.push_str(&format!("  ... and {} more\n", errors.len() - ROW_ERROR_SAMPLE));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use crate::domain::{RawRecord, RenderStyle, WeeklyCount};
    use crate::normalize::{NormalizeOptions, normalize_with};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn weekly_config() -> WeeklyConfig {
        WeeklyConfig {
            csv_path: PathBuf::from("data/ecdc.csv"),
            region: "United_States_of_America".to_string(),
            metrics: vec![Metric::Cases],
            start_date: Some(d(2020, 3, 1)),
            trailing_week: TrailingWeek::Keep,
            color: None,
            title: None,
            out_dir: PathBuf::from("plots"),
            render: false,
            style: RenderStyle::default(),
            plot: false,
            plot_width: 80,
            plot_height: 20,
            export_csv: false,
            export_json: false,
        }
    }

    fn metric_run() -> MetricRun {
        let records = vec![
            RawRecord {
                date: d(2020, 3, 2),
                region: "United_States_of_America".to_string(),
                count: 10,
                population: 1_000_000,
            },
            RawRecord {
                date: d(2020, 3, 10),
                region: "United_States_of_America".to_string(),
                count: 12_000,
                population: 1_000_000,
            },
            RawRecord {
                date: d(2020, 3, 11),
                region: "United_States_of_America".to_string(),
                count: 3,
                population: 0,
            },
        ];
        let options = NormalizeOptions::new("United_States_of_America").trailing_week(TrailingWeek::Keep);
        MetricRun {
            metric: Metric::Cases,
            output: normalize_with(&records, &options).unwrap(),
            title: "t".to_string(),
        }
    }

    fn weekly_run() -> WeeklyRun {
        WeeklyRun {
            rows_read: 9,
            row_errors: (0..7)
                .map(|i| RowError {
                    line: i + 2,
                    message: "Invalid date 'x'.".to_string(),
                })
                .collect(),
            metrics: vec![metric_run()],
        }
    }

    #[test]
    fn weekly_summary_golden() {
        let txt = format_weekly_summary(&weekly_run(), &weekly_config());
        let expected = concat!(
            "=== covplot - weekly per 100k ===\n",
            "Source: data/ecdc.csv\n",
            "Region: United_States_of_America | start: 2020-03-01 | trailing week: keep\n",
            "Rows: read=9 | row errors=7\n",
            "\n",
            "Skipped rows:\n",
            "  line 2: Invalid date 'x'.\n",
            "  line 3: Invalid date 'x'.\n",
            "  line 4: Invalid date 'x'.\n",
            "  line 5: Invalid date 'x'.\n",
            "  line 6: Invalid date 'x'.\n",
            "  ... and 2 more\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn metric_summary_golden() {
        let txt = format_metric_summary(&metric_run());
        let expected = concat!(
            "--- cases ---\n",
            "Records: used=2 | skipped (population<=0)=1\n",
            "Weeks: n=2 | 2020-03-09 .. 2020-03-16\n",
            "Peak: week ending 2020-03-16 = 1200.00 per 100k (raw 12,000)\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn deaths_summary_totals_counts() {
        let loaded = LoadedWeeklyDeaths {
            state: "United States".to_string(),
            counts: vec![
                WeeklyCount {
                    week_start: d(2020, 3, 1),
                    count: 60,
                },
                WeeklyCount {
                    week_start: d(2020, 4, 5),
                    count: 15_455,
                },
            ],
            row_errors: Vec::new(),
            rows_read: 10,
            rows_footnoted: 3,
            rows_duplicate: 1,
        };
        let config = DeathsConfig {
            csv_path: PathBuf::from("cdc.csv"),
            state: "United States".to_string(),
            title: None,
            out_dir: PathBuf::from("plots"),
            render: false,
            style: RenderStyle::default(),
            plot: false,
            plot_width: 80,
            plot_height: 20,
        };

        let txt = format_deaths_summary(&loaded, &config);
        assert!(txt.contains("Rows: read=10 | footnoted=3 | duplicates=1 | row errors=0\n"));
        assert!(txt.contains("Weeks: n=2 | 2020-03-01 .. 2020-04-05\n"));
        assert!(txt.contains("Total deaths: 15,515\n"));
        assert!(!txt.contains("Skipped rows"));
    }

    #[test]
    fn titles_describe_region_metric_and_months() {
        let run = metric_run();
        assert_eq!(
            default_title("United_States_of_America", Metric::Cases, &run.output.series),
            "United States of America COVID-19 Weekly Cases Per 100,000 Persons, Mar 2020"
        );
        assert_eq!(month_span(d(2020, 3, 9), d(2020, 11, 23)), "Mar-Nov 2020");
        assert_eq!(month_span(d(2020, 3, 9), d(2021, 2, 1)), "Mar 2020-Feb 2021");
        assert_eq!(
            default_title("Italy", Metric::Deaths, &Series::default()),
            "Italy COVID-19 Weekly Deaths Per 100,000 Persons"
        );
        assert_eq!(deaths_title("United States"), "United States COVID-19 Death Counts by Week");
    }
}
