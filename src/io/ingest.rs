//! CSV ingest for the public COVID-19 datasets.
//!
//! Two loaders live here:
//! - ECDC daily cases/deaths worldwide → `RawRecord`s (one per country per day)
//! - CDC provisional weekly deaths by state → `WeeklyCount`s
//!
//! Both follow the same rules:
//! - **Strict schema** for required columns (clear errors + exit code 2)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - no aggregation here; that belongs to the normalization pipeline

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use csv::StringRecord;
use tracing::{debug, info};

use crate::domain::{Metric, RawRecord, WeeklyCount};
use crate::error::AppError;

const ECDC_DATE: &str = "daterep";
const ECDC_REGION: &str = "countriesandterritories";
const ECDC_POPULATION: &str = "popdata2019";

const CDC_STATE: &str = "state";
const CDC_START_WEEK: &str = "start week";
const CDC_DEATHS: &str = "covid-19 deaths";
const CDC_FOOTNOTE: &str = "footnote";

/// Day-first formats used by the ECDC export (ISO accepted as well).
const ECDC_DATE_FORMATS: [&str; 2] = ["%d/%m/%Y", "%Y-%m-%d"];
/// Month-first formats used by the CDC export (ISO accepted as well).
const CDC_DATE_FORMATS: [&str; 2] = ["%m/%d/%Y", "%Y-%m-%d"];

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Records for every region, with one metric's column as the count.
#[derive(Debug, Clone)]
pub struct LoadedRecords {
    pub metric: Metric,
    pub records: Vec<RawRecord>,
}

/// ECDC ingest output: one record set per requested metric + row errors.
///
/// The file is read once; each bad row is reported once even when several
/// metrics are requested.
#[derive(Debug, Clone)]
pub struct LoadedEcdc {
    pub metrics: Vec<LoadedRecords>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// CDC ingest output: cleaned weekly counts for one state.
#[derive(Debug, Clone)]
pub struct LoadedWeeklyDeaths {
    pub state: String,
    pub counts: Vec<WeeklyCount>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    /// Rows dropped because the `Footnote` column flagged suppressed values.
    pub rows_footnoted: usize,
    /// Exact duplicate rows removed.
    pub rows_duplicate: usize,
}

/// Load the ECDC worldwide CSV, building records for each of `metrics`.
pub fn load_ecdc(path: &Path, metrics: &[Metric]) -> Result<LoadedEcdc, AppError> {
    let file = open_csv(path)?;
    read_ecdc(file, metrics)
}

/// Load the CDC weekly deaths CSV for a single `state`.
pub fn load_weekly_deaths(path: &Path, state: &str) -> Result<LoadedWeeklyDeaths, AppError> {
    let file = open_csv(path)?;
    let loaded = read_weekly_deaths(file, state)?;
    if loaded.counts.is_empty() {
        return Err(AppError::new(
            3,
            format!("No usable weekly death rows for state `{state}` in '{}'.", path.display()),
        ));
    }
    Ok(loaded)
}

fn open_csv(path: &Path) -> Result<File, AppError> {
    File::open(path).map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))
}

fn csv_reader<R: Read>(source: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source)
}

pub(crate) fn read_ecdc<R: Read>(source: R, metrics: &[Metric]) -> Result<LoadedEcdc, AppError> {
    let mut reader = csv_reader(source);
    let header_map = read_header_map(&mut reader)?;
    let mut required = vec![ECDC_DATE, ECDC_REGION, ECDC_POPULATION];
    required.extend(metrics.iter().map(|m| m.column()));
    ensure_columns(&header_map, &required)?;

    let mut loaded: Vec<LoadedRecords> = metrics
        .iter()
        .map(|&metric| LoadedRecords {
            metric,
            records: Vec::new(),
        })
        .collect();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // records() starts after the header; CSV lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let parsed = result
            .map_err(|e| format!("CSV parse error: {e}"))
            .and_then(|record| parse_ecdc_row(&record, &header_map).map(|row| (row, record)));

        let (row, record) = match parsed {
            Ok(parsed) => parsed,
            Err(message) => {
                row_errors.push(RowError { line, message });
                continue;
            }
        };

        // A bad count only removes the row from that metric.
        let mut failures = Vec::new();
        for target in &mut loaded {
            let column = target.metric.column();
            match get_required(&record, &header_map, column).and_then(|raw| parse_int(raw, column)) {
                Ok(count) => target.records.push(RawRecord {
                    date: row.date,
                    region: row.region.clone(),
                    count,
                    population: row.population,
                }),
                Err(message) => failures.push(message),
            }
        }
        if !failures.is_empty() {
            row_errors.push(RowError {
                line,
                message: failures.join(" "),
            });
        }
    }

    for target in &loaded {
        info!(
            metric = target.metric.column(),
            records = target.records.len(),
            "loaded ECDC records"
        );
    }
    debug!(rows_read, row_errors = row_errors.len(), "read ECDC file");

    Ok(LoadedEcdc {
        metrics: loaded,
        row_errors,
        rows_read,
    })
}

/// Columns shared by every metric.
struct EcdcRow {
    date: NaiveDate,
    region: String,
    population: i64,
}

fn parse_ecdc_row(record: &StringRecord, header_map: &HashMap<String, usize>) -> Result<EcdcRow, String> {
    let date = parse_date(get_required(record, header_map, ECDC_DATE)?, &ECDC_DATE_FORMATS)?;
    let region = get_required(record, header_map, ECDC_REGION)?.to_string();

    // Some ECDC rows (e.g. cruise ships) have no population; keep them with a
    // zero population so the pipeline reports them as data-quality skips.
    let population = match get_optional(record, header_map, ECDC_POPULATION) {
        Some(raw) => parse_int(raw, ECDC_POPULATION)?,
        None => 0,
    };

    Ok(EcdcRow {
        date,
        region,
        population,
    })
}

pub(crate) fn read_weekly_deaths<R: Read>(source: R, state: &str) -> Result<LoadedWeeklyDeaths, AppError> {
    let mut reader = csv_reader(source);
    let header_map = read_header_map(&mut reader)?;
    ensure_columns(&header_map, &[CDC_STATE, CDC_START_WEEK, CDC_DEATHS, CDC_FOOTNOTE])?;

    let mut seen: HashSet<Vec<String>> = HashSet::new();
    let mut counts = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;
    let mut rows_footnoted = 0usize;
    let mut rows_duplicate = 0usize;

    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        // Footnoted rows carry suppressed (1-9) or incomplete counts.
        if get_optional(&record, &header_map, CDC_FOOTNOTE).is_some() {
            rows_footnoted += 1;
            continue;
        }
        if !seen.insert(record.iter().map(str::to_string).collect()) {
            rows_duplicate += 1;
            continue;
        }
        if !get_optional(&record, &header_map, CDC_STATE).is_some_and(|s| s == state) {
            continue;
        }

        match parse_weekly_row(&record, &header_map) {
            Ok(count) => counts.push(count),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    counts.sort_by_key(|c| c.week_start);

    debug!(rows_footnoted, rows_duplicate, "filtered CDC rows");
    info!(
        state,
        rows_read,
        weeks = counts.len(),
        row_errors = row_errors.len(),
        "loaded CDC weekly deaths"
    );

    Ok(LoadedWeeklyDeaths {
        state: state.to_string(),
        counts,
        row_errors,
        rows_read,
        rows_footnoted,
        rows_duplicate,
    })
}

fn parse_weekly_row(record: &StringRecord, header_map: &HashMap<String, usize>) -> Result<WeeklyCount, String> {
    let week_start = parse_date(get_required(record, header_map, CDC_START_WEEK)?, &CDC_DATE_FORMATS)?;
    let count = parse_int(get_required(record, header_map, CDC_DEATHS)?, CDC_DEATHS)?;
    let count = u64::try_from(count).map_err(|_| format!("Negative `{CDC_DEATHS}` value: {count}."))?;
    Ok(WeeklyCount { week_start, count })
}

fn read_header_map<R: Read>(reader: &mut csv::Reader<R>) -> Result<HashMap<String, usize>, AppError> {
    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?;
    Ok(build_header_map(headers))
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn ensure_columns(header_map: &HashMap<String, usize>, required: &[&str]) -> Result<(), AppError> {
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|name| !header_map.contains_key(*name))
        .collect();
    if missing.is_empty() {
        return Ok(());
    }
    let list = missing.iter().map(|m| format!("`{m}`")).collect::<Vec<_>>().join(", ");
    Err(AppError::new(2, format!("Missing required column(s): {list}")))
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    let idx = header_map
        .get(name)
        .ok_or_else(|| format!("Missing required column: `{name}`"))?;
    record
        .get(*idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn get_optional<'a>(record: &'a StringRecord, header_map: &HashMap<String, usize>, name: &str) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
}

fn parse_date(s: &str, formats: &[&str]) -> Result<NaiveDate, String> {
    formats
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .ok_or_else(|| format!("Invalid date '{s}'. Expected one of: {}.", formats.join(", ")))
}

/// Integers may carry thousands separators (`1,234`) in some exports.
fn parse_int(s: &str, column: &str) -> Result<i64, String> {
    let cleaned: String = s.chars().filter(|c| *c != ',').collect();
    cleaned
        .parse::<i64>()
        .map_err(|_| format!("Invalid integer '{s}' in `{column}`."))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ECDC: &str = "\u{feff}dateRep,day,month,year,cases,deaths,countriesAndTerritories,geoId,countryterritoryCode,popData2019,continentExp
03/03/2020,3,3,2020,5,1,United_States_of_America,US,USA,328239523,America
02/03/2020,2,3,2020,10,0,United_States_of_America,US,USA,328239523,America
02/03/2020,2,3,2020,4,0,Cases_on_an_international_conveyance_Japan,JPG11668,,,Other
31/02/2020,31,2,2020,1,0,France,FR,FRA,67012883,Europe
02/03/2020,2,3,2020,many,0,France,FR,FRA,67012883,Europe
";

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn ecdc_rows_become_raw_records() {
        let loaded = read_ecdc(ECDC.as_bytes(), &[Metric::Cases]).unwrap();

        assert_eq!(loaded.rows_read, 5);
        let cases = &loaded.metrics[0];
        assert_eq!(cases.metric, Metric::Cases);
        assert_eq!(cases.records.len(), 3);
        assert_eq!(
            cases.records[0],
            RawRecord {
                date: d(2020, 3, 3),
                region: "United_States_of_America".to_string(),
                count: 5,
                population: 328_239_523,
            }
        );
        // Missing population is kept as zero for the pipeline to report.
        assert_eq!(cases.records[2].population, 0);

        let lines: Vec<usize> = loaded.row_errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![5, 6]);
        assert!(loaded.row_errors[0].message.contains("Invalid date"));
        assert!(loaded.row_errors[1].message.contains("`cases`"));
    }

    #[test]
    fn both_metrics_come_from_one_pass() {
        let loaded = read_ecdc(ECDC.as_bytes(), &[Metric::Cases, Metric::Deaths]).unwrap();

        assert_eq!(loaded.rows_read, 5);
        // The bad date and the bad `cases` cell are each reported once.
        let lines: Vec<usize> = loaded.row_errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![5, 6]);

        let [cases, deaths] = &loaded.metrics[..] else {
            panic!("expected two metrics");
        };
        assert_eq!(cases.records.len(), 3);
        // The French row only fails on `cases`; its deaths still count.
        assert_eq!(deaths.metric, Metric::Deaths);
        assert_eq!(deaths.records.len(), 4);
        assert_eq!(deaths.records[0].count, 1);
        assert_eq!(deaths.records[3].region, "France");
    }

    #[test]
    fn ecdc_missing_columns_are_schema_errors() {
        let csv = "dateRep,cases,geoId\n02/03/2020,1,US\n";
        let err = read_ecdc(csv.as_bytes(), &[Metric::Cases]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert_eq!(
            err.message(),
            "Missing required column(s): `countriesandterritories`, `popdata2019`"
        );

        let err = read_ecdc(csv.as_bytes(), &[Metric::Cases, Metric::Deaths]).unwrap_err();
        assert!(err.message().ends_with("`popdata2019`, `deaths`"));
    }

    const CDC: &str = "Data as of,Start week,End Week,State,COVID-19 Deaths,Total Deaths,Footnote
11/18/2020,03/01/2020,03/07/2020,United States,\"1,234\",56000,
11/18/2020,02/23/2020,02/29/2020,United States,5,55000,
11/18/2020,02/23/2020,02/29/2020,United States,5,55000,
11/18/2020,03/08/2020,03/14/2020,United States,,57000,One or more data cells have counts between 1-9
11/18/2020,03/01/2020,03/07/2020,Alaska,0,100,
11/18/2020,03/15/2020,03/21/2020,United States,n/a,58000,
";

    #[test]
    fn weekly_deaths_are_cleaned_and_sorted() {
        let loaded = read_weekly_deaths(CDC.as_bytes(), "United States").unwrap();

        assert_eq!(
            loaded.counts,
            vec![
                WeeklyCount {
                    week_start: d(2020, 2, 23),
                    count: 5
                },
                WeeklyCount {
                    week_start: d(2020, 3, 1),
                    count: 1_234
                },
            ]
        );
        assert_eq!(loaded.rows_read, 6);
        assert_eq!(loaded.rows_footnoted, 1);
        assert_eq!(loaded.rows_duplicate, 1);
        assert_eq!(loaded.row_errors.len(), 1);
        assert_eq!(loaded.row_errors[0].line, 7);
    }

    #[test]
    fn weekly_deaths_file_without_matches_is_empty_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weekly.csv");
        std::fs::write(&path, CDC).unwrap();

        let err = load_weekly_deaths(&path, "Puerto Rico").unwrap_err();
        assert_eq!(err.exit_code(), 3);
        assert_eq!(load_weekly_deaths(&path, "Alaska").unwrap().counts.len(), 1);
    }

    #[test]
    fn missing_file_is_an_input_error() {
        let err = load_ecdc(Path::new("/nonexistent/ecdc.csv"), &[Metric::Cases]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.message().starts_with("Failed to open CSV"));
    }

    #[test]
    fn parse_int_accepts_thousands_separators() {
        assert_eq!(parse_int("12,345", "cases"), Ok(12_345));
        assert_eq!(parse_int("-7", "cases"), Ok(-7));
        assert!(parse_int("1.5", "cases").is_err());
    }
}
