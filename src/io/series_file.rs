//! Read/write series JSON files.
//!
//! The series file is the portable representation of a pipeline run:
//! - selection metadata (region, metric, start date, trailing-week policy)
//! - the chart title used at render time
//! - the weekly points themselves
//!
//! The schema is defined by `domain::SeriesFile`.

use std::fs::File;
use std::path::Path;

use crate::domain::SeriesFile;
use crate::error::AppError;

pub const TOOL_NAME: &str = "covplot";

/// Write a series JSON file.
pub fn write_series_json(path: &Path, file: &SeriesFile) -> Result<(), AppError> {
    super::ensure_parent_dir(path)?;
    let out = File::create(path)
        .map_err(|e| AppError::new(5, format!("Failed to create series JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(out, file)
        .map_err(|e| AppError::new(5, format!("Failed to write series JSON: {e}")))?;
    Ok(())
}

/// Read a series JSON file.
pub fn read_series_json(path: &Path) -> Result<SeriesFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open series JSON '{}': {e}", path.display())))?;
    let series: SeriesFile =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid series JSON: {e}")))?;
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Metric, RawRecord, TrailingWeek};
    use crate::normalize::normalize;
    use chrono::NaiveDate;

    #[test]
    fn series_file_survives_a_disk_trip() {
        let records: Vec<RawRecord> = (1..=20)
            .map(|day| RawRecord {
                date: NaiveDate::from_ymd_opt(2020, 4, day).unwrap(),
                region: "Italy".to_string(),
                count: 1_000 + i64::from(day),
                population: 60_359_546,
            })
            .collect();
        let file = SeriesFile {
            tool: TOOL_NAME.to_string(),
            region: "Italy".to_string(),
            metric: Metric::Cases,
            start_date: NaiveDate::from_ymd_opt(2020, 4, 1),
            trailing_week: TrailingWeek::Drop,
            title: "Italy".to_string(),
            series: normalize(&records, "Italy", None).unwrap().series,
        };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("italy.json");
        write_series_json(&path, &file).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"trailing_week\": \"drop\""));
        assert!(text.contains("\"week_ending\": \"2020-04-06\""));

        assert_eq!(read_series_json(&path).unwrap(), file);
    }

    #[test]
    fn malformed_json_is_an_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{\"tool\": \"covplot\"").unwrap();

        let err = read_series_json(&path).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.message().starts_with("Invalid series JSON"));
    }
}
