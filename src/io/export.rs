//! Export a weekly series to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::path::Path;

use crate::domain::Series;
use crate::error::AppError;

/// Write a series as `week_ending,value_per_100k,raw_count` rows.
pub fn write_series_csv(path: &Path, series: &Series) -> Result<(), AppError> {
    super::ensure_parent_dir(path)?;
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::new(5, format!("Failed to create export CSV '{}': {e}", path.display())))?;

    writer
        .write_record(["week_ending", "value_per_100k", "raw_count"])
        .map_err(|e| AppError::new(5, format!("Failed to write export CSV header: {e}")))?;

    for p in series.points() {
        writer
            .write_record([
                p.week_ending.to_string(),
                format!("{:.6}", p.value_per_100k),
                p.raw_count.to_string(),
            ])
            .map_err(|e| AppError::new(5, format!("Failed to write export CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::new(5, format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}
