//! Input/output helpers.
//!
//! - CSV ingest + validation (`ingest`)
//! - series CSV export (`export`)
//! - series JSON read/write (`series_file`)

use std::fs::create_dir_all;
use std::path::Path;

use crate::error::AppError;

pub mod export;
pub mod ingest;
pub mod series_file;

pub use export::*;
pub use ingest::*;
pub use series_file::*;

/// Create the parent directory of an output path if it does not exist yet.
pub(crate) fn ensure_parent_dir(path: &Path) -> Result<(), AppError> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => create_dir_all(dir).map_err(|e| {
            AppError::new(5, format!("Failed to create output directory '{}': {e}", dir.display()))
        }),
        _ => Ok(()),
    }
}
