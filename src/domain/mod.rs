//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - loader records (`RawRecord`, `WeeklyCount`)
//! - the weekly output (`NormalizedPoint`, `Series`, `NormalizeOutput`)
//! - selection enums (`Metric`, `TrailingWeek`, `LineColor`)
//! - run configuration and the saved series file

pub mod types;

pub use types::*;
