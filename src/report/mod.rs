//! Reporting utilities: run summaries and chart titles.

pub mod format;

pub use format::*;
