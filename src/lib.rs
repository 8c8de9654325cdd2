//! `covid-plots` library crate.
//!
//! The binary (`covplot`) is a thin wrapper around this library so that:
//!
//! - the weekly normalization is testable without spawning processes
//! - loaders, normalization and rendering can be reused independently
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod io;
pub mod logging;
pub mod normalize;
pub mod plot;
pub mod render;
pub mod report;
