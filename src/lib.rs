//! accomstat - regional tourist accommodation statistics
//!
//! Loads monthly accommodation tables at two regional granularities,
//! cleans them and runs fixed analysis recipes: granularity comparison,
//! domestic vs. foreign splits and population-relative intensity with
//! seasonality. Results are plain serializable values plus named chart
//! series for a presentation layer.

pub mod analysis;
pub mod config;
pub mod error;
pub mod ingest;
pub mod models;
pub mod report;

pub use error::{AnalysisError, AnalysisResult};
