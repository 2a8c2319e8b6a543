//! Failure taxonomy for the analysis engine.
//!
//! Only two conditions abort an analysis. Everything else (unparseable
//! cells, zero denominators) degrades into a defined fallback value inside
//! the result and never surfaces here.

use thiserror::Error;

/// Errors that abort an analysis.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// A raw table could not be obtained: missing file, unreadable or
    /// corrupt CSV, ragged rows.
    #[error("table '{table}' is unavailable: {reason}")]
    SourceUnavailable { table: String, reason: String },

    /// Two tables that must align do not.
    #[error("tables '{left}' and '{right}' do not align: {detail}")]
    ShapeMismatch {
        left: String,
        right: String,
        detail: String,
    },
}

impl AnalysisError {
    pub fn unavailable(table: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            table: table.into(),
            reason: reason.into(),
        }
    }

    pub fn shape_mismatch(
        left: impl Into<String>,
        right: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self::ShapeMismatch {
            left: left.into(),
            right: right.into(),
            detail: detail.into(),
        }
    }
}

/// Result alias used across the library.
pub type AnalysisResult<T> = std::result::Result<T, AnalysisError>;
