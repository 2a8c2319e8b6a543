//! Data models for the accommodation statistics engine.
//!
//! This module contains the table representations that flow through the
//! pipeline (raw and cleaned), the keyed value types used in every result,
//! and the top-level report structures.

use crate::analysis::recipes::RecipeOutcome;
use crate::error::{AnalysisError, AnalysisResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single cell of a raw table, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    /// A value that is already numeric (e.g. supplied programmatically).
    Number(f64),
    /// Any non-empty text, including the missing-sentinel token.
    Text(String),
    /// An empty cell.
    Blank,
}

impl RawCell {
    /// Textual form of the cell, used for label columns.
    pub fn as_label(&self) -> String {
        match self {
            RawCell::Number(n) => n.to_string(),
            RawCell::Text(s) => s.clone(),
            RawCell::Blank => String::new(),
        }
    }
}

impl From<&str> for RawCell {
    fn from(s: &str) -> Self {
        if s.trim().is_empty() {
            RawCell::Blank
        } else {
            RawCell::Text(s.to_string())
        }
    }
}

impl From<f64> for RawCell {
    fn from(n: f64) -> Self {
        RawCell::Number(n)
    }
}

impl From<Option<f64>> for RawCell {
    fn from(value: Option<f64>) -> Self {
        value.map(RawCell::Number).unwrap_or(RawCell::Blank)
    }
}

/// A rectangular labeled grid as supplied by the ingestion layer.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    name: String,
    columns: Vec<String>,
    rows: Vec<Vec<RawCell>>,
}

impl RawTable {
    /// Build a raw table, rejecting rows whose width differs from the header.
    pub fn new(
        name: impl Into<String>,
        columns: Vec<String>,
        rows: Vec<Vec<RawCell>>,
    ) -> AnalysisResult<Self> {
        let name = name.into();

        if columns.is_empty() {
            return Err(AnalysisError::unavailable(name, "table has no columns"));
        }

        if let Some((idx, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(AnalysisError::unavailable(
                name,
                format!(
                    "row {} has {} cells, expected {}",
                    idx + 1,
                    row.len(),
                    columns.len()
                ),
            ));
        }

        Ok(Self {
            name,
            columns,
            rows,
        })
    }

    /// Source identity of the table (file name or caller-chosen name).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<RawCell>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// One row of a cleaned table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanedRow {
    /// Region label, verbatim from the source.
    pub label: String,
    /// Zero-based index of the row in the raw table it came from.
    pub source_row: usize,
    /// One value per period; `None` is the missing marker.
    pub values: Vec<Option<f64>>,
}

impl CleanedRow {
    /// Sum of the row's non-missing values.
    pub fn total(&self) -> f64 {
        self.values.iter().flatten().sum()
    }
}

/// A normalized table: every period cell is a finite number or missing, and
/// no row is entirely missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanedTable {
    name: String,
    label_header: String,
    periods: Vec<String>,
    rows: Vec<CleanedRow>,
}

impl CleanedTable {
    pub(crate) fn new(
        name: String,
        label_header: String,
        periods: Vec<String>,
        rows: Vec<CleanedRow>,
    ) -> Self {
        Self {
            name,
            label_header,
            periods,
            rows,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label_header(&self) -> &str {
        &self.label_header
    }

    pub fn periods(&self) -> &[String] {
        &self.periods
    }

    pub fn rows(&self) -> &[CleanedRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate over every non-missing value in row-major order.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().flat_map(|r| r.values.iter().flatten().copied())
    }

    /// Convert back into a raw table with the label in column 0.
    ///
    /// Missing cells become blanks, so normalizing the result reproduces the
    /// same labels and values.
    pub fn to_raw(&self) -> RawTable {
        let mut columns = Vec::with_capacity(self.periods.len() + 1);
        columns.push(self.label_header.clone());
        columns.extend(self.periods.iter().cloned());

        let rows = self
            .rows
            .iter()
            .map(|row| {
                let mut cells = Vec::with_capacity(row.values.len() + 1);
                cells.push(RawCell::Text(row.label.clone()));
                cells.extend(row.values.iter().map(|v| RawCell::from(*v)));
                cells
            })
            .collect();

        RawTable {
            name: self.name.clone(),
            columns,
            rows,
        }
    }
}

/// A numeric value keyed by region label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelValue {
    pub label: String,
    pub value: f64,
}

impl LabelValue {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// A possibly-missing value keyed by period name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodValue {
    pub period: String,
    pub value: Option<f64>,
}

impl PeriodValue {
    pub fn new(period: impl Into<String>, value: Option<f64>) -> Self {
        Self {
            period: period.into(),
            value,
        }
    }
}

/// Geographic aggregation level of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// Larger regions (NUTS 1 in the reference data set).
    Coarse,
    /// Finer subdivisions (NUTS 2 in the reference data set).
    Fine,
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Granularity::Coarse => write!(f, "coarse"),
            Granularity::Fine => write!(f, "fine"),
        }
    }
}

/// Ingest statistics for one table used by a recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSummary {
    /// Role the table played in the recipe (e.g. `coarse_domestic`).
    pub role: String,
    /// Source identity of the table.
    pub source: String,
    pub rows_read: usize,
    pub rows_kept: usize,
    /// Cells that were blank, the missing token, or unparseable.
    pub cells_missing: usize,
}

/// Axis data of a chart trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Axis {
    Categories(Vec<String>),
    Values(Vec<Option<f64>>),
}

impl Axis {
    pub fn len(&self) -> usize {
        match self {
            Axis::Categories(c) => c.len(),
            Axis::Values(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One named series of a chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    pub name: String,
    pub x: Axis,
    pub y: Vec<Option<f64>>,
    /// Point annotations (e.g. region labels on a scatter plot).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<Vec<String>>,
}

/// The numeric series a presentation layer needs for one chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    pub name: String,
    pub traces: Vec<Trace>,
}

impl Chart {
    pub fn new(name: impl Into<String>, traces: Vec<Trace>) -> Self {
        Self {
            name: name.into(),
            traces,
        }
    }
}

/// Metadata about an analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Date and time of the analysis.
    pub analysis_date: DateTime<Utc>,
    /// Directory the tables were loaded from.
    pub data_dir: String,
    /// Token treated as a missing value.
    pub missing_token: String,
    /// Recipes executed, in order.
    pub recipes: Vec<String>,
    /// Duration of the run in seconds.
    pub duration_seconds: f64,
}

/// The complete analysis report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub outcomes: Vec<RecipeOutcome>,
}
