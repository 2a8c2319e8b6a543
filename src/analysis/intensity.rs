//! Accommodation intensity (guests per capita).
//!
//! Joins per-row accommodation totals against a population reference and
//! divides. A zero, missing or absent population gives a rate of 0: no
//! comparable baseline, but still plottable.

use crate::analysis::normalize::parse_cell;
use crate::error::{AnalysisError, AnalysisResult};
use crate::models::{CleanedTable, LabelValue, RawTable};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use tracing::debug;

/// How accommodation rows are paired with population rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinStrategy {
    /// Pair by label; the k-th occurrence of a label joins the k-th
    /// occurrence in the population table.
    #[default]
    Label,
    /// Pair by source row index without checking labels.
    Position,
}

/// One row of a population reference table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationEntry {
    pub label: String,
    pub source_row: usize,
    pub population: Option<f64>,
}

/// Label to population scalar, taken from the last column of a table.
#[derive(Debug, Clone, PartialEq)]
pub struct PopulationReference {
    table: String,
    entries: Vec<PopulationEntry>,
}

impl PopulationReference {
    /// Build a reference from a raw table with values from the last column.
    /// Unparseable values become missing.
    ///
    /// Labels follow the accommodation tables: column 0 with
    /// `label_is_first_column`, otherwise the zero-based row index.
    pub fn from_raw(
        raw: &RawTable,
        missing_token: &str,
        label_is_first_column: bool,
    ) -> AnalysisResult<Self> {
        let width = raw.columns().len();
        if label_is_first_column && width < 2 {
            return Err(AnalysisError::shape_mismatch(
                raw.name(),
                "population reference",
                "population table needs a label column and a value column",
            ));
        }

        let entries = raw
            .rows()
            .iter()
            .enumerate()
            .map(|(idx, cells)| PopulationEntry {
                label: if label_is_first_column {
                    cells[0].as_label()
                } else {
                    idx.to_string()
                },
                source_row: idx,
                population: parse_cell(&cells[width - 1], missing_token),
            })
            .collect();

        Ok(Self {
            table: raw.name().to_string(),
            entries,
        })
    }

    pub fn from_entries(table: impl Into<String>, entries: Vec<PopulationEntry>) -> Self {
        Self {
            table: table.into(),
            entries,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn entries(&self) -> &[PopulationEntry] {
        &self.entries
    }
}

/// Accommodation total of one cleaned row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowTotal {
    pub label: String,
    pub source_row: usize,
    pub total: f64,
}

/// Per-row accommodation totals of a cleaned table.
pub fn row_totals(table: &CleanedTable) -> Vec<RowTotal> {
    table
        .rows()
        .iter()
        .map(|row| RowTotal {
            label: row.label.clone(),
            source_row: row.source_row,
            total: row.total(),
        })
        .collect()
}

/// Intensity of one accommodation row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntensityEntry {
    pub label: String,
    pub accommodation_total: f64,
    pub population: Option<f64>,
    /// `accommodation_total / population`, or 0 without a usable baseline.
    pub rate: f64,
}

/// Per-label intensity in accommodation-table order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntensityResult {
    pub entries: Vec<IntensityEntry>,
}

impl IntensityResult {
    /// Entry with the highest rate; ties go to the first occurrence.
    pub fn highest(&self) -> Option<&IntensityEntry> {
        self.entries.iter().fold(None, |best, e| match best {
            Some(b) if b.rate >= e.rate => Some(b),
            _ => Some(e),
        })
    }

    /// Entry with the lowest rate; ties go to the first occurrence.
    pub fn lowest(&self) -> Option<&IntensityEntry> {
        self.entries.iter().fold(None, |best, e| match best {
            Some(b) if b.rate <= e.rate => Some(b),
            _ => Some(e),
        })
    }

    pub fn rates(&self) -> Vec<LabelValue> {
        self.entries
            .iter()
            .map(|e| LabelValue::new(e.label.clone(), e.rate))
            .collect()
    }
}

/// Compute accommodation intensity against a population reference.
///
/// With [`JoinStrategy::Label`], an accommodation label with no remaining
/// counterpart in the reference is a [`AnalysisError::ShapeMismatch`].
/// Extra population rows are ignored; they belong to accommodation rows
/// that were dropped as entirely missing.
pub fn intensity(
    totals: &[RowTotal],
    population: &PopulationReference,
    strategy: JoinStrategy,
) -> AnalysisResult<IntensityResult> {
    let baselines = match strategy {
        JoinStrategy::Label => join_by_label(totals, population)?,
        JoinStrategy::Position => join_by_position(totals, population),
    };

    let entries = totals
        .iter()
        .zip(baselines)
        .map(|(row, population)| {
            let rate = match population {
                Some(p) if p != 0.0 => row.total / p,
                _ => {
                    debug!("No population baseline for '{}', rate set to 0", row.label);
                    0.0
                }
            };
            IntensityEntry {
                label: row.label.clone(),
                accommodation_total: row.total,
                population,
                rate,
            }
        })
        .collect();

    Ok(IntensityResult { entries })
}

fn join_by_label(
    totals: &[RowTotal],
    population: &PopulationReference,
) -> AnalysisResult<Vec<Option<f64>>> {
    let mut by_label: HashMap<&str, VecDeque<Option<f64>>> = HashMap::new();
    for entry in population.entries() {
        by_label
            .entry(entry.label.as_str())
            .or_default()
            .push_back(entry.population);
    }

    totals
        .iter()
        .map(|row| {
            by_label
                .get_mut(row.label.as_str())
                .and_then(VecDeque::pop_front)
                .ok_or_else(|| {
                    AnalysisError::shape_mismatch(
                        "accommodation",
                        population.table(),
                        format!("no population row for region '{}'", row.label),
                    )
                })
        })
        .collect()
}

fn join_by_position(totals: &[RowTotal], population: &PopulationReference) -> Vec<Option<f64>> {
    let by_row: HashMap<usize, Option<f64>> = population
        .entries()
        .iter()
        .map(|e| (e.source_row, e.population))
        .collect();

    totals
        .iter()
        .map(|row| by_row.get(&row.source_row).copied().flatten())
        .collect()
}
