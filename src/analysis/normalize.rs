//! Raw table normalization.
//!
//! Turns a heterogeneous raw table into a [`CleanedTable`]: the sentinel
//! token, blanks and unparseable text all become the missing marker, and rows
//! with no values at all are dropped. Malformed numeric text is data loss,
//! not failure, so nothing here returns an error.

use crate::models::{CleanedRow, CleanedTable, RawCell, RawTable};
use tracing::debug;

/// Counters collected while normalizing one table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeStats {
    pub rows_read: usize,
    pub rows_kept: usize,
    pub cells_missing: usize,
}

impl NormalizeStats {
    pub fn rows_dropped(&self) -> usize {
        self.rows_read - self.rows_kept
    }
}

/// Normalize a raw table.
///
/// With `label_is_first_column`, column 0 is the label column and is never
/// coerced, even when it looks numeric. Otherwise every column is a period
/// and rows are labeled by their zero-based source index.
pub fn normalize(raw: &RawTable, missing_token: &str, label_is_first_column: bool) -> CleanedTable {
    normalize_with_stats(raw, missing_token, label_is_first_column).0
}

/// Normalize a raw table and report what was dropped.
pub fn normalize_with_stats(
    raw: &RawTable,
    missing_token: &str,
    label_is_first_column: bool,
) -> (CleanedTable, NormalizeStats) {
    let first_period = usize::from(label_is_first_column);

    let label_header = if label_is_first_column {
        raw.columns()[0].clone()
    } else {
        String::new()
    };
    let periods: Vec<String> = raw.columns()[first_period..].to_vec();

    let mut stats = NormalizeStats {
        rows_read: raw.row_count(),
        ..Default::default()
    };
    let mut rows = Vec::with_capacity(raw.row_count());

    for (idx, cells) in raw.rows().iter().enumerate() {
        let values: Vec<Option<f64>> = cells[first_period..]
            .iter()
            .map(|cell| parse_cell(cell, missing_token))
            .collect();

        stats.cells_missing += values.iter().filter(|v| v.is_none()).count();

        if values.iter().all(Option::is_none) {
            continue;
        }

        let label = if label_is_first_column {
            cells[0].as_label()
        } else {
            idx.to_string()
        };

        rows.push(CleanedRow {
            label,
            source_row: idx,
            values,
        });
    }

    stats.rows_kept = rows.len();

    debug!(
        "Normalized '{}': {} rows read, {} kept, {} dropped, {} missing cells",
        raw.name(),
        stats.rows_read,
        stats.rows_kept,
        stats.rows_dropped(),
        stats.cells_missing
    );

    let table = CleanedTable::new(raw.name().to_string(), label_header, periods, rows);
    (table, stats)
}

/// Coerce one period cell to a finite number or the missing marker.
pub fn parse_cell(cell: &RawCell, missing_token: &str) -> Option<f64> {
    match cell {
        RawCell::Number(n) => Some(*n).filter(|n| n.is_finite()),
        RawCell::Blank => None,
        RawCell::Text(text) => {
            let text = text.trim();
            if text.is_empty() || text == missing_token.trim() {
                return None;
            }
            text.parse::<f64>().ok().filter(|n| n.is_finite())
        }
    }
}
