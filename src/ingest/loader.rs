//! CSV table loading.
//!
//! Reads a delimited file into a [`RawTable`]. The first record is the
//! header row. Cells are kept as text; numeric coercion is the
//! normalizer's job.

use crate::error::{AnalysisError, AnalysisResult};
use crate::models::{RawCell, RawTable};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Options for reading delimited tables.
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Field delimiter byte.
    pub delimiter: u8,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

/// Load a table from a CSV file on disk.
pub fn load_csv(path: &Path, options: &CsvOptions) -> AnalysisResult<RawTable> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    let file = File::open(path)
        .map_err(|e| AnalysisError::unavailable(&name, format!("failed to open: {e}")))?;

    debug!("Loading table from {}", path.display());
    read_csv(name, file, options)
}

/// Read a table from any CSV source.
pub fn read_csv<R: Read>(
    name: impl Into<String>,
    reader: R,
    options: &CsvOptions,
) -> AnalysisResult<RawTable> {
    let name = name.into();

    // Labels are whitespace-sensitive, so cells are not trimmed here
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(true)
        .flexible(false)
        .from_reader(reader);

    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| AnalysisError::unavailable(&name, format!("failed to read header: {e}")))?
        .iter()
        .map(String::from)
        .collect();

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        // +2: one for the header, one for 1-based line numbers
        let record = record.map_err(|e| {
            AnalysisError::unavailable(&name, format!("malformed record near line {}: {e}", idx + 2))
        })?;
        rows.push(record.iter().map(RawCell::from).collect());
    }

    debug!("Read {} rows x {} columns from '{}'", rows.len(), columns.len(), name);
    RawTable::new(name, columns, rows)
}
