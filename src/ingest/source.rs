//! Table sources.
//!
//! The orchestrator pulls raw tables by [`TableRole`] through the
//! [`TableSource`] trait. [`CsvTableSource`] resolves roles to files in a
//! data directory; an in-memory map works for tests and embedding.

use crate::error::{AnalysisError, AnalysisResult};
use crate::ingest::cache::TableCache;
use crate::ingest::loader::{load_csv, CsvOptions};
use crate::models::{Granularity, RawTable};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// The part a table plays in an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableRole {
    Coarse,
    Fine,
    CoarseDomestic,
    CoarseForeign,
    FineDomestic,
    FineForeign,
    CoarsePopulation,
    FinePopulation,
}

impl TableRole {
    pub const ALL: [TableRole; 8] = [
        TableRole::Coarse,
        TableRole::Fine,
        TableRole::CoarseDomestic,
        TableRole::CoarseForeign,
        TableRole::FineDomestic,
        TableRole::FineForeign,
        TableRole::CoarsePopulation,
        TableRole::FinePopulation,
    ];

    /// Accommodation table (all origins) at a granularity.
    pub fn accommodation(granularity: Granularity) -> Self {
        match granularity {
            Granularity::Coarse => TableRole::Coarse,
            Granularity::Fine => TableRole::Fine,
        }
    }

    /// Domestic and foreign tables at a granularity.
    pub fn origin_pair(granularity: Granularity) -> (Self, Self) {
        match granularity {
            Granularity::Coarse => (TableRole::CoarseDomestic, TableRole::CoarseForeign),
            Granularity::Fine => (TableRole::FineDomestic, TableRole::FineForeign),
        }
    }

    /// Population reference table at a granularity.
    pub fn population(granularity: Granularity) -> Self {
        match granularity {
            Granularity::Coarse => TableRole::CoarsePopulation,
            Granularity::Fine => TableRole::FinePopulation,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            TableRole::Coarse => "coarse",
            TableRole::Fine => "fine",
            TableRole::CoarseDomestic => "coarse_domestic",
            TableRole::CoarseForeign => "coarse_foreign",
            TableRole::FineDomestic => "fine_domestic",
            TableRole::FineForeign => "fine_foreign",
            TableRole::CoarsePopulation => "coarse_population",
            TableRole::FinePopulation => "fine_population",
        }
    }
}

impl TableRole {
    /// Parse a role from its configuration key.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.key() == key)
    }

    /// File name the role resolves to when none is configured.
    pub fn default_file(&self) -> &'static str {
        match self {
            TableRole::Coarse => "nuts_1_2023.csv",
            TableRole::Fine => "nuts_2_2023.csv",
            TableRole::CoarseDomestic => "nuts_1_2023_domestic.csv",
            TableRole::CoarseForeign => "nuts_1_2023_foreigner.csv",
            TableRole::FineDomestic => "nuts_2_2023_domestic.csv",
            TableRole::FineForeign => "nuts_2_2023_foreigner.csv",
            TableRole::CoarsePopulation => "nuts_1_population.csv",
            TableRole::FinePopulation => "nuts_2_population.csv",
        }
    }
}

impl fmt::Display for TableRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Supplies raw tables to the orchestrator.
pub trait TableSource {
    /// Load the table for a role, or fail with `SourceUnavailable`.
    fn load(&self, role: TableRole) -> AnalysisResult<Arc<RawTable>>;
}

impl TableSource for HashMap<TableRole, RawTable> {
    fn load(&self, role: TableRole) -> AnalysisResult<Arc<RawTable>> {
        self.get(&role)
            .cloned()
            .map(Arc::new)
            .ok_or_else(|| AnalysisError::unavailable(role.key(), "no table supplied"))
    }
}

/// Loads tables from CSV files in a data directory.
pub struct CsvTableSource {
    data_dir: PathBuf,
    files: HashMap<TableRole, String>,
    options: CsvOptions,
    cache: Arc<TableCache>,
}

impl CsvTableSource {
    /// Create a source over `data_dir` with a role to file-name map.
    pub fn new(data_dir: PathBuf, files: HashMap<TableRole, String>, options: CsvOptions) -> Self {
        Self {
            data_dir,
            files,
            options,
            cache: Arc::new(TableCache::new()),
        }
    }

    /// Share an existing cache (e.g. across requests in a hosting layer).
    pub fn with_cache(mut self, cache: Arc<TableCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn cache(&self) -> &TableCache {
        &self.cache
    }

    /// Resolved path for a role, if the role is configured.
    pub fn path_for(&self, role: TableRole) -> Option<PathBuf> {
        self.files.get(&role).map(|f| self.data_dir.join(f))
    }
}

impl TableSource for CsvTableSource {
    fn load(&self, role: TableRole) -> AnalysisResult<Arc<RawTable>> {
        let path = self
            .path_for(role)
            .ok_or_else(|| AnalysisError::unavailable(role.key(), "no file configured"))?;

        if !path.is_file() {
            return Err(AnalysisError::unavailable(
                path.display().to_string(),
                format!("file for role '{}' not found", role),
            ));
        }

        debug!("Resolving {} -> {}", role, path.display());
        self.cache.get_or_load(&path, |p| load_csv(p, &self.options))
    }
}
