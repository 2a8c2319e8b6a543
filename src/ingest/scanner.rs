//! Data directory scanner.
//!
//! Discovers candidate table files under a data directory and reports
//! which configured table roles resolve to an existing file.

use crate::ingest::source::TableRole;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Configuration for scanning a data directory.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// File extensions to include (without dot).
    pub extensions: Vec<String>,
    /// Directory or file names to skip.
    pub excludes: Vec<String>,
    /// Maximum directory depth below the root.
    pub max_depth: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["csv", "tsv", "txt"]
                .into_iter()
                .map(String::from)
                .collect(),
            excludes: vec!["archive", "tmp"].into_iter().map(String::from).collect(),
            max_depth: 3,
        }
    }
}

/// A table file found in the data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedTable {
    /// Path relative to the data directory.
    pub path: String,
    /// File size in bytes.
    pub size: u64,
}

/// Whether a configured role resolves to a scanned file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleStatus {
    pub role: TableRole,
    pub file: String,
    pub found: Option<ScannedTable>,
}

/// Scanner for table files.
pub struct DataScanner {
    config: ScanConfig,
    root: PathBuf,
}

impl DataScanner {
    pub fn new(root: PathBuf, config: ScanConfig) -> Self {
        Self { config, root }
    }

    /// Scan for all matching files, sorted by relative path.
    pub fn scan(&self) -> Result<Vec<ScannedTable>> {
        if !self.root.is_dir() {
            anyhow::bail!("Data directory not found: {}", self.root.display());
        }

        let mut tables = Vec::new();
        let walker = WalkDir::new(&self.root)
            .max_depth(self.config.max_depth)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !self.is_excluded(e));

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    debug!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_file() || !self.matches(entry.path()) {
                continue;
            }

            let size = entry
                .metadata()
                .with_context(|| format!("Failed to stat {}", entry.path().display()))?
                .len();
            let rel = entry.path().strip_prefix(&self.root).unwrap_or(entry.path());

            tables.push(ScannedTable {
                path: rel.to_string_lossy().to_string(),
                size,
            });
        }

        tables.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(tables)
    }

    /// Check if a file has one of the configured extensions.
    pub fn matches(&self, path: &Path) -> bool {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        self.config
            .extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ext))
    }

    fn is_excluded(&self, entry: &DirEntry) -> bool {
        let name = entry.file_name().to_string_lossy();

        if name.starts_with('.') {
            return true;
        }

        self.config.excludes.iter().any(|pattern| name == pattern.as_str())
    }
}

/// Match configured role files against a scan result.
pub fn resolve_roles(
    scanned: &[ScannedTable],
    files: &HashMap<TableRole, String>,
) -> Vec<RoleStatus> {
    let mut statuses: Vec<RoleStatus> = files
        .iter()
        .map(|(role, file)| RoleStatus {
            role: *role,
            file: file.clone(),
            found: scanned
                .iter()
                .find(|s| Path::new(&s.path) == Path::new(file))
                .cloned(),
        })
        .collect();

    statuses.sort_by_key(|s| s.role);
    statuses
}
