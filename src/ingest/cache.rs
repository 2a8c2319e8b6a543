//! Read-through cache for loaded tables.
//!
//! Entries are keyed by canonical path and invalidated when the file's modification
//! time changes. Tables are shared as `Arc<RawTable>`; nothing downstream
//! mutates them, so concurrent analyses can reuse one entry.

use crate::error::{AnalysisError, AnalysisResult};
use crate::models::RawTable;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::SystemTime;
use tracing::debug;

struct CacheEntry {
    modified: SystemTime,
    table: Arc<RawTable>,
}

/// Hit/miss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
}

/// Table cache keyed by source path and modification time.
#[derive(Default)]
pub struct TableCache {
    entries: Mutex<HashMap<PathBuf, CacheEntry>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached table for `path`, loading it on a miss or when the
    /// file changed since it was cached.
    pub fn get_or_load<F>(&self, path: &Path, load: F) -> AnalysisResult<Arc<RawTable>>
    where
        F: FnOnce(&Path) -> AnalysisResult<RawTable>,
    {
        let unavailable =
            |e: std::io::Error| AnalysisError::unavailable(path.display().to_string(), e.to_string());
        let key = std::fs::canonicalize(path).map_err(unavailable)?;
        let modified = std::fs::metadata(&key)
            .and_then(|m| m.modified())
            .map_err(unavailable)?;

        if let Some(entry) = self.lock().get(&key) {
            if entry.modified == modified {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!("Table cache hit: {}", path.display());
                return Ok(Arc::clone(&entry.table));
            }
            debug!("Table cache stale: {}", path.display());
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let table = Arc::new(load(path)?);

        self.lock().insert(
            key,
            CacheEntry {
                modified,
                table: Arc::clone(&table),
            },
        );

        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
