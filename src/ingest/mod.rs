//! Table ingestion: CSV loading, caching and data directory discovery.

pub mod cache;
pub mod loader;
pub mod scanner;
pub mod source;

pub use cache::TableCache;
pub use loader::{load_csv, read_csv, CsvOptions};
pub use source::{CsvTableSource, TableRole, TableSource};
