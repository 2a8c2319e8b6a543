//! Configuration file handling.
//!
//! This module handles loading `.accomstat.toml` files and turning them
//! into the options the ingest, analysis and report layers take.

use crate::analysis::intensity::JoinStrategy;
use crate::analysis::recipes::AnalysisOptions;
use crate::ingest::loader::CsvOptions;
use crate::ingest::source::TableRole;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".accomstat.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Input data settings.
    #[serde(default)]
    pub data: DataConfig,

    /// Analysis parameters.
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// Report serialization format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Markdown,
    Json,
}

/// General application settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Report output path; stdout when unset.
    #[serde(default)]
    pub output: Option<String>,

    #[serde(default)]
    pub format: ReportFormat,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// Where tables come from and how they are read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory holding the table files.
    #[serde(default = "default_data_dir")]
    pub dir: String,

    /// Cell content treated as a missing value.
    #[serde(default = "default_missing_token")]
    pub missing_token: String,

    #[serde(default = "default_true")]
    pub label_is_first_column: bool,

    /// Single-character field delimiter.
    #[serde(default = "default_delimiter")]
    pub delimiter: String,

    /// Role key (e.g. `coarse_domestic`) to file name under `dir`.
    #[serde(default = "default_tables")]
    pub tables: BTreeMap<String, String>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
            missing_token: default_missing_token(),
            label_is_first_column: true,
            delimiter: default_delimiter(),
            tables: default_tables(),
        }
    }
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_missing_token() -> String {
    ":".to_string()
}

fn default_delimiter() -> String {
    ",".to_string()
}

fn default_tables() -> BTreeMap<String, String> {
    TableRole::ALL
        .into_iter()
        .map(|role| (role.key().to_string(), role.default_file().to_string()))
        .collect()
}

/// Analysis parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Regions listed in each ranking.
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// How accommodation rows are matched to population rows.
    #[serde(default)]
    pub join: JoinStrategy,

    #[serde(default = "default_coarse_name")]
    pub coarse_name: String,

    #[serde(default = "default_fine_name")]
    pub fine_name: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            join: JoinStrategy::default(),
            coarse_name: default_coarse_name(),
            fine_name: default_fine_name(),
        }
    }
}

fn default_top_n() -> usize {
    5
}

fn default_coarse_name() -> String {
    "NUTS1".to_string()
}

fn default_fine_name() -> String {
    "NUTS2".to_string()
}

/// Report generation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Include chart series in Markdown output.
    #[serde(default = "default_true")]
    pub include_charts: bool,

    /// Decimal places for numbers in Markdown output.
    #[serde(default = "default_decimals")]
    pub decimals: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            include_charts: true,
            decimals: default_decimals(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_decimals() -> usize {
    2
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.accomstat.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(DEFAULT_CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Check values that serde cannot.
    pub fn validate(&self) -> Result<()> {
        if self.analysis.top_n == 0 {
            bail!("analysis.top_n must be at least 1");
        }
        self.csv_options()?;
        self.table_files()?;
        Ok(())
    }

    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.data.dir)
    }

    /// Role to file-name map. Roles missing from `[data.tables]` fall back
    /// to their default file names; unknown keys are rejected.
    pub fn table_files(&self) -> Result<HashMap<TableRole, String>> {
        let mut files: HashMap<TableRole, String> = TableRole::ALL
            .into_iter()
            .map(|role| (role, role.default_file().to_string()))
            .collect();

        for (key, file) in &self.data.tables {
            let role = TableRole::from_key(key)
                .with_context(|| format!("Unknown table role in [data.tables]: '{}'", key))?;
            files.insert(role, file.clone());
        }

        Ok(files)
    }

    pub fn csv_options(&self) -> Result<CsvOptions> {
        let delimiter = match self.data.delimiter.as_bytes() {
            [byte] => *byte,
            _ => bail!(
                "data.delimiter must be a single ASCII character, got '{}'",
                self.data.delimiter
            ),
        };
        Ok(CsvOptions { delimiter })
    }

    pub fn analysis_options(&self) -> AnalysisOptions {
        AnalysisOptions {
            missing_token: self.data.missing_token.clone(),
            label_is_first_column: self.data.label_is_first_column,
            top_n: self.analysis.top_n,
            join: self.analysis.join,
            coarse_name: self.analysis.coarse_name.clone(),
            fine_name: self.analysis.fine_name.clone(),
            ..AnalysisOptions::default()
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
