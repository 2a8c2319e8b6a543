//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and how flags override the config file.

use accomstat::analysis::intensity::JoinStrategy;
use accomstat::analysis::recipes::Recipe;
use accomstat::config::{Config, ReportFormat};
use clap::Parser;
use std::path::PathBuf;

/// accomstat - regional tourist accommodation statistics
///
/// Compares accommodation tables across regional granularities and
/// visitor origins, and relates them to population.
///
/// Examples:
///   accomstat --data-dir ./data
///   accomstat --data-dir ./data --recipe fine-origin --format json
///   accomstat --data-dir ./data --recipe population --output report.md
///   accomstat --data-dir ./data --list-tables
///   accomstat --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Analysis to run
    #[arg(short, long, default_value = "all", value_name = "RECIPE")]
    pub recipe: RecipeArg,

    /// Directory holding the table files
    ///
    /// Overrides [data].dir from the config file.
    #[arg(short, long, value_name = "DIR", env = "ACCOMSTAT_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .accomstat.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output file path for the report
    ///
    /// The report is printed to stdout when no output is given.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Cell content treated as a missing value
    #[arg(long, value_name = "TOKEN")]
    pub missing_token: Option<String>,

    /// Number of regions listed in each ranking
    #[arg(long, value_name = "N")]
    pub top_n: Option<usize>,

    /// How accommodation rows are matched to population rows
    #[arg(long, value_name = "STRATEGY")]
    pub join: Option<JoinArg>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Scan the data directory and show which tables resolve, then exit
    #[arg(long)]
    pub list_tables: bool,

    /// Generate a default .accomstat.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Markdown,
    Json,
}

impl From<OutputFormat> for ReportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Markdown => ReportFormat::Markdown,
            OutputFormat::Json => ReportFormat::Json,
        }
    }
}

/// Recipe selection for --recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum RecipeArg {
    /// Coarse vs. fine regions
    Granularity,
    /// Domestic vs. foreign, coarse regions
    CoarseOrigin,
    /// Domestic vs. foreign, fine regions
    FineOrigin,
    /// Population and accommodation intensity
    Population,
    /// Every recipe, in order
    All,
}

/// Join strategy for --join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum JoinArg {
    Label,
    Position,
}

impl From<JoinArg> for JoinStrategy {
    fn from(join: JoinArg) -> Self {
        match join {
            JoinArg::Label => JoinStrategy::Label,
            JoinArg::Position => JoinStrategy::Position,
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.top_n == Some(0) {
            return Err("--top-n must be at least 1".to_string());
        }

        if let Some(ref token) = self.missing_token {
            if token.trim().is_empty() {
                return Err("--missing-token cannot be blank".to_string());
            }
        }

        if let Some(ref dir) = self.data_dir {
            if !dir.is_dir() {
                return Err(format!("Data directory does not exist: {}", dir.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level once `[general] verbose` from the config is
    /// known. `--quiet` wins over both.
    pub fn effective_log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Recipes selected by --recipe, in run order.
    pub fn recipes(&self) -> Vec<Recipe> {
        match self.recipe {
            RecipeArg::Granularity => vec![Recipe::GranularityComparison],
            RecipeArg::CoarseOrigin => vec![Recipe::CoarseOriginSplit],
            RecipeArg::FineOrigin => vec![Recipe::FineOriginSplit],
            RecipeArg::Population => vec![Recipe::PopulationIntensity],
            RecipeArg::All => Recipe::ALL.to_vec(),
        }
    }

    /// Override config values with the flags that were given.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(ref dir) = self.data_dir {
            config.data.dir = dir.display().to_string();
        }
        if let Some(ref output) = self.output {
            config.general.output = Some(output.display().to_string());
        }
        if let Some(format) = self.format {
            config.general.format = format.into();
        }
        if let Some(ref token) = self.missing_token {
            config.data.missing_token = token.clone();
        }
        if let Some(top_n) = self.top_n {
            config.analysis.top_n = top_n;
        }
        if let Some(join) = self.join {
            config.analysis.join = join.into();
        }

        // Flags always override
        if self.verbose {
            config.general.verbose = true;
        }
    }
}
