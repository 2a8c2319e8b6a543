//! accomstat - regional tourist accommodation statistics
//!
//! Loads accommodation and population tables from a data directory,
//! runs the selected analysis recipes and writes a Markdown or JSON
//! report.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Any failure (missing or malformed table, mismatched tables,
//!       bad arguments or config)

mod cli;

use accomstat::analysis::recipes::run_recipes;
use accomstat::config::{Config, ReportFormat, DEFAULT_CONFIG_FILE};
use accomstat::ingest::scanner::{resolve_roles, DataScanner, ScanConfig};
use accomstat::ingest::source::{CsvTableSource, TableRole};
use accomstat::models::{Report, ReportMetadata};
use accomstat::report::{self, ReportOptions};
use anyhow::{Context, Result};
use chrono::Utc;
use cli::Args;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() {
    // Parse command-line arguments
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        if let Err(e) = handle_init_config() {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
        return;
    }

    // Config is read before logging so `[general] verbose` takes effect
    let (mut config, config_path) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    args.apply_to(&mut config);

    init_logging(args.effective_log_level(config.general.verbose));

    info!("accomstat v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    match config_path {
        Some(path) => info!("Loaded config from: {}", path.display()),
        None => debug!("No config file found, using defaults"),
    }

    match run(args, config) {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            error!("Analysis failed: {:#}", e);
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .accomstat.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        anyhow::bail!(
            "{} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("Edit it to set the data directory, table files and analysis options.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// Logs go to stderr so a report printed to stdout stays clean. `RUST_LOG`
/// takes precedence over the verbosity flags.
fn init_logging(level: tracing::Level) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string().to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the selected recipes and emit the report.
fn run(args: Args, config: Config) -> Result<i32> {
    let start_time = Instant::now();

    config.validate()?;

    let data_dir = config.data_dir();
    let files = config.table_files()?;

    if args.list_tables {
        return handle_list_tables(&data_dir, &files);
    }

    let source = CsvTableSource::new(data_dir.clone(), files, config.csv_options()?);
    let recipes = args.recipes();
    let options = config.analysis_options();

    info!(
        "Running {} recipe(s) over {}",
        recipes.len(),
        data_dir.display()
    );
    let outcomes = run_recipes(&recipes, &source, &options)?;

    let cache = source.cache().stats();
    debug!("Table cache: {} hits, {} misses", cache.hits, cache.misses);

    let report = Report {
        metadata: ReportMetadata {
            analysis_date: Utc::now(),
            data_dir: data_dir.display().to_string(),
            missing_token: options.missing_token.clone(),
            recipes: recipes.iter().map(|r| r.to_string()).collect(),
            duration_seconds: start_time.elapsed().as_secs_f64(),
        },
        outcomes,
    };

    let content = match config.general.format {
        ReportFormat::Json => report::generate_json_report(&report)?,
        ReportFormat::Markdown => {
            let report_options = ReportOptions::from_config(&config.report, config.analysis.top_n);
            report::generate_markdown_report(&report, &report_options)
        }
    };

    match config.general.output {
        Some(ref output) => {
            report::write_report(&content, Path::new(output))?;
            info!("Report saved to: {}", output);
        }
        None => println!("{}", content),
    }

    Ok(0)
}

/// Handle --list-tables: show which configured tables resolve, then exit.
fn handle_list_tables(data_dir: &Path, files: &HashMap<TableRole, String>) -> Result<i32> {
    let scanner = DataScanner::new(PathBuf::from(data_dir), ScanConfig::default());
    let scanned = scanner.scan()?;

    println!("Data directory: {}\n", data_dir.display());

    let statuses = resolve_roles(&scanned, files);
    let mut missing = 0;
    for status in &statuses {
        match status.found {
            Some(ref table) => println!(
                "  [ok]      {:<18} {} ({} bytes)",
                status.role.key(),
                status.file,
                table.size
            ),
            None => {
                missing += 1;
                println!("  [missing] {:<18} {}", status.role.key(), status.file);
            }
        }
    }

    let unassigned: Vec<_> = scanned
        .iter()
        .filter(|s| !statuses.iter().any(|st| Path::new(&st.file) == Path::new(&s.path)))
        .collect();
    if !unassigned.is_empty() {
        println!("\nOther table files:");
        for table in unassigned {
            println!("  {} ({} bytes)", table.path, table.size);
        }
    }

    if missing > 0 {
        warn!("{} configured table(s) not found", missing);
    }

    Ok(0)
}

/// Load configuration from file or use defaults, along with the file it
/// came from.
fn load_config(args: &Args) -> Result<(Config, Option<PathBuf>)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Ok((Config::load(config_path)?, Some(config_path.clone())));
    }

    // Try default location
    Ok(match Config::load_default()? {
        Some(config) => (config, Some(PathBuf::from(DEFAULT_CONFIG_FILE))),
        None => (Config::default(), None),
    })
}
