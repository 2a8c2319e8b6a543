//! Markdown and JSON report generation.
//!
//! Markdown is a human summary of each recipe outcome. JSON is the full
//! serialized [`Report`], chart series included.

use crate::analysis::aggregator::top_rows;
use crate::analysis::recipes::{
    DatasetAnalysis, GranularityComparison, GranularityIntensity, OriginSplit,
    PopulationIntensity, RecipeOutcome, RecipeResult,
};
use crate::config::ReportConfig;
use crate::models::{Chart, LabelValue, Report, ReportMetadata, TableSummary};
use anyhow::{Context, Result};
use std::path::Path;

/// Presentation settings for Markdown output.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub include_charts: bool,
    pub decimals: usize,
    /// Rows listed in "largest" tables.
    pub top_n: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            include_charts: true,
            decimals: 2,
            top_n: 5,
        }
    }
}

impl ReportOptions {
    pub fn from_config(report: &ReportConfig, top_n: usize) -> Self {
        Self {
            include_charts: report.include_charts,
            decimals: report.decimals,
            top_n,
        }
    }

    fn num(&self, value: f64) -> String {
        format!("{:.*}", self.decimals, value)
    }

    fn opt(&self, value: Option<f64>) -> String {
        value.map_or_else(|| "n/a".to_string(), |v| self.num(v))
    }
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report, options: &ReportOptions) -> String {
    let mut output = String::new();

    output.push_str("# Accommodation Statistics Report\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_table_of_contents(report));

    for outcome in &report.outcomes {
        output.push_str(&generate_outcome_section(outcome, options));
    }

    output.push_str(&generate_footer());

    output
}

fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!(
        "- **Analysis Date:** {}\n",
        metadata.analysis_date.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Data Directory:** `{}`\n", metadata.data_dir));
    section.push_str(&format!(
        "- **Missing Value Token:** `{}`\n",
        metadata.missing_token
    ));
    section.push_str(&format!("- **Recipes:** {}\n", metadata.recipes.join(", ")));
    section.push_str(&format!(
        "- **Analysis Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

fn generate_table_of_contents(report: &Report) -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");
    for outcome in &report.outcomes {
        toc.push_str(&format!(
            "- [{}](#{})\n",
            outcome.recipe.title(),
            anchor(outcome.recipe.title())
        ));
    }
    toc.push('\n');

    toc
}

/// GitHub-style heading anchor.
fn anchor(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ' || *c == '-')
        .map(|c| if c == ' ' { '-' } else { c })
        .collect()
}

fn generate_outcome_section(outcome: &RecipeOutcome, options: &ReportOptions) -> String {
    let mut section = String::new();

    section.push_str(&format!("## {}\n\n", outcome.recipe.title()));
    section.push_str(&generate_tables_section(&outcome.tables));

    match &outcome.result {
        RecipeResult::GranularityComparison(result) => {
            section.push_str(&generate_granularity_section(result, options))
        }
        RecipeResult::OriginSplit(result) => {
            section.push_str(&generate_origin_section(result, options))
        }
        RecipeResult::PopulationIntensity(result) => {
            section.push_str(&generate_intensity_section(result, options))
        }
    }

    if options.include_charts && !outcome.charts.is_empty() {
        section.push_str(&generate_charts_section(&outcome.charts));
    }

    section
}

fn generate_tables_section(tables: &[TableSummary]) -> String {
    let mut section = String::new();

    section.push_str("### Input Tables\n\n");
    section.push_str("| Role | Source | Rows Read | Rows Kept | Missing Cells |\n");
    section.push_str("|:---|:---|:---:|:---:|:---:|\n");
    for table in tables {
        section.push_str(&format!(
            "| {} | `{}` | {} | {} | {} |\n",
            table.role, table.source, table.rows_read, table.rows_kept, table.cells_missing
        ));
    }
    section.push('\n');

    section
}

/// Scalar metrics of several datasets, one row each, with their share of the
/// combined total.
fn generate_totals_table(
    datasets: &[(&DatasetAnalysis, f64)],
    options: &ReportOptions,
) -> String {
    let mut table = String::new();

    table.push_str("| Dataset | Total | Share | Mean | Max | Min |\n");
    table.push_str("|:---|---:|---:|---:|---:|---:|\n");
    for (dataset, share) in datasets {
        let m = &dataset.metrics;
        table.push_str(&format!(
            "| {} | {} | {}% | {} | {} | {} |\n",
            dataset.name,
            options.num(m.total),
            options.num(*share),
            options.opt(m.mean),
            options.opt(m.max),
            options.opt(m.min)
        ));
    }
    table.push('\n');

    table
}

fn generate_ranked_table(title: &str, header: &str, rows: &[LabelValue], options: &ReportOptions) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let mut table = String::new();

    table.push_str(&format!("#### {}\n\n", title));
    table.push_str(&format!("| # | Region | {} |\n", header));
    table.push_str("|:---:|:---|---:|\n");
    for (i, row) in rows.iter().enumerate() {
        table.push_str(&format!(
            "| {} | {} | {} |\n",
            i + 1,
            row.label,
            options.num(row.value)
        ));
    }
    table.push('\n');

    table
}

fn generate_granularity_section(result: &GranularityComparison, options: &ReportOptions) -> String {
    let mut section = String::new();

    section.push_str("### Totals\n\n");
    section.push_str(&generate_totals_table(
        &[
            (&result.coarse, result.composition.first.percentage),
            (&result.fine, result.composition.second.percentage),
        ],
        options,
    ));

    for dataset in [&result.coarse, &result.fine] {
        section.push_str(&generate_ranked_table(
            &format!("Largest Rows: {}", dataset.name),
            "Total",
            &top_rows(&dataset.metrics, options.top_n),
            options,
        ));
    }

    section
}

fn generate_origin_section(result: &OriginSplit, options: &ReportOptions) -> String {
    let mut section = String::new();
    let composition = &result.comparison.composition;

    section.push_str("### Totals\n\n");
    section.push_str(&generate_totals_table(
        &[
            (&result.domestic, composition.first.percentage),
            (&result.foreign, composition.second.percentage),
        ],
        options,
    ));
    section.push_str(&format!(
        "**{} per {}:** {}\n\n",
        result.foreign.name,
        result.domestic.name,
        options.opt(result.comparison.ratio)
    ));

    for dataset in [&result.domestic, &result.foreign] {
        match &dataset.ranking {
            Some(ranking) => section.push_str(&generate_ranked_table(
                &format!("Top Regions: {}", dataset.name),
                "Total",
                &ranking.top,
                options,
            )),
            None => section.push_str(&generate_ranked_table(
                &format!("Largest Rows: {}", dataset.name),
                "Total",
                &top_rows(&dataset.metrics, options.top_n),
                options,
            )),
        }

        if let Some(seasonal) = &dataset.seasonality {
            section.push_str(&format!(
                "- **{} peak period:** {}\n- **{} low period:** {}\n\n",
                dataset.name,
                seasonal.peak_period.as_deref().unwrap_or("n/a"),
                dataset.name,
                seasonal.low_period.as_deref().unwrap_or("n/a")
            ));
        }
    }

    section
}

fn generate_intensity_section(result: &PopulationIntensity, options: &ReportOptions) -> String {
    let mut section = String::new();

    for granularity in [&result.coarse, &result.fine] {
        section.push_str(&generate_granularity_intensity(granularity, options));
    }

    section
}

fn generate_granularity_intensity(result: &GranularityIntensity, options: &ReportOptions) -> String {
    let mut section = String::new();
    let insights = &result.insights;

    let describe = |entry: &Option<LabelValue>| match entry {
        Some(e) => format!("{} ({})", e.label, options.num(e.value)),
        None => "n/a".to_string(),
    };

    section.push_str(&format!("### {}\n\n", result.name));
    section.push_str(&format!(
        "- **Highest intensity:** {}\n",
        describe(&insights.highest_intensity)
    ));
    section.push_str(&format!(
        "- **Lowest intensity:** {}\n",
        describe(&insights.lowest_intensity)
    ));
    section.push_str(&format!(
        "- **Peak period:** {}\n",
        insights.peak_period.as_deref().unwrap_or("n/a")
    ));
    section.push_str(&format!(
        "- **Low period:** {}\n",
        insights.low_period.as_deref().unwrap_or("n/a")
    ));
    section.push_str(&format!(
        "- **Seasonality index:** {}\n\n",
        options.opt(insights.seasonality_index)
    ));

    if !result.intensity.entries.is_empty() {
        section.push_str("| Region | Accommodation | Population | Per Capita |\n");
        section.push_str("|:---|---:|---:|---:|\n");
        for entry in &result.intensity.entries {
            section.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                entry.label,
                options.num(entry.accommodation_total),
                options.opt(entry.population),
                options.num(entry.rate)
            ));
        }
        section.push('\n');
    }

    section
}

fn generate_charts_section(charts: &[Chart]) -> String {
    let mut section = String::new();

    section.push_str("### Chart Series\n\n");
    for chart in charts {
        let traces: Vec<String> = chart
            .traces
            .iter()
            .map(|t| format!("{} ({} points)", t.name, t.x.len()))
            .collect();
        section.push_str(&format!("- `{}`: {}\n", chart.name, traces.join(", ")));
    }
    section.push('\n');

    section
}

fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Report generated by accomstat v{}*\n",
        env!("CARGO_PKG_VERSION")
    ));

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write rendered report content to a file.
pub fn write_report(content: &str, path: &Path) -> Result<()> {
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write report to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::recipes::{run_recipes, AnalysisOptions, Recipe};
    use crate::ingest::source::TableRole;
    use crate::models::{RawCell, RawTable};
    use chrono::Utc;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn table(name: &str, columns: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable::new(
            name,
            columns.iter().map(|c| c.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| RawCell::from(*c)).collect())
                .collect(),
        )
        .unwrap()
    }

    fn create_test_report() -> Report {
        let months = &["Region", "Jan", "Feb"];
        let pop = &["Region", "2023"];
        let source = HashMap::from([
            (TableRole::Coarse, table("c.csv", months, &[&["North", "10", "20"], &["South", "4", ":"]])),
            (TableRole::Fine, table("f.csv", months, &[&["N1", "3", "7"]])),
            (TableRole::CoarseDomestic, table("cd.csv", months, &[&["North", "1", "1"]])),
            (TableRole::CoarseForeign, table("cf.csv", months, &[&["North", "3", "3"]])),
            (TableRole::FineDomestic, table("fd.csv", months, &[&["N1", "2", "2"]])),
            (TableRole::FineForeign, table("ff.csv", months, &[&["N1", "1", "1"]])),
            (TableRole::CoarsePopulation, table("cp.csv", pop, &[&["North", "30"], &["South", "4"]])),
            (TableRole::FinePopulation, table("fp.csv", pop, &[&["N1", "5"]])),
        ]);

        let outcomes = run_recipes(&Recipe::ALL, &source, &AnalysisOptions::default()).unwrap();

        Report {
            metadata: ReportMetadata {
                analysis_date: Utc::now(),
                data_dir: "data".to_string(),
                missing_token: ":".to_string(),
                recipes: Recipe::ALL.iter().map(|r| r.to_string()).collect(),
                duration_seconds: 0.5,
            },
            outcomes,
        }
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = create_test_report();
        let markdown = generate_markdown_report(&report, &ReportOptions::default());

        assert!(markdown.contains("# Accommodation Statistics Report"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("## Coarse vs. Fine Regions"));
        assert!(markdown.contains("## Domestic vs. Foreign (Fine Regions)"));
        assert!(markdown.contains("## Population and Accommodation Intensity"));
        assert!(markdown.contains("| Foreign | 6.00 | 75.00% |"));
        assert!(markdown.contains("**Foreign per Domestic:** 3.00"));
        assert!(markdown.contains("#### Top Regions: Domestic"));
        assert!(markdown.contains("- **Highest intensity:** N1 (2.00)"));
        assert!(markdown.contains("- `monthly_trend`: NUTS1 (2 points), NUTS2 (2 points)"));
        assert!(markdown.contains("*Report generated by accomstat"));
    }

    #[test]
    fn test_markdown_options() {
        let report = create_test_report();
        let options = ReportOptions {
            include_charts: false,
            decimals: 0,
            top_n: 1,
        };
        let markdown = generate_markdown_report(&report, &options);

        assert!(!markdown.contains("### Chart Series"));
        assert!(markdown.contains("| NUTS1 | 34 |"));
        assert!(markdown.contains("| 1 | North | 30 |"));
        assert!(!markdown.contains("| 2 | South |"));
    }

    #[test]
    fn test_anchor() {
        assert_eq!(
            anchor("Domestic vs. Foreign (Coarse Regions)"),
            "domestic-vs-foreign-coarse-regions"
        );
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report();
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"analysis_date\""));
        assert!(json.contains("\"outcomes\""));
        assert!(json.contains("\"kind\": \"population_intensity\""));
        assert!(json.contains("\"visitor_distribution\""));
    }

    #[test]
    fn test_write_report() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.md");

        write_report("# hi\n", &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# hi\n");

        assert!(write_report("x", &dir.path().join("missing").join("r.md")).is_err());
    }
}
