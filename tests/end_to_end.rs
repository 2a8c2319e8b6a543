//! Runs every recipe over the CSV fixtures in `fixtures/data`.

use accomstat::analysis::intensity::JoinStrategy;
use accomstat::analysis::recipes::{
    run_recipe, run_recipes, AnalysisOptions, Recipe, RecipeOutcome, RecipeResult,
};
use accomstat::config::Config;
use accomstat::ingest::{CsvOptions, CsvTableSource, TableRole};
use accomstat::models::{LabelValue, Report, ReportMetadata};
use accomstat::report::{generate_json_report, generate_markdown_report, ReportOptions};
use accomstat::AnalysisError;
use chrono::Utc;
use std::path::PathBuf;
use tempfile::TempDir;

fn fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures").join("data")
}

fn source_at(dir: PathBuf) -> CsvTableSource {
    let files = Config::default().table_files().unwrap();
    CsvTableSource::new(dir, files, CsvOptions::default())
}

fn run(recipe: Recipe, options: &AnalysisOptions) -> RecipeOutcome {
    run_recipe(recipe, &source_at(fixtures()), options).unwrap()
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn granularity_comparison_over_fixtures() {
    let outcome = run(Recipe::GranularityComparison, &AnalysisOptions::default());

    let RecipeResult::GranularityComparison(result) = &outcome.result else {
        panic!("unexpected result kind");
    };

    assert_eq!(result.coarse.metrics.total, 10344.0);
    assert_eq!(result.coarse.metrics.value_count, 34);
    assert_eq!(result.fine.metrics.total, 10530.0);
    assert_eq!(result.composition.total_combined, 20874.0);
    assert_close(
        result.composition.first.percentage + result.composition.second.percentage,
        100.0,
    );

    // Extra-Regio row is entirely missing
    let coarse_table = &outcome.tables[0];
    assert_eq!(coarse_table.role, "coarse");
    assert_eq!(coarse_table.source, "nuts_1_2023.csv");
    assert_eq!(coarse_table.rows_read, 4);
    assert_eq!(coarse_table.rows_kept, 3);
    assert_eq!(coarse_table.cells_missing, 14);
}

#[test]
fn coarse_origin_split_over_fixtures() {
    let outcome = run(Recipe::CoarseOriginSplit, &AnalysisOptions::default());

    let RecipeResult::OriginSplit(result) = &outcome.result else {
        panic!("unexpected result kind");
    };

    assert!(!result.grouped);
    assert_eq!(result.domestic.metrics.total, 4770.0);
    assert_eq!(result.foreign.metrics.total, 5670.0);
    assert_close(result.comparison.ratio.unwrap(), 5670.0 / 4770.0);
    assert_close(
        result.comparison.composition.first.percentage,
        100.0 * 4770.0 / 10440.0,
    );
}

#[test]
fn fine_origin_split_ranks_regions() {
    let options = AnalysisOptions {
        top_n: 2,
        ..Default::default()
    };
    let outcome = run(Recipe::FineOriginSplit, &options);

    let RecipeResult::OriginSplit(result) = &outcome.result else {
        panic!("unexpected result kind");
    };

    let domestic = result.domestic.ranking.as_ref().unwrap();
    assert_eq!(
        domestic.top,
        vec![
            LabelValue::new("TR10 Istanbul", 1600.0),
            LabelValue::new("TR31 Izmir", 1440.0)
        ]
    );
    let ranked_total: f64 = domestic.totals.iter().map(|t| t.value).sum();
    assert_eq!(ranked_total, result.domestic.metrics.total);

    let foreign = result.foreign.ranking.as_ref().unwrap();
    assert_eq!(foreign.top[1], LabelValue::new("TR32 Aydin", 1600.0));

    let seasonal = result.foreign.seasonality.as_ref().unwrap();
    assert_eq!(seasonal.peak_period.as_deref(), Some("2023-07"));
    assert_eq!(seasonal.low_period.as_deref(), Some("2023-01"));
}

#[test]
fn population_intensity_over_fixtures() {
    let outcome = run(Recipe::PopulationIntensity, &AnalysisOptions::default());

    let RecipeResult::PopulationIntensity(result) = &outcome.result else {
        panic!("unexpected result kind");
    };

    let coarse = &result.coarse.insights;
    assert_eq!(coarse.highest_intensity.as_ref().unwrap().label, "TR3 Aegean");
    assert_eq!(coarse.lowest_intensity.as_ref().unwrap().label, "TR2 West Marmara");
    assert_eq!(coarse.peak_period.as_deref(), Some("2023-07"));
    assert_eq!(coarse.low_period.as_deref(), Some("2023-12"));
    assert!(coarse.seasonality_index.unwrap() > 0.0);

    let fine = &result.fine.insights;
    assert_eq!(fine.highest_intensity.as_ref().unwrap().label, "TR32 Aydin");
    assert_eq!(fine.lowest_intensity.as_ref().unwrap().label, "TR22 Balikesir");
    assert_eq!(fine.low_period.as_deref(), Some("2023-01"));

    assert_close(
        result.coarse.intensity.entries[0].rate,
        4800.0 / 15655924.0,
    );
}

#[test]
fn positional_join_matches_ordered_fixtures() {
    let by_label = run(Recipe::PopulationIntensity, &AnalysisOptions::default());
    let by_position = run(
        Recipe::PopulationIntensity,
        &AnalysisOptions {
            join: JoinStrategy::Position,
            ..Default::default()
        },
    );

    assert_eq!(by_label.result, by_position.result);
}

#[test]
fn all_recipes_share_cached_tables() {
    let source = source_at(fixtures());
    let outcomes = run_recipes(&Recipe::ALL, &source, &AnalysisOptions::default()).unwrap();

    assert_eq!(outcomes.len(), 4);
    // coarse and fine accommodation tables are reused by the intensity recipe
    let stats = source.cache().stats();
    assert_eq!(stats.misses, 8);
    assert_eq!(stats.hits, 2);
}

#[test]
fn missing_table_is_source_unavailable() {
    let dir = TempDir::new().unwrap();
    std::fs::copy(
        fixtures().join("nuts_1_2023.csv"),
        dir.path().join("nuts_1_2023.csv"),
    )
    .unwrap();

    let err = run_recipe(
        Recipe::GranularityComparison,
        &source_at(dir.path().to_path_buf()),
        &AnalysisOptions::default(),
    )
    .unwrap_err();

    assert!(matches!(err, AnalysisError::SourceUnavailable { .. }));
    assert!(err.to_string().contains("nuts_2_2023.csv"));
}

#[test]
fn ragged_table_is_source_unavailable() {
    let dir = TempDir::new().unwrap();
    for role in [TableRole::CoarseDomestic, TableRole::CoarseForeign] {
        std::fs::copy(
            fixtures().join(role.default_file()),
            dir.path().join(role.default_file()),
        )
        .unwrap();
    }
    std::fs::write(
        dir.path().join(TableRole::CoarseForeign.default_file()),
        "GEO (Labels),2023-01,2023-02\nTR1 Istanbul,1\n",
    )
    .unwrap();

    let err = run_recipe(
        Recipe::CoarseOriginSplit,
        &source_at(dir.path().to_path_buf()),
        &AnalysisOptions::default(),
    )
    .unwrap_err();

    assert!(matches!(err, AnalysisError::SourceUnavailable { .. }));
}

#[test]
fn mismatched_origin_tables_fail() {
    let dir = TempDir::new().unwrap();
    std::fs::copy(
        fixtures().join("nuts_2_2023_domestic.csv"),
        dir.path().join("nuts_2_2023_domestic.csv"),
    )
    .unwrap();
    std::fs::copy(
        fixtures().join("nuts_1_2023_foreigner.csv"),
        dir.path().join("nuts_2_2023_foreigner.csv"),
    )
    .unwrap();

    let err = run_recipe(
        Recipe::FineOriginSplit,
        &source_at(dir.path().to_path_buf()),
        &AnalysisOptions::default(),
    )
    .unwrap_err();

    assert!(matches!(err, AnalysisError::ShapeMismatch { .. }));
}

#[test]
fn reports_render_from_fixture_run() {
    let outcomes = run_recipes(
        &Recipe::ALL,
        &source_at(fixtures()),
        &AnalysisOptions::default(),
    )
    .unwrap();

    let report = Report {
        metadata: ReportMetadata {
            analysis_date: Utc::now(),
            data_dir: fixtures().display().to_string(),
            missing_token: ":".to_string(),
            recipes: Recipe::ALL.iter().map(|r| r.to_string()).collect(),
            duration_seconds: 0.0,
        },
        outcomes,
    };

    let markdown = generate_markdown_report(&report, &ReportOptions::default());
    assert!(markdown.contains("| 1 | TR10 Istanbul | 1600.00 |"));
    assert!(markdown.contains("- **Highest intensity:** TR3 Aegean"));

    let json = generate_json_report(&report).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["outcomes"].as_array().unwrap().len(), 4);
    assert_eq!(value["outcomes"][1]["result"]["domestic"]["metrics"]["total"], 4770.0);
}
