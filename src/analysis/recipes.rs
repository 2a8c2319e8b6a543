//! Analysis recipes.
//!
//! A recipe is a fixed composition of normalization, aggregation, grouping,
//! comparison, intensity and seasonality over tables pulled from a
//! [`TableSource`]. Every run builds fresh values and mutates nothing, so
//! recipes can run concurrently against a shared source.

use crate::analysis::aggregator::{aggregate, AggregateMetrics};
use crate::analysis::compare::{compare, ComparativeResult, Composition};
use crate::analysis::grouping::{group_and_rank, group_by_label, RegionalRanking};
use crate::analysis::intensity::{
    intensity, row_totals, IntensityResult, JoinStrategy, PopulationReference,
};
use crate::analysis::normalize::normalize_with_stats;
use crate::analysis::seasonality::{seasonality, SeasonalityResult};
use crate::error::{AnalysisError, AnalysisResult};
use crate::ingest::source::{TableRole, TableSource};
use crate::models::{
    Axis, Chart, CleanedTable, Granularity, LabelValue, PeriodValue, RawTable, TableSummary,
    Trace,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// The four fixed analyses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recipe {
    /// Coarse vs. fine granularity of the same metric.
    GranularityComparison,
    /// Domestic vs. foreign at coarse granularity.
    CoarseOriginSplit,
    /// Domestic vs. foreign at fine granularity, with regional rankings.
    FineOriginSplit,
    /// Accommodation per capita and seasonality at both granularities.
    PopulationIntensity,
}

impl Recipe {
    pub const ALL: [Recipe; 4] = [
        Recipe::GranularityComparison,
        Recipe::CoarseOriginSplit,
        Recipe::FineOriginSplit,
        Recipe::PopulationIntensity,
    ];

    /// Tables the recipe loads.
    pub fn required_tables(&self) -> &'static [TableRole] {
        match self {
            Recipe::GranularityComparison => &[TableRole::Coarse, TableRole::Fine],
            Recipe::CoarseOriginSplit => &[TableRole::CoarseDomestic, TableRole::CoarseForeign],
            Recipe::FineOriginSplit => &[TableRole::FineDomestic, TableRole::FineForeign],
            Recipe::PopulationIntensity => &[
                TableRole::Coarse,
                TableRole::CoarsePopulation,
                TableRole::Fine,
                TableRole::FinePopulation,
            ],
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Recipe::GranularityComparison => "Coarse vs. Fine Regions",
            Recipe::CoarseOriginSplit => "Domestic vs. Foreign (Coarse Regions)",
            Recipe::FineOriginSplit => "Domestic vs. Foreign (Fine Regions)",
            Recipe::PopulationIntensity => "Population and Accommodation Intensity",
        }
    }
}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recipe::GranularityComparison => write!(f, "granularity_comparison"),
            Recipe::CoarseOriginSplit => write!(f, "coarse_origin_split"),
            Recipe::FineOriginSplit => write!(f, "fine_origin_split"),
            Recipe::PopulationIntensity => write!(f, "population_intensity"),
        }
    }
}

/// Parameters shared by all recipes.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOptions {
    pub missing_token: String,
    pub label_is_first_column: bool,
    /// Regions kept in each ranking.
    pub top_n: usize,
    pub join: JoinStrategy,
    pub coarse_name: String,
    pub fine_name: String,
    pub domestic_name: String,
    pub foreign_name: String,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            missing_token: ":".to_string(),
            label_is_first_column: true,
            top_n: 5,
            join: JoinStrategy::Label,
            coarse_name: "NUTS1".to_string(),
            fine_name: "NUTS2".to_string(),
            domestic_name: "Domestic".to_string(),
            foreign_name: "Foreign".to_string(),
        }
    }
}

impl AnalysisOptions {
    fn granularity_name(&self, granularity: Granularity) -> &str {
        match granularity {
            Granularity::Coarse => &self.coarse_name,
            Granularity::Fine => &self.fine_name,
        }
    }
}

/// Aggregates of one table, plus ranking and seasonality when requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetAnalysis {
    pub name: String,
    pub metrics: AggregateMetrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ranking: Option<RegionalRanking>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seasonality: Option<SeasonalityResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GranularityComparison {
    pub coarse: DatasetAnalysis,
    pub fine: DatasetAnalysis,
    pub composition: Composition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OriginSplit {
    pub granularity: Granularity,
    pub grouped: bool,
    pub domestic: DatasetAnalysis,
    pub foreign: DatasetAnalysis,
    pub comparison: ComparativeResult,
}

/// Headline figures of an intensity analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntensityInsights {
    pub highest_intensity: Option<LabelValue>,
    pub lowest_intensity: Option<LabelValue>,
    pub seasonality_index: Option<f64>,
    pub peak_period: Option<String>,
    pub low_period: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GranularityIntensity {
    pub granularity: Granularity,
    pub name: String,
    pub intensity: IntensityResult,
    pub seasonality: SeasonalityResult,
    pub insights: IntensityInsights,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationIntensity {
    pub coarse: GranularityIntensity,
    pub fine: GranularityIntensity,
}

/// Structured result of one recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecipeResult {
    GranularityComparison(GranularityComparison),
    OriginSplit(OriginSplit),
    PopulationIntensity(PopulationIntensity),
}

/// Everything a presentation layer needs from one recipe run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeOutcome {
    pub recipe: Recipe,
    pub result: RecipeResult,
    pub charts: Vec<Chart>,
    pub tables: Vec<TableSummary>,
}

impl RecipeOutcome {
    pub fn chart(&self, name: &str) -> Option<&Chart> {
        self.charts.iter().find(|c| c.name == name)
    }
}

/// Run one recipe.
pub fn run_recipe(
    recipe: Recipe,
    source: &dyn TableSource,
    options: &AnalysisOptions,
) -> AnalysisResult<RecipeOutcome> {
    info!("Running recipe: {}", recipe);

    let mut run = RecipeRun {
        source,
        options,
        tables: Vec::new(),
    };

    let (result, charts) = match recipe {
        Recipe::GranularityComparison => run.granularity_comparison()?,
        Recipe::CoarseOriginSplit => run.origin_split(Granularity::Coarse, false)?,
        Recipe::FineOriginSplit => run.origin_split(Granularity::Fine, true)?,
        Recipe::PopulationIntensity => run.population_intensity()?,
    };

    info!(
        "Recipe {} complete ({} tables, {} charts)",
        recipe,
        run.tables.len(),
        charts.len()
    );

    Ok(RecipeOutcome {
        recipe,
        result,
        charts,
        tables: run.tables,
    })
}

/// Run several recipes in order, stopping at the first failure.
pub fn run_recipes(
    recipes: &[Recipe],
    source: &dyn TableSource,
    options: &AnalysisOptions,
) -> AnalysisResult<Vec<RecipeOutcome>> {
    recipes
        .iter()
        .map(|r| run_recipe(*r, source, options))
        .collect()
}

/// State of one recipe invocation.
struct RecipeRun<'a> {
    source: &'a dyn TableSource,
    options: &'a AnalysisOptions,
    tables: Vec<TableSummary>,
}

impl RecipeRun<'_> {
    /// Load and normalize the table for a role.
    fn prepare(&mut self, role: TableRole) -> AnalysisResult<(Arc<RawTable>, CleanedTable)> {
        let raw = self.source.load(role)?;
        let (cleaned, stats) = normalize_with_stats(
            &raw,
            &self.options.missing_token,
            self.options.label_is_first_column,
        );

        self.tables.push(TableSummary {
            role: role.key().to_string(),
            source: raw.name().to_string(),
            rows_read: stats.rows_read,
            rows_kept: stats.rows_kept,
            cells_missing: stats.cells_missing,
        });

        Ok((raw, cleaned))
    }

    fn dataset(&self, name: &str, table: &CleanedTable, grouped: bool) -> DatasetAnalysis {
        let metrics = aggregate(table);
        let (ranking, seasonal) = if grouped {
            (
                Some(group_and_rank(table, self.options.top_n)),
                Some(seasonality(&metrics.period_totals)),
            )
        } else {
            (None, None)
        };

        DatasetAnalysis {
            name: name.to_string(),
            metrics,
            ranking,
            seasonality: seasonal,
        }
    }

    fn granularity_comparison(&mut self) -> AnalysisResult<(RecipeResult, Vec<Chart>)> {
        let (_, coarse_table) = self.prepare(TableRole::Coarse)?;
        let (_, fine_table) = self.prepare(TableRole::Fine)?;

        let coarse = self.dataset(&self.options.coarse_name, &coarse_table, false);
        let fine = self.dataset(&self.options.fine_name, &fine_table, false);
        let composition = compare(&coarse.metrics, &fine.metrics, &coarse.name, &fine.name)
            .composition;

        let charts = vec![
            Chart::new(
                "monthly_trend",
                vec![
                    period_trace(&coarse.name, &coarse.metrics.period_means),
                    period_trace(&fine.name, &fine.metrics.period_means),
                ],
            ),
            Chart::new(
                "regional_comparison",
                vec![
                    label_trace(&coarse.name, &group_by_label(&coarse_table)),
                    label_trace(&fine.name, &group_by_label(&fine_table)),
                ],
            ),
        ];

        let result = RecipeResult::GranularityComparison(GranularityComparison {
            coarse,
            fine,
            composition,
        });
        Ok((result, charts))
    }

    fn origin_split(
        &mut self,
        granularity: Granularity,
        grouped: bool,
    ) -> AnalysisResult<(RecipeResult, Vec<Chart>)> {
        let (domestic_role, foreign_role) = TableRole::origin_pair(granularity);
        let (domestic_raw, domestic_table) = self.prepare(domestic_role)?;
        let (foreign_raw, foreign_table) = self.prepare(foreign_role)?;

        ensure_same_shape(
            &domestic_raw,
            &foreign_raw,
            usize::from(self.options.label_is_first_column),
        )?;

        let domestic = self.dataset(&self.options.domestic_name, &domestic_table, grouped);
        let foreign = self.dataset(&self.options.foreign_name, &foreign_table, grouped);
        let comparison = compare(&domestic.metrics, &foreign.metrics, &domestic.name, &foreign.name);

        let regional = |d: &DatasetAnalysis| match &d.ranking {
            Some(ranking) => label_trace(&d.name, &ranking.totals),
            None => label_trace(&d.name, &d.metrics.label_totals),
        };

        let charts = vec![
            Chart::new(
                "monthly_comparison",
                vec![
                    period_trace(&domestic.name, &domestic.metrics.period_means),
                    period_trace(&foreign.name, &foreign.metrics.period_means),
                ],
            ),
            Chart::new("regional_distribution", vec![regional(&domestic), regional(&foreign)]),
            Chart::new(
                "visitor_distribution",
                vec![Trace {
                    name: format!("{} vs. {}", domestic.name, foreign.name),
                    x: Axis::Categories(vec![domestic.name.clone(), foreign.name.clone()]),
                    y: vec![Some(domestic.metrics.total), Some(foreign.metrics.total)],
                    text: None,
                }],
            ),
        ];

        let result = RecipeResult::OriginSplit(OriginSplit {
            granularity,
            grouped,
            domestic,
            foreign,
            comparison,
        });
        Ok((result, charts))
    }

    fn population_intensity(&mut self) -> AnalysisResult<(RecipeResult, Vec<Chart>)> {
        let coarse = self.granularity_intensity(Granularity::Coarse)?;
        let fine = self.granularity_intensity(Granularity::Fine)?;

        let charts = vec![
            Chart::new(
                "intensity_map",
                vec![label_trace(&coarse.name, &coarse.intensity.rates())],
            ),
            Chart::new(
                "seasonal_pattern",
                vec![period_trace(&coarse.name, &coarse.seasonality.period_totals)],
            ),
            Chart::new(
                "population_accommodation",
                vec![Trace {
                    name: coarse.name.clone(),
                    x: Axis::Values(coarse.intensity.entries.iter().map(|e| e.population).collect()),
                    y: coarse
                        .intensity
                        .entries
                        .iter()
                        .map(|e| Some(e.accommodation_total))
                        .collect(),
                    text: Some(coarse.intensity.entries.iter().map(|e| e.label.clone()).collect()),
                }],
            ),
        ];

        let result = RecipeResult::PopulationIntensity(PopulationIntensity { coarse, fine });
        Ok((result, charts))
    }

    fn granularity_intensity(
        &mut self,
        granularity: Granularity,
    ) -> AnalysisResult<GranularityIntensity> {
        let (_, accommodation) = self.prepare(TableRole::accommodation(granularity))?;

        let population_role = TableRole::population(granularity);
        let population_raw = self.source.load(population_role)?;
        let population = PopulationReference::from_raw(
            &population_raw,
            &self.options.missing_token,
            self.options.label_is_first_column,
        )?;

        let missing = population
            .entries()
            .iter()
            .filter(|e| e.population.is_none())
            .count();
        self.tables.push(TableSummary {
            role: population_role.key().to_string(),
            source: population_raw.name().to_string(),
            rows_read: population_raw.row_count(),
            rows_kept: population_raw.row_count(),
            cells_missing: missing,
        });

        let intensity = intensity(&row_totals(&accommodation), &population, self.options.join)?;
        let seasonal = seasonality(&aggregate(&accommodation).period_totals);

        let insights = IntensityInsights {
            highest_intensity: intensity
                .highest()
                .map(|e| LabelValue::new(e.label.clone(), e.rate)),
            lowest_intensity: intensity
                .lowest()
                .map(|e| LabelValue::new(e.label.clone(), e.rate)),
            seasonality_index: seasonal.dispersion_index,
            peak_period: seasonal.peak_period.clone(),
            low_period: seasonal.low_period.clone(),
        };

        Ok(GranularityIntensity {
            granularity,
            name: self.options.granularity_name(granularity).to_string(),
            intensity,
            seasonality: seasonal,
            insights,
        })
    }
}

/// Require two tables to have the same period columns and row count.
/// The first `skip` columns (the label column) are not compared.
pub fn ensure_same_shape(left: &RawTable, right: &RawTable, skip: usize) -> AnalysisResult<()> {
    let left_periods = left.columns().get(skip..).unwrap_or_default();
    let right_periods = right.columns().get(skip..).unwrap_or_default();

    if left_periods != right_periods {
        return Err(AnalysisError::shape_mismatch(
            left.name(),
            right.name(),
            format!(
                "period columns differ ({} vs {})",
                left_periods.join(", "),
                right_periods.join(", ")
            ),
        ));
    }

    if left.row_count() != right.row_count() {
        return Err(AnalysisError::shape_mismatch(
            left.name(),
            right.name(),
            format!("{} rows vs {} rows", left.row_count(), right.row_count()),
        ));
    }

    Ok(())
}

fn period_trace(name: &str, values: &[PeriodValue]) -> Trace {
    Trace {
        name: name.to_string(),
        x: Axis::Categories(values.iter().map(|v| v.period.clone()).collect()),
        y: values.iter().map(|v| v.value).collect(),
        text: None,
    }
}

fn label_trace(name: &str, values: &[LabelValue]) -> Trace {
    Trace {
        name: name.to_string(),
        x: Axis::Categories(values.iter().map(|v| v.label.clone()).collect()),
        y: values.iter().map(|v| Some(v.value)).collect(),
        text: None,
    }
}
