//! Analysis modules.
//!
//! The building blocks (normalization, aggregation, grouping, comparison,
//! intensity and seasonality) are pure functions over cleaned tables.
//! [`recipes`] composes them into the four fixed analyses.

pub mod aggregator;
pub mod compare;
pub mod grouping;
pub mod intensity;
pub mod normalize;
pub mod recipes;
pub mod seasonality;

pub use aggregator::{aggregate, top_rows, AggregateMetrics};
pub use compare::{compare, compare_totals, ComparativeResult, Composition, Share};
pub use grouping::{group_and_rank, group_by_label, RegionalRanking};
pub use intensity::{intensity, row_totals, IntensityResult, JoinStrategy, PopulationReference};
pub use normalize::{normalize, normalize_with_stats, NormalizeStats};
pub use recipes::{run_recipe, run_recipes, AnalysisOptions, Recipe, RecipeOutcome, RecipeResult};
pub use seasonality::{seasonality, SeasonalityResult};
