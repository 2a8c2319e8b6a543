//! Two-table composition comparison.
//!
//! Given two aggregated tables (domestic vs. foreign, or two
//! granularities), computes each side's share of the combined total and the
//! ratio between them. Zero denominators resolve to defined fallbacks:
//! percentages become 0 and the ratio becomes missing.

use crate::analysis::aggregator::AggregateMetrics;
use serde::{Deserialize, Serialize};

/// One side of a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Share {
    pub name: String,
    pub total: f64,
    /// Percentage of the combined total (0 when the combined total is 0).
    pub percentage: f64,
}

/// Percentage split of two totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Composition {
    pub first: Share,
    pub second: Share,
    pub total_combined: f64,
}

/// Composition plus the ratio of the second total to the first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparativeResult {
    #[serde(flatten)]
    pub composition: Composition,
    /// `second.total / first.total`; missing when the first total is 0.
    pub ratio: Option<f64>,
}

/// Compare two aggregated tables by grand total.
pub fn compare(
    a: &AggregateMetrics,
    b: &AggregateMetrics,
    name_a: &str,
    name_b: &str,
) -> ComparativeResult {
    compare_totals(a.total, b.total, name_a, name_b)
}

/// Compare two raw totals.
pub fn compare_totals(total_a: f64, total_b: f64, name_a: &str, name_b: &str) -> ComparativeResult {
    let total_combined = total_a + total_b;

    let percentage = |total: f64| {
        if total_combined == 0.0 {
            0.0
        } else {
            100.0 * total / total_combined
        }
    };

    let ratio = (total_a != 0.0).then(|| total_b / total_a);

    ComparativeResult {
        composition: Composition {
            first: Share {
                name: name_a.to_string(),
                total: total_a,
                percentage: percentage(total_a),
            },
            second: Share {
                name: name_b.to_string(),
                total: total_b,
                percentage: percentage(total_b),
            },
            total_combined,
        },
        ratio,
    }
}
