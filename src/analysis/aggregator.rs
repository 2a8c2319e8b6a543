//! Single-table aggregation.
//!
//! This module computes the scalar and per-column/per-row summaries of one
//! cleaned table. Missing cells are excluded from every statistic rather
//! than counted as zero.

use crate::models::{CleanedTable, LabelValue, PeriodValue};
use serde::{Deserialize, Serialize};

/// Summary statistics of one cleaned table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateMetrics {
    /// Source identity of the aggregated table.
    pub table: String,
    /// Sum of all non-missing cells.
    pub total: f64,
    /// Mean over all non-missing cells.
    pub mean: Option<f64>,
    /// Largest single cell.
    pub max: Option<f64>,
    /// Smallest single cell.
    pub min: Option<f64>,
    /// Number of non-missing cells.
    pub value_count: usize,
    /// One entry per row, in row order; duplicate labels are not merged.
    pub label_totals: Vec<LabelValue>,
    /// Column sums, in column order.
    pub period_totals: Vec<PeriodValue>,
    /// Column means, in column order.
    pub period_means: Vec<PeriodValue>,
}

/// Aggregate a cleaned table.
pub fn aggregate(table: &CleanedTable) -> AggregateMetrics {
    let mut total = 0.0;
    let mut value_count = 0usize;
    let mut max: Option<f64> = None;
    let mut min: Option<f64> = None;

    for value in table.values() {
        total += value;
        value_count += 1;
        max = Some(max.map_or(value, |m| m.max(value)));
        min = Some(min.map_or(value, |m| m.min(value)));
    }

    let mean = (value_count > 0).then(|| total / value_count as f64);

    let label_totals = table
        .rows()
        .iter()
        .map(|row| LabelValue::new(row.label.clone(), row.total()))
        .collect();

    let mut period_totals = Vec::with_capacity(table.periods().len());
    let mut period_means = Vec::with_capacity(table.periods().len());

    for (col, period) in table.periods().iter().enumerate() {
        let (sum, count) = column_sum(table, col);
        let column_total = (count > 0).then_some(sum);
        let column_mean = (count > 0).then(|| sum / count as f64);

        period_totals.push(PeriodValue::new(period.clone(), column_total));
        period_means.push(PeriodValue::new(period.clone(), column_mean));
    }

    AggregateMetrics {
        table: table.name().to_string(),
        total,
        mean,
        max,
        min,
        value_count,
        label_totals,
        period_totals,
        period_means,
    }
}

/// Sum and count of the non-missing cells in one column.
fn column_sum(table: &CleanedTable, col: usize) -> (f64, usize) {
    table
        .rows()
        .iter()
        .filter_map(|row| row.values.get(col).copied().flatten())
        .fold((0.0, 0), |(sum, count), v| (sum + v, count + 1))
}

/// Identify the rows with the largest totals.
pub fn top_rows(metrics: &AggregateMetrics, n: usize) -> Vec<LabelValue> {
    let mut rows = metrics.label_totals.clone();

    // Stable sort keeps source order among equal totals
    rows.sort_by(|a, b| {
        b.value
            .partial_cmp(&a.value)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    rows.truncate(n);
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::normalize::normalize;
    use crate::models::{RawCell, RawTable};

    fn cleaned(columns: &[&str], rows: &[&[&str]]) -> CleanedTable {
        let raw = RawTable::new(
            "test.csv",
            columns.iter().map(|c| c.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| RawCell::from(*c)).collect())
                .collect(),
        )
        .unwrap();
        normalize(&raw, ":", true)
    }

    #[test]
    fn test_aggregate_excludes_missing() {
        let table = cleaned(
            &["Region", "P1", "P2", "P3"],
            &[&["North", "10", ":", "20"], &["South", ":", ":", ":"]],
        );

        let metrics = aggregate(&table);

        assert_eq!(metrics.total, 30.0);
        assert_eq!(metrics.mean, Some(15.0));
        assert_eq!(metrics.max, Some(20.0));
        assert_eq!(metrics.min, Some(10.0));
        assert_eq!(metrics.value_count, 2);
        assert_eq!(
            metrics.period_totals,
            vec![
                PeriodValue::new("P1", Some(10.0)),
                PeriodValue::new("P2", None),
                PeriodValue::new("P3", Some(20.0)),
            ]
        );
        assert_eq!(metrics.label_totals, vec![LabelValue::new("North", 30.0)]);
    }

    #[test]
    fn test_aggregate_empty_table() {
        let table = cleaned(&["Region", "P1"], &[&["North", ":"]]);

        let metrics = aggregate(&table);

        assert_eq!(metrics.total, 0.0);
        assert_eq!(metrics.mean, None);
        assert_eq!(metrics.max, None);
        assert_eq!(metrics.min, None);
        assert!(metrics.label_totals.is_empty());
        assert_eq!(metrics.period_totals, vec![PeriodValue::new("P1", None)]);
    }

    #[test]
    fn test_duplicate_labels_stay_separate() {
        let table = cleaned(
            &["Region", "Jan", "Feb"],
            &[&["North", "1", "2"], &["North", "3", "4"]],
        );

        let metrics = aggregate(&table);

        assert_eq!(
            metrics.label_totals,
            vec![LabelValue::new("North", 3.0), LabelValue::new("North", 7.0)]
        );
    }

    #[test]
    fn test_period_means() {
        let table = cleaned(
            &["Region", "Jan", "Feb"],
            &[&["A", "2", ":"], &["B", "4", "9"]],
        );

        let metrics = aggregate(&table);

        assert_eq!(
            metrics.period_means,
            vec![PeriodValue::new("Jan", Some(3.0)), PeriodValue::new("Feb", Some(9.0))]
        );
        assert_eq!(
            metrics.period_totals,
            vec![PeriodValue::new("Jan", Some(6.0)), PeriodValue::new("Feb", Some(9.0))]
        );
    }

    #[test]
    fn test_negative_values_in_extrema() {
        let table = cleaned(&["Region", "Jan", "Feb"], &[&["A", "-5", "3"]]);

        let metrics = aggregate(&table);

        assert_eq!(metrics.min, Some(-5.0));
        assert_eq!(metrics.max, Some(3.0));
        assert_eq!(metrics.total, -2.0);
    }

    #[test]
    fn test_top_rows() {
        let table = cleaned(
            &["Region", "Jan"],
            &[&["A", "1"], &["B", "5"], &["C", "5"], &["D", "3"]],
        );

        let top = top_rows(&aggregate(&table), 3);

        let labels: Vec<_> = top.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, vec!["B", "C", "D"]);
    }
}
