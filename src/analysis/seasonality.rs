//! Seasonality of per-period totals.

use crate::models::PeriodValue;
use serde::{Deserialize, Serialize};

/// Peak/low periods and dispersion of a per-period series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalityResult {
    pub peak_period: Option<String>,
    pub low_period: Option<String>,
    /// Population standard deviation over mean; missing when the mean is 0.
    pub dispersion_index: Option<f64>,
    pub period_totals: Vec<PeriodValue>,
}

/// Compute seasonality over per-period totals.
///
/// Missing periods are skipped. Peak and low ties resolve to the earliest
/// period in column order.
pub fn seasonality(period_totals: &[PeriodValue]) -> SeasonalityResult {
    let present: Vec<(&str, f64)> = period_totals
        .iter()
        .filter_map(|p| p.value.map(|v| (p.period.as_str(), v)))
        .collect();

    let mut peak: Option<(&str, f64)> = None;
    let mut low: Option<(&str, f64)> = None;
    for &(period, value) in &present {
        if peak.is_none_or(|(_, best)| value > best) {
            peak = Some((period, value));
        }
        if low.is_none_or(|(_, best)| value < best) {
            low = Some((period, value));
        }
    }

    let values: Vec<f64> = present.iter().map(|(_, v)| *v).collect();

    SeasonalityResult {
        peak_period: peak.map(|(p, _)| p.to_string()),
        low_period: low.map(|(p, _)| p.to_string()),
        dispersion_index: dispersion_index(&values),
        period_totals: period_totals.to_vec(),
    }
}

/// Coefficient of variation using the population standard deviation.
pub fn dispersion_index(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if mean == 0.0 {
        return None;
    }

    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Some(variance.sqrt() / mean)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::aggregator::aggregate;
    use crate::analysis::normalize::normalize;
    use crate::models::{RawCell, RawTable};

    fn series(values: &[(&str, Option<f64>)]) -> Vec<PeriodValue> {
        values
            .iter()
            .map(|(p, v)| PeriodValue::new(*p, *v))
            .collect()
    }

    #[test]
    fn test_flat_series_has_zero_dispersion() {
        let result = seasonality(&series(&[
            ("Jan", Some(5.0)),
            ("Feb", Some(5.0)),
            ("Mar", Some(5.0)),
        ]));

        assert_eq!(result.dispersion_index, Some(0.0));
        assert_eq!(result.peak_period.as_deref(), Some("Jan"));
        assert_eq!(result.low_period.as_deref(), Some("Jan"));
    }

    #[test]
    fn test_uses_population_standard_deviation() {
        // mean 5, population variance 4, sample variance 32/7
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];

        let index = dispersion_index(&values).unwrap();

        assert!((index - 0.4).abs() < 1e-12);
        let sample = (32.0_f64 / 7.0).sqrt() / 5.0;
        assert!((index - sample).abs() > 1e-3);
    }

    #[test]
    fn test_peak_and_low() {
        let result = seasonality(&series(&[
            ("Jan", Some(3.0)),
            ("Feb", Some(9.0)),
            ("Mar", Some(1.0)),
            ("Apr", Some(9.0)),
            ("May", Some(1.0)),
        ]));

        assert_eq!(result.peak_period.as_deref(), Some("Feb"));
        assert_eq!(result.low_period.as_deref(), Some("Mar"));
    }

    #[test]
    fn test_missing_periods_are_skipped() {
        let result = seasonality(&series(&[
            ("Jan", None),
            ("Feb", Some(2.0)),
            ("Mar", Some(6.0)),
        ]));

        assert_eq!(result.low_period.as_deref(), Some("Feb"));
        assert_eq!(result.peak_period.as_deref(), Some("Mar"));
        assert_eq!(result.dispersion_index, Some(0.5));
        assert_eq!(result.period_totals.len(), 3);
    }

    #[test]
    fn test_zero_mean_dispersion_is_missing() {
        let result = seasonality(&series(&[("Jan", Some(0.0)), ("Feb", Some(0.0))]));
        assert_eq!(result.dispersion_index, None);

        assert_eq!(dispersion_index(&[-1.0, 1.0]), None);
    }

    #[test]
    fn test_row_order_does_not_change_result() {
        let columns = ["Region", "Jan", "Feb", "Mar", "Apr"];
        let rows = [
            ["North", "10", "40", ":", "20"],
            ["South", "5", "12", "3", ":"],
            ["East", ":", "8", "1", "30"],
            ["West", "7", ":", "2", "9"],
        ];
        let build = |order: &[usize]| {
            let raw = RawTable::new(
                "t.csv",
                columns.iter().map(|c| c.to_string()).collect(),
                order
                    .iter()
                    .map(|&i| rows[i].iter().map(|c| RawCell::from(*c)).collect())
                    .collect(),
            )
            .unwrap();
            seasonality(&aggregate(&normalize(&raw, ":", true)).period_totals)
        };

        let original = build(&[0, 1, 2, 3]);
        let permuted = build(&[3, 1, 0, 2]);

        assert_eq!(original.peak_period.as_deref(), Some("Feb"));
        assert_eq!(original.low_period.as_deref(), Some("Mar"));
        assert_eq!(permuted.peak_period, original.peak_period);
        assert_eq!(permuted.low_period, original.low_period);
        assert_eq!(permuted.dispersion_index, original.dispersion_index);
    }

    #[test]
    fn test_empty_series() {
        let result = seasonality(&series(&[("Jan", None)]));

        assert_eq!(result.peak_period, None);
        assert_eq!(result.low_period, None);
        assert_eq!(result.dispersion_index, None);
    }
}
