//! Regional grouping and ranking.
//!
//! Rows sharing an exact label are merged into one regional total, and the
//! regions are ranked by that total.

use crate::models::{CleanedTable, LabelValue};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-region totals and the top-ranked regions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionalRanking {
    /// One entry per distinct label, in first-occurrence order.
    pub totals: Vec<LabelValue>,
    /// Up to `top_n` regions, highest total first.
    pub top: Vec<LabelValue>,
}

/// Group rows by label and rank the groups.
///
/// Labels compare exactly (case- and whitespace-sensitive). Ties in the
/// ranking keep first-occurrence order. Asking for more regions than exist
/// returns all of them.
pub fn group_and_rank(table: &CleanedTable, top_n: usize) -> RegionalRanking {
    let totals = group_by_label(table);

    let mut top = totals.clone();
    top.sort_by(|a, b| {
        b.value
            .partial_cmp(&a.value)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    top.truncate(top_n);

    RegionalRanking { totals, top }
}

/// Sum rows sharing a label, keeping first-occurrence order.
pub fn group_by_label(table: &CleanedTable) -> Vec<LabelValue> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut grouped: Vec<LabelValue> = Vec::new();

    for row in table.rows() {
        match index.get(row.label.as_str()) {
            Some(&pos) => grouped[pos].value += row.total(),
            None => {
                index.insert(&row.label, grouped.len());
                grouped.push(LabelValue::new(row.label.clone(), row.total()));
            }
        }
    }

    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::aggregator::aggregate;
    use crate::analysis::normalize::normalize;
    use crate::models::{RawCell, RawTable};

    fn cleaned(rows: &[&[&str]]) -> CleanedTable {
        let raw = RawTable::new(
            "test.csv",
            vec!["Region".to_string(), "Jan".to_string(), "Feb".to_string()],
            rows.iter()
                .map(|r| r.iter().map(|c| RawCell::from(*c)).collect())
                .collect(),
        )
        .unwrap();
        normalize(&raw, ":", true)
    }

    #[test]
    fn test_groups_duplicate_labels() {
        let table = cleaned(&[
            &["North", "1", "2"],
            &["South", "10", ":"],
            &["North", "3", "4"],
        ]);

        let ranking = group_and_rank(&table, 5);

        assert_eq!(
            ranking.totals,
            vec![LabelValue::new("North", 10.0), LabelValue::new("South", 10.0)]
        );
    }

    #[test]
    fn test_labels_are_case_and_whitespace_sensitive() {
        let table = cleaned(&[&["North", "1", "1"], &["north", "1", "1"], &["North ", "1", "1"]]);

        let ranking = group_and_rank(&table, 10);

        assert_eq!(ranking.totals.len(), 3);
    }

    #[test]
    fn test_ranking_ties_keep_first_occurrence() {
        let table = cleaned(&[
            &["Zeta", "5", ":"],
            &["Alpha", "5", ":"],
            &["Mid", "7", ":"],
            &["Low", "1", ":"],
        ]);

        let ranking = group_and_rank(&table, 3);

        let labels: Vec<_> = ranking.top.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, vec!["Mid", "Zeta", "Alpha"]);
    }

    #[test]
    fn test_top_n_larger_than_groups() {
        let table = cleaned(&[&["A", "1", "1"], &["B", "2", "2"]]);

        let ranking = group_and_rank(&table, 5);

        assert_eq!(ranking.top.len(), 2);
        assert_eq!(ranking.top[0].label, "B");
    }

    #[test]
    fn test_top_zero_is_empty() {
        let table = cleaned(&[&["A", "1", "1"]]);
        assert!(group_and_rank(&table, 0).top.is_empty());
    }

    #[test]
    fn test_group_totals_match_grand_total() {
        let table = cleaned(&[
            &["A", "1", "2"],
            &["B", ":", "8"],
            &["A", "16", ":"],
            &["C", "32", "64"],
            &["B", ":", ":"],
        ]);

        let ranking = group_and_rank(&table, 3);
        let grouped_sum: f64 = ranking.totals.iter().map(|t| t.value).sum();

        assert_eq!(grouped_sum, aggregate(&table).total);
    }
}
