//! Long-to-wide reshape for category-keyed observations.
//!
//! Each observation carries a timestamp, two category labels and one value
//! per pivoted field. Every distinct label pair becomes its own column in
//! every field block; duplicate observations for the same timestamp and
//! pair are averaged and absent pairs stay missing.

use super::resample::{HourlyRows, MeanAccumulator};
use chrono::NaiveDateTime;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// One row of a long-format table
#[derive(Debug, Clone, PartialEq)]
pub struct LongRecord {
    pub timestamp: NaiveDateTime,
    pub first_label: String,
    pub second_label: String,
    /// One value per pivoted field, in field order
    pub values: Vec<Option<f64>>,
}

/// Result of a pivot, still at the source timestamp resolution
#[derive(Debug, Clone, PartialEq)]
pub struct WideTable {
    pub columns: Vec<String>,
    pub rows: HourlyRows,
}

/// Order labels numerically when both are numbers, numbers before text,
/// and text lexically
pub fn compare_labels(a: &str, b: &str) -> Ordering {
    fn numeric(label: &str) -> Option<f64> {
        label.parse::<f64>().ok().filter(|v| v.is_finite())
    }

    match (numeric(a), numeric(b)) {
        (Some(x), Some(y)) => x.total_cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Spread `records` into `{prefix}_{first}_{second}` columns.
///
/// Columns are laid out field block by field block (in `prefixes` order);
/// within a block label pairs are sorted by first label then second label
/// using [`compare_labels`].
pub fn pivot_long_to_wide(records: &[LongRecord], prefixes: &[&str]) -> WideTable {
    let mut pairs: Vec<(&str, &str)> = records
        .iter()
        .map(|r| (r.first_label.as_str(), r.second_label.as_str()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    pairs.sort_by(|a, b| compare_labels(a.0, b.0).then_with(|| compare_labels(a.1, b.1)));

    let pair_index: HashMap<(&str, &str), usize> = pairs
        .iter()
        .enumerate()
        .map(|(idx, pair)| (*pair, idx))
        .collect();

    let columns: Vec<String> = prefixes
        .iter()
        .flat_map(|prefix| {
            pairs
                .iter()
                .map(move |(first, second)| format!("{prefix}_{first}_{second}"))
        })
        .collect();

    let width = columns.len();
    let mut cells: BTreeMap<NaiveDateTime, Vec<MeanAccumulator>> = BTreeMap::new();

    for record in records {
        let Some(&pair) =
            pair_index.get(&(record.first_label.as_str(), record.second_label.as_str()))
        else {
            continue;
        };
        let row = cells
            .entry(record.timestamp)
            .or_insert_with(|| vec![MeanAccumulator::default(); width]);
        for (field, value) in record.values.iter().take(prefixes.len()).enumerate() {
            row[field * pairs.len() + pair].push(*value);
        }
    }

    let rows = cells
        .into_iter()
        .map(|(ts, row)| (ts, row.iter().map(MeanAccumulator::mean).collect()))
        .collect();

    WideTable { columns, rows }
}
