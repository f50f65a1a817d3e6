//! Hourly mean resampling.
//!
//! Rows are grouped by their timestamp floored to the hour and each
//! column is averaged over the non-missing readings in the group. A
//! column with no readings in an hour stays missing rather than zero.

use super::timestamp::{next_hour, truncate_to_hour};
use chrono::NaiveDateTime;
use std::collections::BTreeMap;

pub type HourlyRows = BTreeMap<NaiveDateTime, Vec<Option<f64>>>;

/// Running mean of the non-missing values pushed into it
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MeanAccumulator {
    sum: f64,
    count: usize,
}

impl MeanAccumulator {
    pub fn push(&mut self, value: Option<f64>) {
        if let Some(value) = value {
            self.sum += value;
            self.count += 1;
        }
    }

    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Group rows by `key_fn(timestamp)` and average each column
pub fn aggregate_by<I, K>(width: usize, rows: I, key_fn: K) -> HourlyRows
where
    I: IntoIterator<Item = (NaiveDateTime, Vec<Option<f64>>)>,
    K: Fn(NaiveDateTime) -> NaiveDateTime,
{
    let mut groups: BTreeMap<NaiveDateTime, Vec<MeanAccumulator>> = BTreeMap::new();

    for (ts, values) in rows {
        let cells = groups
            .entry(key_fn(ts))
            .or_insert_with(|| vec![MeanAccumulator::default(); width]);
        for (cell, value) in cells.iter_mut().zip(values) {
            cell.push(value);
        }
    }

    groups
        .into_iter()
        .map(|(key, cells)| (key, cells.iter().map(MeanAccumulator::mean).collect()))
        .collect()
}

/// Average rows into one row per hour
pub fn resample_hourly<I>(width: usize, rows: I) -> HourlyRows
where
    I: IntoIterator<Item = (NaiveDateTime, Vec<Option<f64>>)>,
{
    aggregate_by(width, rows, truncate_to_hour)
}

/// Insert all-missing rows for every absent hour between the first and
/// last key, returning how many rows were added
pub fn fill_hourly_gaps(rows: &mut HourlyRows, width: usize) -> usize {
    let (Some(first), Some(last)) = (
        rows.keys().next().copied(),
        rows.keys().next_back().copied(),
    ) else {
        return 0;
    };

    let mut added = 0;
    let mut hour = truncate_to_hour(first);
    while hour < last {
        hour = next_hour(hour);
        if !rows.contains_key(&hour) {
            rows.insert(hour, vec![None; width]);
            added += 1;
        }
    }
    added
}
