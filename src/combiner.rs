//! Full outer join of normalized tables on the hourly key.
//!
//! The result holds one row per hour present in any input and every data
//! column of every input, in input order. Hours a dataset did not cover
//! are left missing for that dataset's columns.

use crate::constants::{DATE_OUTPUT_COLUMN, TIME_OUTPUT_COLUMN};
use crate::error::{CombinerError, Result};
use crate::models::{CombinedTable, NormalizedTable};
use chrono::NaiveDateTime;
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

/// Outer-join `tables` in the order given
pub fn combine(tables: &[NormalizedTable]) -> Result<CombinedTable> {
    let mut seen: HashSet<&str> = HashSet::from([DATE_OUTPUT_COLUMN, TIME_OUTPUT_COLUMN]);
    let mut data_columns = Vec::new();
    for table in tables {
        for column in table.columns() {
            if !seen.insert(column.as_str()) {
                return Err(CombinerError::ColumnCollision {
                    column: column.clone(),
                });
            }
            data_columns.push(column.clone());
        }
    }

    let keys: Vec<NaiveDateTime> = tables
        .iter()
        .flat_map(|table| table.keys().copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let rows = keys
        .iter()
        .map(|key| {
            let mut row = Vec::with_capacity(data_columns.len());
            for table in tables {
                match table.rows().get(key) {
                    Some(values) => row.extend(values.iter().copied()),
                    None => row.extend(std::iter::repeat_n(None, table.num_columns())),
                }
            }
            row
        })
        .collect();

    debug!(
        "Combined {} tables: {} hours x {} data columns",
        tables.len(),
        keys.len(),
        data_columns.len()
    );

    Ok(CombinedTable::new(data_columns, keys, rows))
}
