//! CSV rendering of the combined table.
//!
//! The combined table is turned into a polars frame (`Date` and `Time` as
//! formatted strings, data columns as nullable floats) and written with
//! polars' CSV writer. Missing cells are written empty.

use crate::constants::{DATE_OUTPUT_FORMAT, TIME_OUTPUT_FORMAT};
use crate::error::Result;
use crate::models::{CombinedTable, ParsedTable};
use crate::parser::read_csv_text;
use polars::prelude::*;
use tracing::debug;

/// Build the polars frame written for `table`
pub fn to_dataframe(table: &CombinedTable) -> PolarsResult<DataFrame> {
    let names = table.column_names();
    let mut columns: Vec<Column> = Vec::with_capacity(names.len());

    let dates: Vec<String> = table
        .keys()
        .iter()
        .map(|ts| ts.format(DATE_OUTPUT_FORMAT).to_string())
        .collect();
    let times: Vec<String> = table
        .keys()
        .iter()
        .map(|ts| ts.format(TIME_OUTPUT_FORMAT).to_string())
        .collect();
    columns.push(Column::new(names[0].as_str().into(), dates));
    columns.push(Column::new(names[1].as_str().into(), times));

    for (idx, name) in table.data_columns().iter().enumerate() {
        let values: Vec<Option<f64>> = table.rows().iter().map(|row| row[idx]).collect();
        columns.push(Column::new(name.as_str().into(), values));
    }

    DataFrame::new(columns)
}

/// Render `table` as comma-separated bytes with a header row
pub fn serialize(table: &CombinedTable) -> Result<Vec<u8>> {
    let mut df = to_dataframe(table)?;
    let mut buffer = Vec::new();

    CsvWriter::new(&mut buffer)
        .include_header(true)
        .with_separator(b',')
        .finish(&mut df)?;

    debug!(
        "Serialized {} rows x {} columns into {} bytes",
        table.num_rows(),
        table.num_columns(),
        buffer.len()
    );

    Ok(buffer)
}

/// Read serialized bytes back into a string table
pub fn read_back(bytes: &[u8]) -> Result<ParsedTable> {
    let text = String::from_utf8_lossy(bytes);
    Ok(read_csv_text(&text, 0)?)
}
