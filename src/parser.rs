//! CSV parsing with per-dataset layout hints.
//!
//! Raw text is read with polars as all-string columns so that numeric
//! coercion stays under the normalizer's control. Dispatch is by dataset
//! kind, never by sniffing the content.

use crate::constants::{DATE_COLUMN, FUSED_DATETIME_COLUMN, TIME_COLUMN};
use crate::error::{CombinerError, Result};
use crate::models::{ParseHints, ParsedTable, RawPayload};
use polars::prelude::*;
use std::io::Cursor;
use tracing::debug;

/// Parse one payload using the given layout hints
pub fn parse_payload(payload: &RawPayload, hints: &ParseHints) -> Result<ParsedTable> {
    let dataset = payload.kind.name();

    let mut table = read_csv_text(&payload.text, hints.skip_rows)
        .map_err(|e| CombinerError::parse(dataset, e.to_string()))?;

    if hints.fuse_date_time {
        fuse_date_time(&mut table).map_err(|reason| CombinerError::parse(dataset, reason))?;
    }

    debug!(
        "Parsed {}: {} rows x {} columns (skip_rows={}, fused={})",
        dataset,
        table.num_rows(),
        table.num_columns(),
        hints.skip_rows,
        hints.fuse_date_time
    );

    Ok(table)
}

/// Read delimited text into a string table, skipping `skip_rows` physical
/// lines ahead of the header row
///
/// Preamble lines are counted by newline alone, so blank lines and stray
/// quotes in the preamble never shift the header.
pub fn read_csv_text(text: &str, skip_rows: usize) -> PolarsResult<ParsedTable> {
    let text = text.trim_start_matches('\u{feff}');

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_skip_lines(skip_rows)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(Cursor::new(text.as_bytes().to_vec()))
        .finish()?;

    dataframe_to_table(&df)
}

fn dataframe_to_table(df: &DataFrame) -> PolarsResult<ParsedTable> {
    let columns: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();

    let mut rows: Vec<Vec<Option<String>>> = vec![Vec::with_capacity(columns.len()); df.height()];
    for column in df.get_columns() {
        let series = column.as_materialized_series().cast(&DataType::String)?;
        for (row, value) in rows.iter_mut().zip(series.str()?.into_iter()) {
            row.push(value.map(str::to_string));
        }
    }

    Ok(ParsedTable::new(columns, rows))
}

/// Replace `date` and `time` with a single leading `date_time` column
fn fuse_date_time(table: &mut ParsedTable) -> std::result::Result<(), String> {
    for required in [DATE_COLUMN, TIME_COLUMN] {
        if !table.has_column(required) {
            return Err(format!(
                "column '{required}' required for date/time fusion not found"
            ));
        }
    }

    let dates = table.remove_column(DATE_COLUMN).unwrap_or_default();
    let times = table.remove_column(TIME_COLUMN).unwrap_or_default();

    let fused = dates
        .into_iter()
        .zip(times)
        .map(|(date, time)| match (date, time) {
            (Some(date), Some(time)) => Some(format!("{} {}", date.trim(), time.trim())),
            (Some(date), None) => Some(date.trim().to_string()),
            _ => None,
        })
        .collect();

    table.insert_column(0, FUSED_DATETIME_COLUMN, fused);
    Ok(())
}
