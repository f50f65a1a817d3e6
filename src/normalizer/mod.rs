//! Per-dataset normalization onto a common hourly timeline.
//!
//! Each dataset kind carries a declarative [`NormalizeProfile`]; this
//! module applies it: timestamp resolution, column dropping and renaming,
//! numeric coercion, the treatment pivot, and hourly mean aggregation.
//!
//! Rows whose timestamp cannot be parsed are dropped and counted (unless
//! strict timestamps are configured). A missing timestamp column, or a
//! table where no row has a usable timestamp, is an error.

pub mod coerce;
pub mod pivot;
pub mod resample;
pub mod timestamp;

#[cfg(test)]
pub mod tests;

use self::coerce::coerce_numeric;
use self::pivot::{LongRecord, pivot_long_to_wide};
use self::resample::{HourlyRows, fill_hourly_gaps, resample_hourly};
use self::timestamp::parse_timestamp;

use crate::config::CombinerConfig;
use crate::constants::{DUPLICATED_COLUMN_PREFIX, INDEX_ARTIFACT_PREFIX};
use crate::error::{CombinerError, Result};
use crate::models::{
    DatasetKind, NormalizeProfile, NormalizedTable, ParsedTable, PivotSpec, TimestampSource,
};
use chrono::NaiveDateTime;
use tracing::{debug, warn};

/// Row accounting for one normalization
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    /// Data rows seen after leading metadata rows were removed
    pub input_rows: usize,
    /// Rows excluded for an unusable timestamp or pivot category
    pub dropped_rows: usize,
    /// Empty hours inserted by gap filling
    pub filled_hours: usize,
}

/// Applies dataset profiles to parsed tables
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer {
    fill_hourly_gaps: bool,
    strict_timestamps: bool,
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &CombinerConfig) -> Self {
        Self {
            fill_hourly_gaps: config.fill_hourly_gaps,
            strict_timestamps: config.strict_timestamps,
        }
    }

    pub fn with_gap_filling(mut self, enabled: bool) -> Self {
        self.fill_hourly_gaps = enabled;
        self
    }

    pub fn with_strict_timestamps(mut self, enabled: bool) -> Self {
        self.strict_timestamps = enabled;
        self
    }

    /// Normalize a parsed table of the given kind
    pub fn normalize(
        &self,
        kind: DatasetKind,
        table: ParsedTable,
    ) -> Result<(NormalizedTable, NormalizeReport)> {
        let profile = kind.normalize_profile();
        let (columns, mut rows, mut report) = match profile.pivot {
            Some(spec) => self.normalize_pivot(kind, &profile, spec, table)?,
            None => self.normalize_flat(kind, &profile, table)?,
        };

        if self.fill_hourly_gaps {
            report.filled_hours = fill_hourly_gaps(&mut rows, columns.len());
        }

        debug!(
            "Normalized {}: {} rows -> {} hours x {} columns ({} dropped, {} filled)",
            kind,
            report.input_rows,
            rows.len(),
            columns.len(),
            report.dropped_rows,
            report.filled_hours
        );

        Ok((NormalizedTable::new(kind, columns, rows), report))
    }

    /// Bancroft, solar radiation and precipitation: every retained column
    /// is a value column
    fn normalize_flat(
        &self,
        kind: DatasetKind,
        profile: &NormalizeProfile,
        mut table: ParsedTable,
    ) -> Result<(Vec<String>, HourlyRows, NormalizeReport)> {
        table.drop_leading_rows(profile.leading_rows_to_drop);

        let stamps = take_timestamp_cells(kind, &profile.timestamp, &mut table)?;
        drop_optional_columns(kind, profile, &mut table);

        let (source_columns, cells) = table.into_parts();
        let columns: Vec<String> = source_columns
            .into_iter()
            .map(|name| match profile.prefix {
                Some(prefix) => format!("{prefix}{name}"),
                None => name,
            })
            .collect();

        let mut report = NormalizeReport {
            input_rows: cells.len(),
            ..Default::default()
        };

        let mut timed = Vec::with_capacity(cells.len());
        for (row_idx, (stamp, row)) in stamps.into_iter().zip(cells).enumerate() {
            let Some(ts) = self.resolve_row_timestamp(kind, row_idx, stamp.as_deref())? else {
                report.dropped_rows += 1;
                continue;
            };
            let values = row
                .iter()
                .map(|cell| coerce_numeric(cell.as_deref()))
                .collect();
            timed.push((ts, values));
        }

        ensure_some_rows_survived(kind, &report, timed.len())?;
        let width = columns.len();
        Ok((columns, resample_hourly(width, timed), report))
    }

    /// Treatment: long table of (timestamp, treatment, zone, temp, WC)
    /// spread wide, then averaged per hour
    fn normalize_pivot(
        &self,
        kind: DatasetKind,
        profile: &NormalizeProfile,
        spec: PivotSpec,
        mut table: ParsedTable,
    ) -> Result<(Vec<String>, HourlyRows, NormalizeReport)> {
        table.drop_leading_rows(profile.leading_rows_to_drop);

        let required = [spec.row_category, spec.column_category]
            .into_iter()
            .chain(spec.values.iter().map(|(column, _)| *column));
        let mut missing = Vec::new();
        for column in required {
            if !table.has_column(column) {
                missing.push(column);
            }
        }
        if !missing.is_empty() {
            return Err(CombinerError::normalize(
                kind.name(),
                format!("pivot source is missing columns: {}", missing.join(", ")),
            ));
        }

        let stamps = take_timestamp_cells(kind, &profile.timestamp, &mut table)?;
        let mut report = NormalizeReport {
            input_rows: table.num_rows(),
            ..Default::default()
        };

        let mut records = Vec::with_capacity(table.num_rows());
        for (row_idx, stamp) in stamps.iter().enumerate() {
            let Some(ts) = self.resolve_row_timestamp(kind, row_idx, stamp.as_deref())? else {
                report.dropped_rows += 1;
                continue;
            };

            let labels = (
                category_label(table.cell(row_idx, spec.row_category)),
                category_label(table.cell(row_idx, spec.column_category)),
            );
            let (Some(first_label), Some(second_label)) = labels else {
                debug!("{}: row {} has no category labels, skipping", kind, row_idx);
                report.dropped_rows += 1;
                continue;
            };

            records.push(LongRecord {
                timestamp: ts,
                first_label,
                second_label,
                values: spec
                    .values
                    .iter()
                    .map(|(column, _)| coerce_numeric(table.cell(row_idx, column)))
                    .collect(),
            });
        }

        ensure_some_rows_survived(kind, &report, records.len())?;

        let prefixes: Vec<&str> = spec.values.iter().map(|(_, prefix)| *prefix).collect();
        let wide = pivot_long_to_wide(&records, &prefixes);
        let width = wide.columns.len();
        Ok((wide.columns, resample_hourly(width, wide.rows), report))
    }

    /// Parsed timestamp for a row, `None` when the row should be dropped
    fn resolve_row_timestamp(
        &self,
        kind: DatasetKind,
        row_idx: usize,
        stamp: Option<&str>,
    ) -> Result<Option<NaiveDateTime>> {
        match stamp.and_then(parse_timestamp) {
            Some(ts) => Ok(Some(ts)),
            None if self.strict_timestamps => Err(CombinerError::normalize(
                kind.name(),
                format!(
                    "unparsable timestamp {:?} in data row {}",
                    stamp.unwrap_or(""),
                    row_idx + 1
                ),
            )),
            None => {
                debug!(
                    "{}: dropping row {} with unparsable timestamp {:?}",
                    kind, row_idx, stamp
                );
                Ok(None)
            }
        }
    }
}

/// Pull the raw timestamp text for every row out of the table
fn take_timestamp_cells(
    kind: DatasetKind,
    source: &TimestampSource,
    table: &mut ParsedTable,
) -> Result<Vec<Option<String>>> {
    let missing = |column: &str| {
        CombinerError::normalize(kind.name(), format!("timestamp column '{column}' not found"))
    };

    match *source {
        TimestampSource::Column(column) => {
            table.remove_column(column).ok_or_else(|| missing(column))
        }
        TimestampSource::DateAndTime { date, time } => {
            if !table.has_column(date) {
                return Err(missing(date));
            }
            let dates = table.remove_column(date).unwrap_or_default();
            let times = table.remove_column(time).ok_or_else(|| missing(time))?;

            Ok(dates
                .into_iter()
                .zip(times)
                .map(|(date, time)| match (date, time) {
                    (Some(date), Some(time)) => Some(format!("{} {}", date.trim(), time.trim())),
                    _ => None,
                })
                .collect())
        }
    }
}

/// Remove listed optional columns and exporter index columns when present
fn drop_optional_columns(kind: DatasetKind, profile: &NormalizeProfile, table: &mut ParsedTable) {
    for column in profile.dropped_columns {
        if table.remove_column(column).is_some() {
            debug!("{}: dropped column {}", kind, column);
        }
    }

    if profile.drop_index_artifacts {
        let artifacts: Vec<String> = table
            .columns()
            .iter()
            .filter(|name| is_index_artifact(name))
            .cloned()
            .collect();
        for column in artifacts {
            table.remove_column(&column);
            debug!("{}: dropped index column {:?}", kind, column);
        }
    }
}

/// Unnamed leading index columns written by dataframe exporters
pub fn is_index_artifact(name: &str) -> bool {
    let name = name.trim();
    name.is_empty()
        || name.starts_with(INDEX_ARTIFACT_PREFIX)
        || name.starts_with(DUPLICATED_COLUMN_PREFIX)
}

fn category_label(cell: Option<&str>) -> Option<String> {
    cell.map(str::trim)
        .filter(|label| !label.is_empty())
        .map(str::to_string)
}

fn ensure_some_rows_survived(
    kind: DatasetKind,
    report: &NormalizeReport,
    survivors: usize,
) -> Result<()> {
    if report.input_rows > 0 && survivors == 0 {
        return Err(CombinerError::normalize(
            kind.name(),
            format!(
                "none of {} rows has a parsable timestamp and complete categories",
                report.input_rows
            ),
        ));
    }
    if report.dropped_rows > 0 {
        warn!(
            "{}: dropped {} of {} rows with unusable timestamps or categories",
            kind, report.dropped_rows, report.input_rows
        );
    }
    Ok(())
}
