//! Core data structures and types for the sensor combiner.
//!
//! Defines the closed set of dataset kinds with their parse and normalize
//! rules, the tables passed between pipeline stages, and processing
//! statistics.

use crate::constants::*;
use crate::error::CombinerError;
use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Dataset kinds combined by the pipeline, in join order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    BancroftMown,
    SolarRadiation,
    Precipitation,
    Treatment,
}

impl DatasetKind {
    /// All kinds in the fixed output column order
    pub const ALL: [DatasetKind; 4] = [
        DatasetKind::BancroftMown,
        DatasetKind::SolarRadiation,
        DatasetKind::Precipitation,
        DatasetKind::Treatment,
    ];

    /// Resource identifier used in configuration and logs
    pub fn name(&self) -> &'static str {
        match self {
            DatasetKind::BancroftMown => "bancroft_mown",
            DatasetKind::SolarRadiation => "m_srad",
            DatasetKind::Precipitation => "precip",
            DatasetKind::Treatment => "treatment",
        }
    }

    /// Resolve a resource identifier, accepting a few spelling variants
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().replace('-', "_").as_str() {
            "bancroft_mown" | "bancroft" => Some(DatasetKind::BancroftMown),
            "m_srad" | "srad" | "solar" | "solar_radiation" => Some(DatasetKind::SolarRadiation),
            "precip" | "precipitation" => Some(DatasetKind::Precipitation),
            "treatment" => Some(DatasetKind::Treatment),
            _ => None,
        }
    }

    /// Published location of this dataset
    pub fn default_location(&self) -> &'static str {
        match self {
            DatasetKind::BancroftMown => BANCROFT_MOWN_URL,
            DatasetKind::SolarRadiation => SOLAR_RADIATION_URL,
            DatasetKind::Precipitation => PRECIPITATION_URL,
            DatasetKind::Treatment => TREATMENT_URL,
        }
    }

    /// Layout hints applied while reading the raw text
    pub fn parse_hints(&self) -> ParseHints {
        match self {
            DatasetKind::BancroftMown => ParseHints {
                skip_rows: DEFAULT_BANCROFT_SKIP_ROWS,
                fuse_date_time: false,
            },
            DatasetKind::SolarRadiation | DatasetKind::Precipitation => ParseHints {
                skip_rows: 0,
                fuse_date_time: true,
            },
            // Treatment fuses date/time after the category columns are read
            DatasetKind::Treatment => ParseHints::plain(),
        }
    }

    /// Rules turning a parsed table into an hourly normalized table
    pub fn normalize_profile(&self) -> NormalizeProfile {
        match self {
            DatasetKind::BancroftMown => NormalizeProfile {
                timestamp: TimestampSource::Column(BANCROFT_TIME_COLUMN),
                leading_rows_to_drop: 1,
                dropped_columns: BANCROFT_DROPPED_COLUMNS,
                drop_index_artifacts: false,
                prefix: None,
                pivot: None,
            },
            DatasetKind::SolarRadiation => NormalizeProfile {
                timestamp: TimestampSource::Column(FUSED_DATETIME_COLUMN),
                leading_rows_to_drop: 0,
                dropped_columns: &[],
                drop_index_artifacts: true,
                prefix: Some(IRRADIANCE_PREFIX),
                pivot: None,
            },
            DatasetKind::Precipitation => NormalizeProfile {
                timestamp: TimestampSource::Column(FUSED_DATETIME_COLUMN),
                leading_rows_to_drop: 0,
                dropped_columns: &[],
                drop_index_artifacts: true,
                prefix: Some(PRECIPITATION_PREFIX),
                pivot: None,
            },
            DatasetKind::Treatment => NormalizeProfile {
                timestamp: TimestampSource::DateAndTime {
                    date: DATE_COLUMN,
                    time: TIME_COLUMN,
                },
                leading_rows_to_drop: 0,
                dropped_columns: &[],
                drop_index_artifacts: false,
                prefix: None,
                pivot: Some(PivotSpec {
                    row_category: TREATMENT_COLUMN,
                    column_category: ZONE_COLUMN,
                    values: &[
                        (TEMPERATURE_COLUMN, TEMPERATURE_PREFIX),
                        (WATER_CONTENT_COLUMN, WATER_CONTENT_PREFIX),
                    ],
                }),
            },
        }
    }
}

impl FromStr for DatasetKind {
    type Err = CombinerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| CombinerError::UnknownDataset {
            name: s.to_string(),
        })
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw layout hints for one dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseHints {
    /// Lines to skip before the header row
    pub skip_rows: usize,
    /// Fuse separate `date` and `time` columns into `date_time`
    pub fuse_date_time: bool,
}

impl ParseHints {
    /// Straight delimited parse: no header skip, no date fusion
    pub fn plain() -> Self {
        Self::default()
    }

    /// Hints for a resource identifier; unknown identifiers parse plainly
    pub fn for_identifier(identifier: &str) -> Self {
        DatasetKind::from_name(identifier)
            .map(|kind| kind.parse_hints())
            .unwrap_or_default()
    }

    pub fn with_skip_rows(mut self, skip_rows: usize) -> Self {
        self.skip_rows = skip_rows;
        self
    }
}

/// Where the row timestamp comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampSource {
    /// A single column already holding date and time
    Column(&'static str),
    /// Separate date and time columns joined with a space
    DateAndTime {
        date: &'static str,
        time: &'static str,
    },
}

/// Long-to-wide reshape description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PivotSpec {
    /// First category, leading part of the synthesized column name
    pub row_category: &'static str,
    /// Second category, trailing part of the synthesized column name
    pub column_category: &'static str,
    /// (source value column, output prefix) pairs, one pivot each
    pub values: &'static [(&'static str, &'static str)],
}

/// Declarative per-dataset normalization rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeProfile {
    pub timestamp: TimestampSource,
    /// Metadata/units rows directly below the header
    pub leading_rows_to_drop: usize,
    /// Optional columns removed when present
    pub dropped_columns: &'static [&'static str],
    /// Remove unnamed index columns written by dataframe exporters
    pub drop_index_artifacts: bool,
    /// Prefix applied to every retained value column
    pub prefix: Option<&'static str>,
    pub pivot: Option<PivotSpec>,
}

/// Raw text for one dataset, consumed once by its parser
#[derive(Debug, Clone)]
pub struct RawPayload {
    pub kind: DatasetKind,
    pub text: String,
}

impl RawPayload {
    pub fn new(kind: DatasetKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Rectangular text table straight out of the CSV reader
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedTable {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl ParsedTable {
    /// Build a table, padding or truncating rows to the column count
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, None);
                row
            })
            .collect();
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Option<String>>] {
        &self.rows
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Cell text, `None` for missing values or unknown columns
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)?.as_deref()
    }

    /// Remove the first `n` data rows
    pub fn drop_leading_rows(&mut self, n: usize) {
        let n = n.min(self.rows.len());
        self.rows.drain(..n);
    }

    /// Remove a column, returning its values if it existed
    pub fn remove_column(&mut self, name: &str) -> Option<Vec<Option<String>>> {
        let idx = self.column_index(name)?;
        self.columns.remove(idx);
        Some(self.rows.iter_mut().map(|row| row.remove(idx)).collect())
    }

    /// Insert a column at `position`; values are padded to the row count
    pub fn insert_column(
        &mut self,
        position: usize,
        name: impl Into<String>,
        mut values: Vec<Option<String>>,
    ) {
        let position = position.min(self.columns.len());
        values.resize(self.rows.len(), None);
        self.columns.insert(position, name.into());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.insert(position, value);
        }
    }

    pub fn into_parts(self) -> (Vec<String>, Vec<Vec<Option<String>>>) {
        (self.columns, self.rows)
    }
}

/// Hour-indexed numeric table with dataset-prefixed columns
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTable {
    pub dataset: DatasetKind,
    columns: Vec<String>,
    rows: BTreeMap<NaiveDateTime, Vec<Option<f64>>>,
}

impl NormalizedTable {
    pub fn new(
        dataset: DatasetKind,
        columns: Vec<String>,
        rows: BTreeMap<NaiveDateTime, Vec<Option<f64>>>,
    ) -> Self {
        Self {
            dataset,
            columns,
            rows,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &BTreeMap<NaiveDateTime, Vec<Option<f64>>> {
        &self.rows
    }

    pub fn keys(&self) -> impl Iterator<Item = &NaiveDateTime> {
        self.rows.keys()
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Value at `hour` in `column`, `None` when missing
    pub fn value(&self, hour: &NaiveDateTime, column: &str) -> Option<f64> {
        let idx = self.column_index(column)?;
        self.rows.get(hour)?.get(idx).copied().flatten()
    }

    /// Every key has zero minutes, seconds and sub-seconds
    pub fn is_hour_aligned(&self) -> bool {
        self.rows
            .keys()
            .all(|ts| ts.minute() == 0 && ts.second() == 0 && ts.nanosecond() == 0)
    }
}

/// Outer join of all normalized tables, ready for serialization
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CombinedTable {
    data_columns: Vec<String>,
    keys: Vec<NaiveDateTime>,
    rows: Vec<Vec<Option<f64>>>,
}

impl CombinedTable {
    pub fn new(
        data_columns: Vec<String>,
        keys: Vec<NaiveDateTime>,
        rows: Vec<Vec<Option<f64>>>,
    ) -> Self {
        Self {
            data_columns,
            keys,
            rows,
        }
    }

    /// Full header: `Date`, `Time`, then the data columns
    pub fn column_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.data_columns.len() + 2);
        names.push(DATE_OUTPUT_COLUMN.to_string());
        names.push(TIME_OUTPUT_COLUMN.to_string());
        names.extend(self.data_columns.iter().cloned());
        names
    }

    pub fn data_columns(&self) -> &[String] {
        &self.data_columns
    }

    pub fn keys(&self) -> &[NaiveDateTime] {
        &self.keys
    }

    pub fn rows(&self) -> &[Vec<Option<f64>>] {
        &self.rows
    }

    pub fn num_rows(&self) -> usize {
        self.keys.len()
    }

    /// Column count including `Date` and `Time`
    pub fn num_columns(&self) -> usize {
        self.data_columns.len() + 2
    }

    pub fn value(&self, hour: &NaiveDateTime, column: &str) -> Option<f64> {
        let col = self.data_columns.iter().position(|c| c == column)?;
        let row = self.keys.binary_search(hour).ok()?;
        self.rows[row][col]
    }
}

/// Per-dataset processing counters
#[derive(Debug, Clone, Serialize)]
pub struct DatasetStats {
    pub dataset: DatasetKind,
    pub parsed_rows: usize,
    pub dropped_rows: usize,
    pub hourly_rows: usize,
    pub data_columns: usize,
}

/// Statistics for one pipeline invocation
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineStats {
    pub datasets: Vec<DatasetStats>,
    pub combined_rows: usize,
    pub combined_columns: usize,
    pub output_bytes: usize,
    pub processing_time_ms: u128,
}

impl PipelineStats {
    pub fn total_dropped_rows(&self) -> usize {
        self.datasets.iter().map(|d| d.dropped_rows).sum()
    }
}
