//! Application constants for the sensor combiner
//!
//! Default resource locations, column names and prefixes used by the
//! per-dataset parse and normalize rules.

// =============================================================================
// Resource Locations
// =============================================================================

/// Location of a file under the published dataset directory
macro_rules! source_url {
    ($file:literal) => {
        concat!(
            "https://raw.githubusercontent.com/claySRC/Cattle-Tracker/refs/heads/main/src/",
            $file
        )
    };
}

/// Default location of the Bancroft mown station log
pub const BANCROFT_MOWN_URL: &str = source_url!("Bancroft%20mown%20v1_0.csv");

/// Default location of the solar radiation series
pub const SOLAR_RADIATION_URL: &str = source_url!("M_srad.csv");

/// Default location of the precipitation series
pub const PRECIPITATION_URL: &str = source_url!("precip.csv");

/// Default location of the 15-minute treatment soil moisture/temperature series
pub const TREATMENT_URL: &str = source_url!("treatment_avg_sm_temp_15min.csv");

// =============================================================================
// Parse Hints
// =============================================================================

/// Descriptive preamble lines ahead of the Bancroft header row.
///
/// Tied to the current layout of the published file, so it can be
/// overridden through configuration.
pub const DEFAULT_BANCROFT_SKIP_ROWS: usize = 25;

/// Separate date column fused at parse time
pub const DATE_COLUMN: &str = "date";

/// Separate time column fused at parse time
pub const TIME_COLUMN: &str = "time";

/// Name of the fused date/time column
pub const FUSED_DATETIME_COLUMN: &str = "date_time";

// =============================================================================
// Bancroft Columns
// =============================================================================

/// Column holding the observation timestamp in the Bancroft log
pub const BANCROFT_TIME_COLUMN: &str = "ENDING_DATETIME";

/// Timestamp-adjacent columns removed from the Bancroft log
pub const BANCROFT_DROPPED_COLUMNS: &[&str] = &[
    "TIMESTAMP",
    "STARTING_DATETIME",
    "MIDPOINT_DATETIME",
    "ENDING_DATETIME",
];

// =============================================================================
// Column Prefixes
// =============================================================================

pub const IRRADIANCE_PREFIX: &str = "Irrad_";
pub const PRECIPITATION_PREFIX: &str = "Precip_";
pub const TEMPERATURE_PREFIX: &str = "temp";
pub const WATER_CONTENT_PREFIX: &str = "WC";

/// Prefix pandas-style writers give to an unnamed index column
pub const INDEX_ARTIFACT_PREFIX: &str = "Unnamed:";

/// Prefix polars gives to repeated or blank header names
pub const DUPLICATED_COLUMN_PREFIX: &str = "_duplicated_";

// =============================================================================
// Treatment Columns
// =============================================================================

pub const TREATMENT_COLUMN: &str = "treatment";
pub const ZONE_COLUMN: &str = "zone";
pub const TEMPERATURE_COLUMN: &str = "temp";
pub const WATER_CONTENT_COLUMN: &str = "WC";

// =============================================================================
// Output
// =============================================================================

pub const DATE_OUTPUT_COLUMN: &str = "Date";
pub const TIME_OUTPUT_COLUMN: &str = "Time";
pub const DATE_OUTPUT_FORMAT: &str = "%Y-%m-%d";
pub const TIME_OUTPUT_FORMAT: &str = "%H:%M:%S";

/// File name offered to the caller for the combined download
pub const DEFAULT_ATTACHMENT_NAME: &str = "combined_data.csv";

/// Default per-request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Default bind address for the download server
pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";
pub const DEFAULT_SERVER_PORT: u16 = 8050;

/// Cell values read as missing before numeric parsing
pub const MISSING_VALUE_MARKERS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "NAN", "null", "NULL"];
