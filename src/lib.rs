//! Sensor Combiner Library
//!
//! Fetches four environmental sensor datasets (the Bancroft mown-plot
//! station export, solar radiation, precipitation and treatment-plot soil
//! readings), normalizes each onto an hourly timeline and joins them into
//! one table rendered as CSV.
//!
//! This library provides tools for:
//! - Fetching sources over HTTP(S) or from local files, concurrently
//! - Parsing raw CSV text with per-dataset layout hints
//! - Timestamp resolution, numeric coercion and hourly mean resampling
//! - Pivoting the long treatment table into per-plot columns
//! - Outer-joining the hourly tables and serializing the result
//! - Serving the combined CSV behind a download page

pub mod cli;
pub mod combiner;
pub mod config;
pub mod constants;
pub mod error;
pub mod fetch;
pub mod models;
pub mod normalizer;
pub mod parser;
pub mod pipeline;
pub mod serializer;
pub mod server;

// Re-export commonly used types
pub use config::{CombinerConfig, DatasetSource};
pub use error::{CombinerError, Result};
pub use fetch::{MemoryFetcher, ResourceFetcher, SourceFetcher};
pub use models::{
    CombinedTable, DatasetKind, NormalizedTable, ParseHints, ParsedTable, PipelineStats,
    RawPayload,
};
pub use normalizer::Normalizer;
pub use pipeline::CombinePipeline;

/// Fetch the published datasets and return the combined CSV bytes
pub async fn produce_combined_csv() -> Result<Vec<u8>> {
    CombinePipeline::from_config(CombinerConfig::default())?
        .produce_combined_csv()
        .await
}
