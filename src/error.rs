//! Error handling for the sensor combining pipeline.
//!
//! Every variant is terminal for an invocation: no partial output is
//! produced once one of the four datasets fails to fetch, parse or
//! normalize.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CombinerError {
    #[error("Failed to fetch {dataset} from {location}: {reason}")]
    Fetch {
        dataset: String,
        location: String,
        reason: String,
    },

    #[error("Failed to parse {dataset}: {reason}")]
    Parse { dataset: String, reason: String },

    #[error("Failed to normalize {dataset}: {reason}")]
    Normalize { dataset: String, reason: String },

    #[error("Column '{column}' is produced by more than one dataset")]
    ColumnCollision { column: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Unknown dataset: {name}")]
    UnknownDataset { name: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

impl CombinerError {
    pub fn fetch(
        dataset: impl Into<String>,
        location: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Fetch {
            dataset: dataset.into(),
            location: location.into(),
            reason: reason.into(),
        }
    }

    pub fn parse(dataset: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            dataset: dataset.into(),
            reason: reason.into(),
        }
    }

    pub fn normalize(dataset: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Normalize {
            dataset: dataset.into(),
            reason: reason.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// True when a remote or local source could not be read
    pub fn is_fetch(&self) -> bool {
        matches!(self, Self::Fetch { .. })
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }

    pub fn is_normalize(&self) -> bool {
        matches!(self, Self::Normalize { .. })
    }
}

pub type Result<T> = std::result::Result<T, CombinerError>;
