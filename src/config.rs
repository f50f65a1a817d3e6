//! Configuration management and validation.
//!
//! Holds the four dataset sources with their layout overrides plus the
//! pipeline switches. Defaults point at the published datasets; the CLI
//! layers its overrides on top.

use crate::constants::{DEFAULT_ATTACHMENT_NAME, DEFAULT_REQUEST_TIMEOUT_SECS};
use crate::error::{CombinerError, Result};
use crate::models::{DatasetKind, ParseHints};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

/// Where one dataset is read from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSource {
    pub kind: DatasetKind,

    /// HTTP(S) URL, `file://` URL or local path
    pub location: String,

    /// Override for the number of preamble lines ahead of the header
    pub header_skip_rows: Option<usize>,
}

impl DatasetSource {
    pub fn new(kind: DatasetKind, location: impl Into<String>) -> Self {
        Self {
            kind,
            location: location.into(),
            header_skip_rows: None,
        }
    }

    /// Source at the published location for `kind`
    pub fn published(kind: DatasetKind) -> Self {
        Self::new(kind, kind.default_location())
    }

    /// Parse hints for this source, with the skip override applied
    pub fn parse_hints(&self) -> ParseHints {
        let hints = self.kind.parse_hints();
        match self.header_skip_rows {
            Some(skip_rows) => hints.with_skip_rows(skip_rows),
            None => hints,
        }
    }
}

/// Global configuration for one combining run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombinerConfig {
    /// One source per dataset kind
    pub sources: BTreeMap<DatasetKind, DatasetSource>,

    /// Per-request timeout for remote sources
    pub request_timeout_secs: u64,

    /// Insert empty rows for hours between a dataset's first and last reading
    pub fill_hourly_gaps: bool,

    /// Treat any unparsable timestamp as an error instead of dropping the row
    pub strict_timestamps: bool,

    /// File name offered with the combined download
    pub attachment_name: String,
}

impl Default for CombinerConfig {
    fn default() -> Self {
        let sources = DatasetKind::ALL
            .iter()
            .map(|kind| (*kind, DatasetSource::published(*kind)))
            .collect();

        Self {
            sources,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            fill_hourly_gaps: false,
            strict_timestamps: false,
            attachment_name: DEFAULT_ATTACHMENT_NAME.to_string(),
        }
    }
}

impl CombinerConfig {
    /// Point one dataset at a different location
    pub fn with_source_location(mut self, kind: DatasetKind, location: impl Into<String>) -> Self {
        let location = location.into();
        self.sources
            .entry(kind)
            .and_modify(|source| source.location = location.clone())
            .or_insert_with(|| DatasetSource::new(kind, location));
        self
    }

    /// Override the Bancroft preamble length
    pub fn with_bancroft_skip_rows(mut self, skip_rows: usize) -> Self {
        self.sources
            .entry(DatasetKind::BancroftMown)
            .or_insert_with(|| DatasetSource::published(DatasetKind::BancroftMown))
            .header_skip_rows = Some(skip_rows);
        self
    }

    pub fn with_request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    pub fn with_gap_filling(mut self) -> Self {
        self.fill_hourly_gaps = true;
        self
    }

    pub fn with_strict_timestamps(mut self) -> Self {
        self.strict_timestamps = true;
        self
    }

    pub fn with_attachment_name(mut self, name: impl Into<String>) -> Self {
        self.attachment_name = name.into();
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Configured source for a dataset kind
    pub fn source(&self, kind: DatasetKind) -> Result<&DatasetSource> {
        self.sources
            .get(&kind)
            .ok_or_else(|| CombinerError::configuration(format!("No source configured for {kind}")))
    }

    /// Reject configurations that cannot produce a combined table
    pub fn validate(&self) -> Result<()> {
        for kind in DatasetKind::ALL {
            let source = self.source(kind)?;
            if source.kind != kind {
                return Err(CombinerError::configuration(format!(
                    "Source registered for {kind} describes {}",
                    source.kind
                )));
            }
            if source.location.trim().is_empty() {
                return Err(CombinerError::configuration(format!(
                    "Empty location for {kind}"
                )));
            }
        }

        if self.request_timeout_secs == 0 {
            return Err(CombinerError::configuration(
                "Request timeout must be at least one second",
            ));
        }

        if self.attachment_name.trim().is_empty() {
            return Err(CombinerError::configuration(
                "Attachment name must not be empty",
            ));
        }

        debug!(
            "Configuration valid: {} sources, timeout {}s, gap filling {}",
            self.sources.len(),
            self.request_timeout_secs,
            self.fill_hourly_gaps
        );
        Ok(())
    }
}
