//! Resource fetching for the four sensor datasets.
//!
//! A fetch is a single attempt: any transport failure or non-success
//! status surfaces as [`CombinerError::Fetch`] and aborts the run.

use crate::config::DatasetSource;
use crate::error::{CombinerError, Result};
use crate::models::DatasetKind;
use reqwest::Client;
use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

/// Retrieves the raw text of one dataset
pub trait ResourceFetcher: Send + Sync {
    fn fetch(&self, source: &DatasetSource) -> impl Future<Output = Result<String>> + Send;
}

/// Resolved form of a configured location
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    Remote(String),
    Local(PathBuf),
}

impl SourceLocation {
    pub fn parse(location: &str) -> Self {
        let location = location.trim();
        if location.starts_with("http://") || location.starts_with("https://") {
            SourceLocation::Remote(location.to_string())
        } else if let Some(path) = location.strip_prefix("file://") {
            SourceLocation::Local(PathBuf::from(path))
        } else {
            SourceLocation::Local(PathBuf::from(location))
        }
    }
}

/// Fetches HTTP(S) sources with reqwest and everything else from disk
#[derive(Debug, Clone)]
pub struct SourceFetcher {
    client: Client,
}

impl SourceFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("sensor-combiner/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                CombinerError::configuration(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self { client })
    }

    async fn fetch_remote(&self, kind: DatasetKind, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CombinerError::fetch(kind.name(), url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CombinerError::fetch(
                kind.name(),
                url,
                format!("HTTP {status}"),
            ));
        }

        response
            .text()
            .await
            .map_err(|e| CombinerError::fetch(kind.name(), url, e.to_string()))
    }
}

impl ResourceFetcher for SourceFetcher {
    async fn fetch(&self, source: &DatasetSource) -> Result<String> {
        debug!("Fetching {} from {}", source.kind, source.location);

        let text = match SourceLocation::parse(&source.location) {
            SourceLocation::Remote(url) => self.fetch_remote(source.kind, &url).await?,
            SourceLocation::Local(path) => {
                tokio::fs::read_to_string(&path).await.map_err(|e| {
                    CombinerError::fetch(source.kind.name(), path.display().to_string(), e.to_string())
                })?
            }
        };

        info!("Fetched {} ({} bytes)", source.kind, text.len());
        Ok(text)
    }
}

/// Serves dataset text held in memory, keyed by dataset kind
#[derive(Debug, Clone, Default)]
pub struct MemoryFetcher {
    payloads: HashMap<DatasetKind, String>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_payload(mut self, kind: DatasetKind, text: impl Into<String>) -> Self {
        self.payloads.insert(kind, text.into());
        self
    }
}

impl ResourceFetcher for MemoryFetcher {
    async fn fetch(&self, source: &DatasetSource) -> Result<String> {
        self.payloads.get(&source.kind).cloned().ok_or_else(|| {
            CombinerError::fetch(source.kind.name(), &source.location, "resource unavailable")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_location_classification() {
        assert_eq!(
            SourceLocation::parse("https://example.org/a.csv"),
            SourceLocation::Remote("https://example.org/a.csv".into())
        );
        assert_eq!(
            SourceLocation::parse("file:///data/a.csv"),
            SourceLocation::Local(PathBuf::from("/data/a.csv"))
        );
        assert_eq!(
            SourceLocation::parse("data/a.csv"),
            SourceLocation::Local(PathBuf::from("data/a.csv"))
        );
    }

    #[tokio::test]
    async fn test_local_fetch() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "date,time,value\n2024-01-01,00:15,1\n").unwrap();

        let fetcher = SourceFetcher::new(Duration::from_secs(5)).unwrap();
        let source = DatasetSource::new(
            DatasetKind::Precipitation,
            file.path().display().to_string(),
        );

        let text = fetcher.fetch(&source).await.unwrap();
        assert!(text.starts_with("date,time,value"));
    }

    #[tokio::test]
    async fn test_missing_local_file_is_fetch_error() {
        let fetcher = SourceFetcher::new(Duration::from_secs(5)).unwrap();
        let source = DatasetSource::new(DatasetKind::Treatment, "/nonexistent/treatment.csv");

        let err = fetcher.fetch(&source).await.unwrap_err();
        assert!(err.is_fetch());
        assert!(err.to_string().contains("treatment"));
    }

    #[tokio::test]
    async fn test_memory_fetcher() {
        let fetcher = MemoryFetcher::new().with_payload(DatasetKind::SolarRadiation, "a,b\n1,2\n");
        let present = DatasetSource::published(DatasetKind::SolarRadiation);
        let absent = DatasetSource::published(DatasetKind::BancroftMown);

        assert_eq!(fetcher.fetch(&present).await.unwrap(), "a,b\n1,2\n");
        assert!(fetcher.fetch(&absent).await.unwrap_err().is_fetch());
    }
}
