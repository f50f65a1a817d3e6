//! Combining pipeline: fetch → parse → normalize → combine → serialize.
//!
//! One invocation is all-or-nothing. The four fetches run concurrently
//! and the first failure aborts the run; parsing and normalization then
//! proceed dataset by dataset in join order.

use crate::combiner::combine;
use crate::config::{CombinerConfig, DatasetSource};
use crate::error::Result;
use crate::fetch::{ResourceFetcher, SourceFetcher};
use crate::models::{
    CombinedTable, DatasetKind, DatasetStats, NormalizedTable, PipelineStats, RawPayload,
};
use crate::normalizer::Normalizer;
use crate::parser::parse_payload;
use crate::serializer::serialize;

use futures::future::try_join_all;
use std::time::Instant;
use tracing::{debug, info};

/// Runs the combining pipeline against a fetcher
#[derive(Debug)]
pub struct CombinePipeline<F> {
    config: CombinerConfig,
    fetcher: F,
    normalizer: Normalizer,
}

impl CombinePipeline<SourceFetcher> {
    /// Pipeline reading HTTP(S) and local sources
    pub fn from_config(config: CombinerConfig) -> Result<Self> {
        config.validate()?;
        let fetcher = SourceFetcher::new(config.request_timeout())?;
        Ok(Self::new(config, fetcher))
    }
}

impl<F: ResourceFetcher> CombinePipeline<F> {
    pub fn new(config: CombinerConfig, fetcher: F) -> Self {
        let normalizer = Normalizer::from_config(&config);
        Self {
            config,
            fetcher,
            normalizer,
        }
    }

    pub fn config(&self) -> &CombinerConfig {
        &self.config
    }

    /// Fetch all four datasets; fails as soon as any fetch fails
    pub async fn fetch_all(&self) -> Result<Vec<RawPayload>> {
        let sources = DatasetKind::ALL
            .iter()
            .map(|kind| self.config.source(*kind))
            .collect::<Result<Vec<_>>>()?;

        let mut fetches = Vec::with_capacity(sources.len());
        for source in sources {
            fetches.push(self.fetch_one(source));
        }

        try_join_all(fetches).await
    }

    async fn fetch_one(&self, source: &DatasetSource) -> Result<RawPayload> {
        let text = self.fetcher.fetch(source).await?;
        Ok(RawPayload::new(source.kind, text))
    }

    /// Parse and normalize one payload
    pub fn process_payload(&self, payload: RawPayload) -> Result<(NormalizedTable, DatasetStats)> {
        let hints = self.config.source(payload.kind)?.parse_hints();
        let table = parse_payload(&payload, &hints)?;
        let parsed_rows = table.num_rows();

        let (normalized, report) = self.normalizer.normalize(payload.kind, table)?;

        let stats = DatasetStats {
            dataset: payload.kind,
            parsed_rows,
            dropped_rows: report.dropped_rows,
            hourly_rows: normalized.num_rows(),
            data_columns: normalized.num_columns(),
        };
        Ok((normalized, stats))
    }

    /// Fetch, parse, normalize and join all datasets
    pub async fn produce_combined_table(&self) -> Result<(CombinedTable, PipelineStats)> {
        let start_time = Instant::now();

        let payloads = self.fetch_all().await?;
        debug!("Fetched {} payloads", payloads.len());

        let mut tables = Vec::with_capacity(payloads.len());
        let mut stats = PipelineStats::default();
        for payload in payloads {
            let (table, dataset_stats) = self.process_payload(payload)?;
            tables.push(table);
            stats.datasets.push(dataset_stats);
        }

        let combined = combine(&tables)?;
        stats.combined_rows = combined.num_rows();
        stats.combined_columns = combined.num_columns();
        stats.processing_time_ms = start_time.elapsed().as_millis();

        Ok((combined, stats))
    }

    /// Run the pipeline, returning CSV bytes and statistics
    pub async fn run(&self) -> Result<(Vec<u8>, PipelineStats)> {
        let start_time = Instant::now();

        let (combined, mut stats) = self.produce_combined_table().await?;
        let bytes = serialize(&combined)?;

        stats.output_bytes = bytes.len();
        stats.processing_time_ms = start_time.elapsed().as_millis();

        info!(
            "Combined {} hours x {} columns ({} bytes, {} rows dropped) in {}ms",
            stats.combined_rows,
            stats.combined_columns,
            stats.output_bytes,
            stats.total_dropped_rows(),
            stats.processing_time_ms
        );

        Ok((bytes, stats))
    }

    /// Run the pipeline and return only the CSV bytes
    pub async fn produce_combined_csv(&self) -> Result<Vec<u8>> {
        self.run().await.map(|(bytes, _)| bytes)
    }
}
