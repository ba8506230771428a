//! End-to-end extraction run: decode, chunk, extract, aggregate, persist

use crate::aggregate::aggregate;
use crate::chunk::chunk_records;
use crate::decode::{decode_records, read_records};
use crate::error::{Result, SiftError};
use crate::extractor::KeyExtractor;
use crate::pool::WorkerPool;
use crate::sink::LineSink;
use crate::types::{RunSummary, SiftConfig};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// A configured extraction pipeline. Cheap to clone; holds no run state.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: SiftConfig,
    pool: WorkerPool,
}

impl Pipeline {
    /// Validate `config` and build the pipeline
    pub fn new(config: SiftConfig) -> Result<Self> {
        config.validate()?;
        let pool = WorkerPool::new(
            KeyExtractor::new(config.target_key.clone()),
            config.max_concurrency,
        )?;

        Ok(Pipeline { config, pool })
    }

    pub fn config(&self) -> &SiftConfig {
        &self.config
    }

    /// Extract from already decoded records
    pub async fn extract(&self, records: Vec<Value>) -> Result<(Vec<String>, RunSummary)> {
        self.extract_since(records, Instant::now()).await
    }

    /// Decode `bytes` and extract from the resulting records
    pub async fn run_bytes(&self, bytes: Vec<u8>) -> Result<(Vec<String>, RunSummary)> {
        let start = Instant::now();
        let records = decode_records(bytes, self.config.input_format)?;
        self.extract_since(records, start).await
    }

    /// Read `input`, extract, and write the values to `output`.
    ///
    /// The output file is only created once extraction has produced values.
    /// The reported elapsed time covers reading through writing.
    pub async fn run_file(&self, input: &Path, output: &Path) -> Result<RunSummary> {
        let start = Instant::now();
        info!(path = %input.display(), "Reading input");

        let path = input.to_path_buf();
        let format = self.config.input_format;
        let records = match tokio::task::spawn_blocking(move || read_records(path, format)).await {
            Ok(records) => records?,
            Err(err) => std::panic::resume_unwind(err.into_panic()),
        };

        let (values, summary) = self.extract_since(records, start).await?;
        LineSink::create(output)?.write_lines(&values)?;
        info!(path = %output.display(), "Wrote output");

        let summary = summary.with_elapsed(start.elapsed());
        log_summary(&summary);
        Ok(summary)
    }

    async fn extract_since(
        &self,
        records: Vec<Value>,
        start: Instant,
    ) -> Result<(Vec<String>, RunSummary)> {
        let total_records = records.len();
        info!(records = total_records, "Parsed records");

        let records: Arc<[Value]> = records.into();
        let chunks = chunk_records(records, self.config.chunk_size)?;
        info!(
            chunks = chunks.len(),
            chunk_size = self.config.chunk_size,
            max_concurrency = self.pool.max_concurrency(),
            "Processing chunks"
        );

        let output = self.pool.run(chunks).await?;
        info!(extracted = output.results.total(), "Extraction finished");

        match aggregate(
            output.results,
            &self.config.target_key,
            total_records,
            start.elapsed(),
        ) {
            Ok((values, summary)) => {
                Ok((values, summary.with_peak_concurrency(output.peak_concurrency)))
            }
            Err(err @ SiftError::EmptyResult { .. }) => {
                warn!(key = %self.config.target_key, records = total_records, "No values found");
                Err(err)
            }
            Err(err) => Err(err),
        }
    }
}

fn log_summary(summary: &RunSummary) {
    info!(
        total_records = summary.total_records,
        total_extracted = summary.total_extracted,
        total_chunks = summary.total_chunks,
        elapsed_secs = summary.elapsed.as_secs_f64(),
        "Run complete"
    );
    match summary.throughput {
        Some(rate) => info!("Throughput: {:.2} values/sec", rate),
        None => info!("Throughput: n/a (no measurable elapsed time)"),
    }
}
