use serde::Serialize;
use std::time::Duration;

use crate::error::{Result, SiftError};

/// Layout of the input blob
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputFormat {
    /// A single top-level JSON array; each element is a record
    #[default]
    Array,
    /// Newline-delimited JSON; each non-empty line is a record
    Ndjson,
}

/// Configuration for one extraction run
#[derive(Debug, Clone)]
pub struct SiftConfig {
    /// Records per chunk (the last chunk may be smaller)
    pub chunk_size: usize,

    /// Maximum number of chunks being extracted at once
    pub max_concurrency: usize,

    /// Key whose string values are collected
    pub target_key: String,

    /// How the input blob is laid out
    pub input_format: InputFormat,
}

impl Default for SiftConfig {
    fn default() -> Self {
        SiftConfig {
            chunk_size: 50,
            max_concurrency: 10,
            target_key: String::from("description"),
            input_format: InputFormat::Array,
        }
    }
}

impl SiftConfig {
    pub fn with_target_key(mut self, key: impl Into<String>) -> Self {
        self.target_key = key.into();
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    /// Reject settings that would make the run meaningless
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size < 1 {
            return Err(SiftError::invalid_config("chunk_size must be at least 1"));
        }
        if self.max_concurrency < 1 {
            return Err(SiftError::invalid_config(
                "max_concurrency must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Per-chunk extracted values, one slot per chunk index
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkResults {
    slots: Vec<Vec<String>>,
}

impl ChunkResults {
    pub fn from_slots(slots: Vec<Vec<String>>) -> Self {
        ChunkResults { slots }
    }

    /// Values extracted from chunk `index`
    pub fn get(&self, index: usize) -> Option<&[String]> {
        self.slots.get(index).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Total number of values across all chunks
    pub fn total(&self) -> usize {
        self.slots.iter().map(Vec::len).sum()
    }

    pub(crate) fn into_slots(self) -> Vec<Vec<String>> {
        self.slots
    }
}

/// Statistics for a finished run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub total_records: usize,
    pub total_extracted: usize,
    pub total_chunks: usize,
    pub elapsed: Duration,

    /// Extracted values per second; `None` when no measurable time elapsed
    pub throughput: Option<f64>,

    /// Highest number of chunks extracted simultaneously
    pub peak_concurrency: usize,

    pub success: bool,
}

impl RunSummary {
    pub fn new(
        total_records: usize,
        total_extracted: usize,
        total_chunks: usize,
        elapsed: Duration,
    ) -> Self {
        let secs = elapsed.as_secs_f64();
        let throughput = if secs > 0.0 {
            Some(total_extracted as f64 / secs)
        } else {
            None
        };

        RunSummary {
            total_records,
            total_extracted,
            total_chunks,
            elapsed,
            throughput,
            peak_concurrency: 0,
            success: true,
        }
    }

    /// Replace the elapsed time, recomputing throughput
    pub fn with_elapsed(self, elapsed: Duration) -> Self {
        let peak = self.peak_concurrency;
        RunSummary::new(
            self.total_records,
            self.total_extracted,
            self.total_chunks,
            elapsed,
        )
        .with_peak_concurrency(peak)
    }

    pub fn with_peak_concurrency(mut self, peak: usize) -> Self {
        self.peak_concurrency = peak;
        self
    }
}

/// Serializable report of a run, as printed by the CLI
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub input_file: String,
    pub output_file: String,
    pub total_routes: usize,
    pub total_descriptions: usize,
    pub total_chunks: usize,
    #[serde(rename = "processing_time_seconds")]
    pub processing_time: f64,
    pub descriptions_per_second: Option<f64>,
    pub peak_concurrency: usize,
    pub success: bool,
}

impl RunReport {
    pub fn new(
        input_file: impl Into<String>,
        output_file: impl Into<String>,
        summary: &RunSummary,
    ) -> Self {
        RunReport {
            input_file: input_file.into(),
            output_file: output_file.into(),
            total_routes: summary.total_records,
            total_descriptions: summary.total_extracted,
            total_chunks: summary.total_chunks,
            processing_time: summary.elapsed.as_secs_f64(),
            descriptions_per_second: summary.throughput,
            peak_concurrency: summary.peak_concurrency,
            success: summary.success,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SiftConfig::default();
        assert_eq!(config.chunk_size, 50);
        assert_eq!(config.max_concurrency, 10);
        assert_eq!(config.target_key, "description");
        assert_eq!(config.input_format, InputFormat::Array);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero() {
        let err = SiftConfig::default().with_chunk_size(0).validate().unwrap_err();
        assert_eq!(err.kind(), "invalid_configuration");

        let err = SiftConfig::default()
            .with_max_concurrency(0)
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("max_concurrency"));
    }

    #[test]
    fn test_throughput_zero_elapsed() {
        let summary = RunSummary::new(10, 10, 1, Duration::ZERO);
        assert_eq!(summary.throughput, None);

        let summary = RunSummary::new(10, 10, 1, Duration::from_secs(2));
        assert_eq!(summary.throughput, Some(5.0));
    }

    #[test]
    fn test_report_field_names() {
        let summary = RunSummary::new(500, 500, 10, Duration::from_secs(1));
        let report = RunReport::new("routes-large.json", "descriptions.txt", &summary);
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["total_routes"], 500);
        assert_eq!(json["total_descriptions"], 500);
        assert_eq!(json["total_chunks"], 10);
        assert_eq!(json["processing_time_seconds"], 1.0);
        assert_eq!(json["success"], true);
    }
}
