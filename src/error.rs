//! Typed errors for an extraction run.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by a run. None of them are retried inside the crate.
#[derive(Debug, Error)]
pub enum SiftError {
    /// Input bytes are not a well-formed nested collection
    #[error("failed to decode input: {message}")]
    Decode {
        message: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Chunk size or concurrency below one
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },

    /// Decoding succeeded but nothing was found under the target key
    #[error("no values found under key \"{key}\" in {records} records")]
    EmptyResult { key: String, records: usize },

    /// Persisting the extracted values failed
    #[error("failed to write output {target}: {source}")]
    SinkWrite {
        target: String,
        #[source]
        source: std::io::Error,
    },

    /// Reading the input blob failed
    #[error("failed to read input {path}: {source}")]
    InputRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SiftError {
    pub(crate) fn decode<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        SiftError::Decode {
            message: message.into(),
            source: Box::new(source),
        }
    }

    pub(crate) fn invalid_config(reason: impl Into<String>) -> Self {
        SiftError::InvalidConfiguration {
            reason: reason.into(),
        }
    }

    /// Stable name of the error kind, used in logs and run reports
    pub fn kind(&self) -> &'static str {
        match self {
            SiftError::Decode { .. } => "decode_error",
            SiftError::InvalidConfiguration { .. } => "invalid_configuration",
            SiftError::EmptyResult { .. } => "empty_result",
            SiftError::SinkWrite { .. } => "sink_write_error",
            SiftError::InputRead { .. } => "input_read_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, SiftError>;
