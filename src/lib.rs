//! # Keysift - Bounded-Concurrency Key Extraction
//!
//! Finds every string value stored under one key, at any nesting depth,
//! across a large array of JSON records.
//!
//! ## Pipeline
//!
//! - **decode**: parse the input blob into records (simd-json, or NDJSON)
//! - **chunk**: split records into contiguous, index-tagged chunks
//! - **extractor**: depth-first search of one record for the target key
//! - **pool**: run the extractor over chunks with a fixed number of permits
//! - **aggregate**: flatten results in chunk order and compute statistics
//! - **sink**: write the values as newline-separated text
//!
//! Output order is the chunk order, not task completion order, so it does
//! not depend on the concurrency setting.
//!
//! ## Quick Start
//!
//! ```rust
//! use keysift::{Pipeline, SiftConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let input = br#"[{"description": "a"}, {"steps": [{"description": "b"}]}]"#.to_vec();
//!
//! let pipeline = Pipeline::new(SiftConfig::default())?;
//! let (values, summary) = pipeline.run_bytes(input).await?;
//!
//! assert_eq!(values, vec!["a", "b"]);
//! assert_eq!(summary.total_records, 2);
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod chunk;
pub mod decode;
pub mod error;
pub mod extractor;
pub mod pipeline;
pub mod pool;
pub mod sink;
pub mod types;

// Re-export commonly used types for convenience
pub use aggregate::aggregate;
pub use chunk::{chunk_records, Chunk};
pub use decode::{decode_records, read_records};
pub use error::{Result, SiftError};
pub use extractor::KeyExtractor;
pub use pipeline::Pipeline;
pub use pool::{PoolOutput, WorkerPool};
pub use sink::LineSink;
pub use types::{ChunkResults, InputFormat, RunReport, RunSummary, SiftConfig};
