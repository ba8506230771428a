//! Splitting records into contiguous, index-tagged chunks

use crate::error::{Result, SiftError};
use serde_json::Value;
use std::ops::Range;
use std::sync::Arc;

/// A contiguous view over the shared record array.
///
/// Chunks hold a range into the records, never a copy of them, so they can be
/// moved into worker tasks cheaply.
#[derive(Debug, Clone)]
pub struct Chunk {
    index: usize,
    range: Range<usize>,
    records: Arc<[Value]>,
}

impl Chunk {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn range(&self) -> Range<usize> {
        self.range.clone()
    }

    pub fn records(&self) -> &[Value] {
        &self.records[self.range.clone()]
    }

    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

/// Split `records` into chunks of at most `size` elements, in input order.
///
/// Chunk `i` covers `[i * size, min((i + 1) * size, len))`. An empty input
/// yields no chunks.
pub fn chunk_records(records: Arc<[Value]>, size: usize) -> Result<Vec<Chunk>> {
    if size < 1 {
        return Err(SiftError::invalid_config("chunk size must be at least 1"));
    }

    let len = records.len();
    let chunks = (0..len)
        .step_by(size)
        .enumerate()
        .map(|(index, start)| Chunk {
            index,
            range: start..(start + size).min(len),
            records: Arc::clone(&records),
        })
        .collect();

    Ok(chunks)
}
