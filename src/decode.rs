//! Decoding raw input bytes into records
//!
//! Top-level arrays go through simd-json, which deserializes straight into
//! `serde_json::Value` so the rest of the crate works with one value type.
//! NDJSON input is parsed line by line with serde_json.

use crate::error::{Result, SiftError};
use crate::types::InputFormat;
use serde_json::Value;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Deepest array/object nesting accepted, counting the top-level array.
///
/// Matches serde_json's recursion limit so both input formats agree.
pub const MAX_NESTING_DEPTH: usize = 128;

/// Input nests deeper than [`MAX_NESTING_DEPTH`]
#[derive(Debug, Error)]
#[error("nesting exceeds {limit} levels at byte {offset}")]
pub struct NestingTooDeep {
    pub limit: usize,
    pub offset: usize,
}

/// Decode an input blob into its top-level records.
///
/// The buffer is taken by value because simd-json parses in place.
pub fn decode_records(mut bytes: Vec<u8>, format: InputFormat) -> Result<Vec<Value>> {
    match format {
        InputFormat::Array => {
            check_nesting_depth(&bytes, MAX_NESTING_DEPTH)
                .map_err(|e| SiftError::decode("input nests too deeply", e))?;
            let records: Vec<Value> = simd_json::serde::from_slice(&mut bytes)
                .map_err(|e| SiftError::decode("expected a JSON array of records", e))?;
            Ok(records)
        }
        InputFormat::Ndjson => decode_ndjson(&bytes),
    }
}

/// Scan brackets outside string literals and fail once nesting passes `limit`.
///
/// simd-json recurses without a bound while deserializing, so the depth is
/// checked before handing it the buffer.
fn check_nesting_depth(bytes: &[u8], limit: usize) -> std::result::Result<(), NestingTooDeep> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &byte) in bytes.iter().enumerate() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'[' | b'{' => {
                depth += 1;
                if depth > limit {
                    return Err(NestingTooDeep { limit, offset });
                }
            }
            b']' | b'}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }

    Ok(())
}

fn decode_ndjson(bytes: &[u8]) -> Result<Vec<Value>> {
    let content = std::str::from_utf8(bytes)
        .map_err(|e| SiftError::decode("NDJSON input is not valid UTF-8", e))?;

    let mut records = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(line)
            .map_err(|e| SiftError::decode(format!("malformed JSON on line {}", idx + 1), e))?;
        records.push(value);
    }

    Ok(records)
}

/// Read a file and decode it into records
pub fn read_records<P: AsRef<Path>>(path: P, format: InputFormat) -> Result<Vec<Value>> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| SiftError::InputRead {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), bytes = bytes.len(), "Read input");

    decode_records(bytes, format)
}
