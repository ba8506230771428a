//! Flattening per-chunk results and computing run statistics

use crate::error::{Result, SiftError};
use crate::types::{ChunkResults, RunSummary};
use std::time::Duration;

/// Concatenate chunk results in ascending chunk index and summarize the run.
///
/// Fails with [`SiftError::EmptyResult`] when no values were extracted.
pub fn aggregate(
    results: ChunkResults,
    target_key: &str,
    total_records: usize,
    elapsed: Duration,
) -> Result<(Vec<String>, RunSummary)> {
    let total_chunks = results.len();
    let mut values = Vec::with_capacity(results.total());
    for slot in results.into_slots() {
        values.extend(slot);
    }

    if values.is_empty() {
        return Err(SiftError::EmptyResult {
            key: target_key.to_string(),
            records: total_records,
        });
    }

    let summary = RunSummary::new(total_records, values.len(), total_chunks, elapsed);
    Ok((values, summary))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_flatten_in_chunk_order() {
        let results = ChunkResults::from_slots(vec![
            strings(&["a", "b"]),
            Vec::new(),
            strings(&["c"]),
        ]);

        let (values, summary) =
            aggregate(results, "description", 5, Duration::from_millis(500)).unwrap();

        assert_eq!(values, vec!["a", "b", "c"]);
        assert_eq!(summary.total_records, 5);
        assert_eq!(summary.total_extracted, 3);
        assert_eq!(summary.total_chunks, 3);
        assert_eq!(summary.throughput, Some(6.0));
        assert!(summary.success);
    }

    #[test]
    fn test_empty_result() {
        let results = ChunkResults::from_slots(vec![Vec::new(), Vec::new()]);
        let err = aggregate(results, "description", 3, Duration::from_secs(1)).unwrap_err();

        assert_eq!(err.kind(), "empty_result");
        assert!(err.to_string().contains("description"));
    }

    #[test]
    fn test_no_chunks_is_empty_result() {
        let err = aggregate(ChunkResults::default(), "description", 0, Duration::ZERO)
            .unwrap_err();
        assert!(matches!(err, SiftError::EmptyResult { records: 0, .. }));
    }

    #[test]
    fn test_zero_elapsed_has_no_throughput() {
        let results = ChunkResults::from_slots(vec![strings(&["x"])]);
        let (_, summary) = aggregate(results, "description", 1, Duration::ZERO).unwrap();
        assert_eq!(summary.throughput, None);
    }
}
