//! Bounded-concurrency extraction over chunks
//!
//! One tokio task is spawned per chunk. A counting semaphore admits at most
//! `max_concurrency` of them into extraction at a time; the rest wait for a
//! permit. A task that holds a permit runs its extraction on tokio's blocking
//! pool. Each task returns its own values through its join handle, and the
//! handles are awaited in chunk order, so no shared result structure is
//! written concurrently.

use crate::chunk::Chunk;
use crate::error::{Result, SiftError};
use crate::extractor::KeyExtractor;
use crate::types::ChunkResults;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

/// Counting gate limiting how many tasks extract at once
#[derive(Debug)]
pub(crate) struct AdmissionGate {
    permits: Arc<Semaphore>,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl AdmissionGate {
    pub(crate) fn new(max_concurrency: usize) -> Self {
        AdmissionGate {
            permits: Arc::new(Semaphore::new(max_concurrency)),
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Wait for a free slot. The slot is released when the guard drops.
    pub(crate) async fn acquire(self: &Arc<Self>) -> Slot {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .expect("admission gate semaphore is never closed");

        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        Slot {
            gate: Arc::clone(self),
            _permit: permit,
        }
    }

    /// Highest number of slots held at the same time so far
    pub(crate) fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// A held execution slot
pub(crate) struct Slot {
    gate: Arc<AdmissionGate>,
    _permit: OwnedSemaphorePermit,
}

impl Drop for Slot {
    fn drop(&mut self) {
        // Runs before the permit field is dropped, so `active` never
        // exceeds the number of outstanding permits.
        self.gate.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Output of one pool run
#[derive(Debug, Clone)]
pub struct PoolOutput {
    pub results: ChunkResults,
    pub peak_concurrency: usize,
}

/// Runs a [`KeyExtractor`] over chunks with bounded concurrency
#[derive(Debug, Clone)]
pub struct WorkerPool {
    extractor: Arc<KeyExtractor>,
    max_concurrency: usize,
}

impl WorkerPool {
    pub fn new(extractor: KeyExtractor, max_concurrency: usize) -> Result<Self> {
        if max_concurrency < 1 {
            return Err(SiftError::invalid_config(
                "max_concurrency must be at least 1",
            ));
        }

        Ok(WorkerPool {
            extractor: Arc::new(extractor),
            max_concurrency,
        })
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Extract from every chunk and wait for all of them to finish.
    ///
    /// Slot `i` of the returned results holds the values of the chunk with
    /// index `i`, regardless of the order in which tasks completed. The chunk
    /// indices must be exactly `0..chunks.len()`, each appearing once.
    pub async fn run(&self, chunks: Vec<Chunk>) -> Result<PoolOutput> {
        check_indices(&chunks)?;

        let gate = Arc::new(AdmissionGate::new(self.max_concurrency));
        let mut slots: Vec<Vec<String>> = vec![Vec::new(); chunks.len()];

        let handles: Vec<_> = chunks
            .into_iter()
            .map(|chunk| {
                let gate = Arc::clone(&gate);
                let extractor = Arc::clone(&self.extractor);

                tokio::spawn(async move {
                    let slot = gate.acquire().await;
                    let index = chunk.index();

                    // Extraction is CPU-bound; keep it off the async workers.
                    // The slot moves along so the permit is held until it ends.
                    let extracted = tokio::task::spawn_blocking(move || {
                        let _slot = slot;
                        let found = extractor.extract_all(chunk.records());
                        debug!(
                            chunk = index,
                            records = chunk.len(),
                            found = found.len(),
                            "Chunk finished"
                        );
                        found
                    })
                    .await;

                    match extracted {
                        Ok(found) => (index, found),
                        Err(err) => std::panic::resume_unwind(err.into_panic()),
                    }
                })
            })
            .collect();

        for handle in handles {
            // Tasks are never aborted, so a join error can only be a panic.
            let (index, found) = match handle.await {
                Ok(done) => done,
                Err(err) => std::panic::resume_unwind(err.into_panic()),
            };
            slots[index] = found;
        }

        Ok(PoolOutput {
            results: ChunkResults::from_slots(slots),
            peak_concurrency: gate.peak(),
        })
    }
}

/// Reject chunk lists whose indices are not a permutation of `0..len`
fn check_indices(chunks: &[Chunk]) -> Result<()> {
    let mut seen = vec![false; chunks.len()];
    for chunk in chunks {
        let index = chunk.index();
        match seen.get_mut(index) {
            Some(slot) if !*slot => *slot = true,
            Some(_) => {
                return Err(SiftError::invalid_config(format!(
                    "chunk index {} appears more than once",
                    index
                )))
            }
            None => {
                return Err(SiftError::invalid_config(format!(
                    "chunk index {} out of range for {} chunks",
                    index,
                    chunks.len()
                )))
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::chunk_records;
    use serde_json::{json, Value};
    use std::time::Duration;

    fn records(n: usize) -> Arc<[Value]> {
        (0..n)
            .map(|i| json!({"description": format!("d{}", i)}))
            .collect::<Vec<_>>()
            .into()
    }

    fn pool(max_concurrency: usize) -> WorkerPool {
        WorkerPool::new(KeyExtractor::new("description"), max_concurrency).unwrap()
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let err = WorkerPool::new(KeyExtractor::new("description"), 0).unwrap_err();
        assert_eq!(err.kind(), "invalid_configuration");
    }

    #[tokio::test]
    async fn test_results_indexed_by_chunk() {
        let chunks = chunk_records(records(7), 3).unwrap();
        let output = pool(2).run(chunks).await.unwrap();

        assert_eq!(output.results.len(), 3);
        assert_eq!(output.results.get(0).unwrap(), &["d0", "d1", "d2"]);
        assert_eq!(output.results.get(2).unwrap(), &["d6"]);
        assert_eq!(output.results.total(), 7);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_order_independent_of_concurrency() {
        let input: Arc<[Value]> = vec![json!({"description": "a"}), json!({"description": "b"})].into();

        for max in [1, 10] {
            let chunks = chunk_records(Arc::clone(&input), 1).unwrap();
            let output = pool(max).run(chunks).await.unwrap();
            let flat: Vec<String> = (0..output.results.len())
                .flat_map(|i| output.results.get(i).unwrap().to_vec())
                .collect();
            assert_eq!(flat, vec!["a", "b"]);
        }
    }

    #[tokio::test]
    async fn test_no_chunks() {
        let output = pool(4).run(Vec::new()).await.unwrap();
        assert!(output.results.is_empty());
        assert_eq!(output.peak_concurrency, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_peak_never_exceeds_limit() {
        for max in [1, 2, 3, 8] {
            let chunks = chunk_records(records(400), 7).unwrap();
            let output = pool(max).run(chunks).await.unwrap();

            assert!(output.peak_concurrency >= 1);
            assert!(output.peak_concurrency <= max);
            assert_eq!(output.results.total(), 400);
        }
    }

    #[tokio::test]
    async fn test_sub_list_of_chunks_rejected() {
        let chunks = chunk_records(records(10), 2).unwrap();
        let err = pool(2).run(chunks[3..].to_vec()).await.unwrap_err();

        assert_eq!(err.kind(), "invalid_configuration");
        assert!(err.to_string().contains("out of range"));
    }

    #[tokio::test]
    async fn test_duplicate_chunk_index_rejected() {
        let first = chunk_records(records(4), 2).unwrap();
        let second = chunk_records(records(4), 2).unwrap();
        let chunks = vec![first[0].clone(), second[0].clone()];

        let err = pool(2).run(chunks).await.unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[tokio::test]
    async fn test_shuffled_chunk_order_accepted() {
        let mut chunks = chunk_records(records(6), 2).unwrap();
        chunks.reverse();

        let output = pool(2).run(chunks).await.unwrap();
        assert_eq!(output.results.get(0).unwrap(), &["d0", "d1"]);
        assert_eq!(output.results.get(2).unwrap(), &["d4", "d5"]);
    }

    #[tokio::test]
    async fn test_current_thread_runtime_stays_bounded() {
        // Under the single-threaded test runtime extraction still runs on
        // blocking threads, bounded by the same gate.
        let chunks = chunk_records(records(2_000), 10).unwrap();
        let output = pool(4).run(chunks).await.unwrap();

        assert_eq!(output.results.len(), 200);
        assert_eq!(output.results.total(), 2_000);
        assert!(output.peak_concurrency >= 1);
        assert!(output.peak_concurrency <= 4);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_gate_bounds_held_slots() {
        let gate = Arc::new(AdmissionGate::new(3));
        let held = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..12)
            .map(|_| {
                let gate = Arc::clone(&gate);
                let held = Arc::clone(&held);
                let max_seen = Arc::clone(&max_seen);
                tokio::spawn(async move {
                    let _slot = gate.acquire().await;
                    let now = held.fetch_add(1, Ordering::SeqCst) + 1;
                    max_seen.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    held.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap();
        }

        assert!(max_seen.load(Ordering::SeqCst) <= 3);
        assert_eq!(gate.peak(), 3);
    }
}
