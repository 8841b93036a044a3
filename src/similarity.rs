//! Incremental similarity scan against the stored corpus.
//!
//! The scan paginates the store in fixed-size batches, asks the model one
//! comparison question per batch, and short-circuits on the first batch
//! whose response contains "YES". Spacing between consecutive model calls
//! goes through an injectable [`Pacer`] so the production 15-second gap
//! (a crude backpressure concession to a rate-limited collaborator, not a
//! real backoff scheme) disappears in tests.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, instrument};

use crate::error::StoreError;
use crate::llm::{generate_or_fallback, GenerateText};
use crate::models::Candidate;
use crate::prompts;
use crate::store::ArticleStore;

/// Corpus records per comparison prompt.
pub const BATCH_SIZE: usize = 60;

/// Production spacing between consecutive batch calls.
pub const BATCH_DELAY: Duration = Duration::from_secs(15);

/// Spacing policy between consecutive model calls within one scan.
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self);
}

/// Sleeps a fixed duration; `Duration::ZERO` makes it a no-op.
pub struct FixedDelay(pub Duration);

#[async_trait]
impl Pacer for FixedDelay {
    async fn pause(&self) {
        if !self.0.is_zero() {
            sleep(self.0).await;
        }
    }
}

/// Decides whether a candidate's topic is already covered by the corpus.
pub struct SimilarityScanner {
    llm: Arc<dyn GenerateText>,
    pacer: Arc<dyn Pacer>,
    batch_size: usize,
}

impl SimilarityScanner {
    pub fn new(llm: Arc<dyn GenerateText>, pacer: Arc<dyn Pacer>) -> Self {
        Self {
            llm,
            pacer,
            batch_size: BATCH_SIZE,
        }
    }

    /// Scan the corpus in insertion order. Returns `true` as soon as a
    /// batch response contains "YES"; later batches are never consulted.
    /// An exhausted corpus (empty batch) is definitive "no duplicate".
    /// A failed model call degrades to the no-match fallback for that
    /// batch; store read errors propagate.
    #[instrument(level = "info", skip_all, fields(url = %candidate.url))]
    pub async fn is_duplicate(
        &self,
        candidate: &Candidate,
        store: &dyn ArticleStore,
    ) -> Result<bool, StoreError> {
        let mut offset = 0usize;
        loop {
            let batch = store.page(offset, self.batch_size).await?;
            if batch.is_empty() {
                info!(offset, "Corpus exhausted; no similar topic found");
                return Ok(false);
            }
            if offset > 0 {
                // Inter-call spacing; the first call goes out immediately.
                self.pacer.pause().await;
            }

            let prompt = prompts::similarity_batch(candidate, &batch);
            let response = generate_or_fallback(self.llm.as_ref(), &prompt).await;
            debug!(offset, batch_len = batch.len(), "Scanned corpus batch");

            if response.contains("YES") {
                info!(offset, "Similar topic found; stopping scan");
                return Ok(true);
            }
            offset += self.batch_size;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerativeError;
    use crate::store::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedModel {
        /// Response returned for call N; past the end, the last entry repeats.
        responses: Vec<Result<String, ()>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl GenerateText for ScriptedModel {
        async fn generate(&self, _prompt: &str) -> Result<String, GenerativeError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            let idx = n.min(self.responses.len() - 1);
            match &self.responses[idx] {
                Ok(text) => Ok(text.clone()),
                Err(()) => Err(GenerativeError::EmptyResponse),
            }
        }
    }

    struct CountingPacer(AtomicUsize);

    #[async_trait]
    impl Pacer for CountingPacer {
        async fn pause(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn candidate() -> Candidate {
        Candidate {
            title: "New headline".to_string(),
            url: "https://e.com/new".to_string(),
            category: "World".to_string(),
            body: "Fresh body".to_string(),
        }
    }

    async fn seeded_store(n: usize) -> MemoryStore {
        let store = MemoryStore::new();
        for i in 0..n {
            store
                .insert(&Candidate {
                    title: format!("Old {i}"),
                    url: format!("https://e.com/old/{i}"),
                    category: "World".to_string(),
                    body: "Old body".to_string(),
                })
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn empty_corpus_makes_no_model_calls() {
        let model = Arc::new(ScriptedModel {
            responses: vec![Ok("YES".to_string())],
            calls: AtomicUsize::new(0),
        });
        let scanner = SimilarityScanner::new(model.clone(), Arc::new(FixedDelay(Duration::ZERO)));
        let store = MemoryStore::new();
        let dup = scanner.is_duplicate(&candidate(), &store).await.unwrap();
        assert!(!dup);
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn yes_in_first_batch_short_circuits() {
        // Two batches' worth of records; "YES" on the first call must stop
        // the scan before the second.
        let model = Arc::new(ScriptedModel {
            responses: vec![Ok("YES".to_string())],
            calls: AtomicUsize::new(0),
        });
        let scanner = SimilarityScanner::new(model.clone(), Arc::new(FixedDelay(Duration::ZERO)));
        let store = seeded_store(BATCH_SIZE + 1).await;
        let dup = scanner.is_duplicate(&candidate(), &store).await.unwrap();
        assert!(dup);
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn full_scan_without_match_returns_not_duplicate() {
        let model = Arc::new(ScriptedModel {
            responses: vec![Ok("NO".to_string())],
            calls: AtomicUsize::new(0),
        });
        let pacer = Arc::new(CountingPacer(AtomicUsize::new(0)));
        let scanner = SimilarityScanner::new(model.clone(), pacer.clone());
        let store = seeded_store(BATCH_SIZE + 1).await;
        let dup = scanner.is_duplicate(&candidate(), &store).await.unwrap();
        assert!(!dup);
        assert_eq!(model.calls.load(Ordering::SeqCst), 2);
        // One pause between the two calls, none before the first.
        assert_eq!(pacer.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_model_call_counts_as_no_match() {
        let model = Arc::new(ScriptedModel {
            responses: vec![Err(()), Ok("YES".to_string())],
            calls: AtomicUsize::new(0),
        });
        let scanner = SimilarityScanner::new(model.clone(), Arc::new(FixedDelay(Duration::ZERO)));
        let store = seeded_store(BATCH_SIZE + 1).await;
        // First batch degrades to the fallback (no match), second says YES.
        let dup = scanner.is_duplicate(&candidate(), &store).await.unwrap();
        assert!(dup);
        assert_eq!(model.calls.load(Ordering::SeqCst), 2);
    }
}
