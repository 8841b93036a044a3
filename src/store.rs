//! The persistent article store, keyed by URL.
//!
//! The store exists to make "have we seen this URL" cheap and durable
//! across runs, and to give the similarity scanner a stable, pageable view
//! of the corpus. [`JsonFileStore`] is the bundled default engine: one JSON
//! document on disk, rewritten on each mutation. It is deliberately simple;
//! the scheduler guarantees a single writer, so no file locking is needed.
//! [`MemoryStore`] backs tests and dry runs.

use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::models::{Article, Candidate};

/// Persistent keyed-by-URL article records.
///
/// `page` must return records in insertion order, stable within a scan, so
/// a paginated reader covers the corpus exactly once.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    async fn find_by_url(&self, url: &str) -> Result<Option<Article>, StoreError>;

    /// Insert a provisional record; returns its id. At most one record may
    /// exist per URL.
    async fn insert(&self, candidate: &Candidate) -> Result<u64, StoreError>;

    /// Compensating delete by id.
    async fn delete(&self, id: u64) -> Result<(), StoreError>;

    async fn page(&self, offset: usize, limit: usize) -> Result<Vec<Article>, StoreError>;
}

#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
struct StoreDocument {
    next_id: u64,
    records: Vec<Article>,
}

impl StoreDocument {
    fn find_by_url(&self, url: &str) -> Option<Article> {
        self.records.iter().find(|a| a.url == url).cloned()
    }

    fn insert(&mut self, candidate: &Candidate) -> Result<u64, StoreError> {
        if self.records.iter().any(|a| a.url == candidate.url) {
            return Err(StoreError::DuplicateUrl(candidate.url.clone()));
        }
        self.next_id += 1;
        let id = self.next_id;
        self.records.push(Article {
            id,
            title: candidate.title.clone(),
            url: candidate.url.clone(),
            category: candidate.category.clone(),
            content: candidate.body.clone(),
            scraped_at: Utc::now(),
        });
        Ok(id)
    }

    fn delete(&mut self, id: u64) -> Result<(), StoreError> {
        let before = self.records.len();
        self.records.retain(|a| a.id != id);
        if self.records.len() == before {
            return Err(StoreError::MissingRecord(id));
        }
        Ok(())
    }

    fn page(&self, offset: usize, limit: usize) -> Vec<Article> {
        self.records.iter().skip(offset).take(limit).cloned().collect()
    }
}

/// File-backed store: the whole corpus as one JSON document.
pub struct JsonFileStore {
    path: PathBuf,
    doc: Mutex<StoreDocument>,
}

impl JsonFileStore {
    /// Open an existing store file or start empty if it does not exist.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let doc = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreDocument::default(),
            Err(e) => return Err(e.into()),
        };
        info!(path = %path.display(), records = doc.records.len(), "Opened article store");
        Ok(Self {
            path,
            doc: Mutex::new(doc),
        })
    }

    async fn persist(&self, doc: &StoreDocument) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(doc)?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }
}

#[async_trait]
impl ArticleStore for JsonFileStore {
    async fn find_by_url(&self, url: &str) -> Result<Option<Article>, StoreError> {
        Ok(self.doc.lock().await.find_by_url(url))
    }

    async fn insert(&self, candidate: &Candidate) -> Result<u64, StoreError> {
        let mut doc = self.doc.lock().await;
        let id = doc.insert(candidate)?;
        self.persist(&doc).await?;
        debug!(id, url = %candidate.url, "Stored provisional article");
        Ok(id)
    }

    async fn delete(&self, id: u64) -> Result<(), StoreError> {
        let mut doc = self.doc.lock().await;
        doc.delete(id)?;
        self.persist(&doc).await?;
        debug!(id, "Deleted stored article");
        Ok(())
    }

    async fn page(&self, offset: usize, limit: usize) -> Result<Vec<Article>, StoreError> {
        Ok(self.doc.lock().await.page(offset, limit))
    }
}

/// In-memory store for tests and dry runs.
#[derive(Default)]
pub struct MemoryStore {
    doc: Mutex<StoreDocument>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records; test helper.
    pub async fn len(&self) -> usize {
        self.doc.lock().await.records.len()
    }
}

#[async_trait]
impl ArticleStore for MemoryStore {
    async fn find_by_url(&self, url: &str) -> Result<Option<Article>, StoreError> {
        Ok(self.doc.lock().await.find_by_url(url))
    }

    async fn insert(&self, candidate: &Candidate) -> Result<u64, StoreError> {
        self.doc.lock().await.insert(candidate)
    }

    async fn delete(&self, id: u64) -> Result<(), StoreError> {
        self.doc.lock().await.delete(id)
    }

    async fn page(&self, offset: usize, limit: usize) -> Result<Vec<Article>, StoreError> {
        Ok(self.doc.lock().await.page(offset, limit))
    }
}
