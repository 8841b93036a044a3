//! Per-source orchestration.
//!
//! For every listing not already in the store: extract, persist a
//! provisional record, scan for duplicates, resolve categories, publish.
//! Publish failure triggers the compensating delete of the provisional
//! record so the URL becomes eligible again on a later run. A duplicate
//! leaves the record in place permanently — "already covered" topics are
//! treated as seen and never revisited.
//!
//! Errors inside one article's processing are caught here and never abort
//! the remaining articles or sources.

use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::categories::CategoryResolver;
use crate::models::Listing;
use crate::publisher::Publisher;
use crate::scrapers::NewsSource;
use crate::similarity::SimilarityScanner;
use crate::store::ArticleStore;

/// Terminal state of one listing's trip through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// URL already in the store; nothing fetched.
    AlreadySeen,
    /// Extraction produced no usable title/body.
    NoContent,
    /// Similar topic already covered; provisional record kept, no post.
    Duplicate,
    /// Category list came back empty; stored, nothing to publish.
    NoCategories,
    Published(u64),
    /// Publish failed; provisional record deleted.
    RolledBack,
}

/// Per-source run counters for the run log line.
#[derive(Debug, Default, Clone, Copy)]
pub struct SourceStats {
    pub already_seen: usize,
    pub no_content: usize,
    pub duplicates: usize,
    pub no_categories: usize,
    pub published: usize,
    pub rolled_back: usize,
    pub errors: usize,
}

impl SourceStats {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::AlreadySeen => self.already_seen += 1,
            Outcome::NoContent => self.no_content += 1,
            Outcome::Duplicate => self.duplicates += 1,
            Outcome::NoCategories => self.no_categories += 1,
            Outcome::Published(_) => self.published += 1,
            Outcome::RolledBack => self.rolled_back += 1,
        }
    }
}

pub struct Pipeline {
    http: reqwest::Client,
    store: Arc<dyn ArticleStore>,
    scanner: SimilarityScanner,
    resolver: CategoryResolver,
    publisher: Publisher,
}

impl Pipeline {
    pub fn new(
        http: reqwest::Client,
        store: Arc<dyn ArticleStore>,
        scanner: SimilarityScanner,
        resolver: CategoryResolver,
        publisher: Publisher,
    ) -> Self {
        Self {
            http,
            store,
            scanner,
            resolver,
            publisher,
        }
    }

    /// One full run: every source, strictly sequentially. Source-level
    /// failures are logged and do not stop later sources.
    pub async fn run(&self, sources: &[Box<dyn NewsSource>]) {
        for source in sources {
            if let Err(e) = self.run_source(source.as_ref()).await {
                error!(source = source.name(), error = %e, "Source run failed");
            }
        }
    }

    /// Process one source's listings, strictly sequentially.
    #[instrument(level = "info", skip_all, fields(source = source.name()))]
    pub async fn run_source(&self, source: &dyn NewsSource) -> anyhow::Result<SourceStats> {
        let listings = source.list(&self.http).await?;
        let mut stats = SourceStats::default();

        for listing in &listings {
            match self.process_listing(source, listing).await {
                Ok(outcome) => stats.record(outcome),
                Err(e) => {
                    warn!(url = %listing.url, error = %e, "Article processing failed; continuing");
                    stats.errors += 1;
                }
            }
        }

        info!(
            listings = listings.len(),
            published = stats.published,
            duplicates = stats.duplicates,
            already_seen = stats.already_seen,
            no_content = stats.no_content,
            no_categories = stats.no_categories,
            rolled_back = stats.rolled_back,
            errors = stats.errors,
            "Source run complete"
        );
        Ok(stats)
    }

    async fn process_listing(
        &self,
        source: &dyn NewsSource,
        listing: &Listing,
    ) -> anyhow::Result<Outcome> {
        if self.store.find_by_url(&listing.url).await?.is_some() {
            return Ok(Outcome::AlreadySeen);
        }

        let Some(candidate) = source.extract(&self.http, listing).await? else {
            return Ok(Outcome::NoContent);
        };

        // Provisional record first, so this URL is never fetched again
        // even if the rest of this iteration fails.
        let article_id = self.store.insert(&candidate).await?;

        if self.scanner.is_duplicate(&candidate, self.store.as_ref()).await? {
            info!(url = %candidate.url, "Topic already covered; keeping record, skipping publish");
            return Ok(Outcome::Duplicate);
        }

        let labels = self.resolver.resolve(&candidate).await?;
        if labels.is_empty() {
            info!(url = %candidate.url, "No categories resolved; nothing to publish");
            return Ok(Outcome::NoCategories);
        }

        match self
            .publisher
            .publish(&candidate.title, &candidate.body, &labels)
            .await
        {
            Ok(post_id) => {
                info!(url = %candidate.url, post_id, "Published");
                Ok(Outcome::Published(post_id))
            }
            Err(e) => {
                warn!(url = %candidate.url, error = %e, "Publish failed; compensating store delete");
                self.store.delete(article_id).await?;
                Ok(Outcome::RolledBack)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cms::{Cms, NewPost, Term};
    use crate::error::{CmsError, FetchError, GenerativeError};
    use crate::image::TextToImage;
    use crate::llm::GenerateText;
    use crate::models::Candidate;
    use crate::similarity::{FixedDelay, SimilarityScanner};
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Source with one scripted article.
    struct OneArticleSource {
        listing: Listing,
        candidate: Option<Candidate>,
        extract_calls: AtomicUsize,
    }

    impl OneArticleSource {
        fn new(url: &str) -> Self {
            Self {
                listing: Listing {
                    url: url.to_string(),
                    category: "World".to_string(),
                    title: Some("Headline".to_string()),
                },
                candidate: Some(Candidate {
                    title: "Headline".to_string(),
                    url: url.to_string(),
                    category: "World".to_string(),
                    body: "Body".to_string(),
                }),
                extract_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl NewsSource for OneArticleSource {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn list(&self, _http: &reqwest::Client) -> Result<Vec<Listing>, FetchError> {
            Ok(vec![self.listing.clone()])
        }

        async fn extract(
            &self,
            _http: &reqwest::Client,
            _listing: &Listing,
        ) -> Result<Option<Candidate>, FetchError> {
            self.extract_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.candidate.clone())
        }
    }

    /// Routes each prompt kind to a scripted answer.
    struct RoutingModel {
        similarity: &'static str,
        categories: &'static str,
    }

    #[async_trait]
    impl GenerateText for RoutingModel {
        async fn generate(&self, prompt: &str) -> Result<String, GenerativeError> {
            if prompt.contains("similar to existing topics") {
                Ok(self.similarity.to_string())
            } else if prompt.contains("determines the categories") {
                Ok(self.categories.to_string())
            } else if prompt.contains("SEO-optimized") {
                Ok(r#"{"keywords": "k1, k2", "optimized_title": "T", "meta_description": "D"}"#
                    .to_string())
            } else {
                Ok("summary text".to_string())
            }
        }
    }

    struct NoImage;

    #[async_trait]
    impl TextToImage for NoImage {
        async fn synthesize(&self, _prompt: &str) -> Result<Vec<u8>, GenerativeError> {
            Err(GenerativeError::EmptyResponse)
        }
    }

    /// CMS that counts post-create calls and optionally refuses them.
    struct StubCms {
        post_creates: AtomicUsize,
        fail_posts: bool,
    }

    #[async_trait]
    impl Cms for StubCms {
        async fn search_category(&self, _name: &str) -> Result<Option<Term>, CmsError> {
            Ok(Some(Term {
                id: 1,
                name: "any".to_string(),
            }))
        }
        async fn create_category(&self, name: &str) -> Result<Term, CmsError> {
            Ok(Term {
                id: 2,
                name: name.to_string(),
            })
        }
        async fn search_tag(&self, _name: &str) -> Result<Option<Term>, CmsError> {
            Ok(Some(Term {
                id: 3,
                name: "any".to_string(),
            }))
        }
        async fn create_tag(&self, name: &str) -> Result<Term, CmsError> {
            Ok(Term {
                id: 4,
                name: name.to_string(),
            })
        }
        async fn upload_media(&self, _png: Vec<u8>) -> Result<u64, CmsError> {
            Ok(500)
        }
        async fn create_post(&self, _post: &NewPost) -> Result<u64, CmsError> {
            self.post_creates.fetch_add(1, Ordering::SeqCst);
            if self.fail_posts {
                Err(CmsError::Rejected {
                    what: "post create",
                    status: 500,
                })
            } else {
                Ok(77)
            }
        }
    }

    fn pipeline(
        store: Arc<MemoryStore>,
        model: RoutingModel,
        cms: Arc<StubCms>,
    ) -> Pipeline {
        let llm: Arc<dyn GenerateText> = Arc::new(model);
        Pipeline::new(
            reqwest::Client::new(),
            store,
            SimilarityScanner::new(llm.clone(), Arc::new(FixedDelay(Duration::ZERO))),
            CategoryResolver::new(llm.clone()),
            Publisher::new(cms, llm, Arc::new(NoImage)),
        )
    }

    #[tokio::test]
    async fn stored_urls_are_not_re_extracted() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert(&Candidate {
                title: "Headline".to_string(),
                url: "https://e.com/a".to_string(),
                category: "World".to_string(),
                body: "Body".to_string(),
            })
            .await
            .unwrap();

        let cms = Arc::new(StubCms {
            post_creates: AtomicUsize::new(0),
            fail_posts: false,
        });
        let source = OneArticleSource::new("https://e.com/a");
        let p = pipeline(
            store.clone(),
            RoutingModel {
                similarity: "NO",
                categories: "World",
            },
            cms,
        );

        let stats = p.run_source(&source).await.unwrap();
        assert_eq!(stats.already_seen, 1);
        assert_eq!(source.extract_calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn duplicate_keeps_record_and_skips_publish() {
        let store = Arc::new(MemoryStore::new());
        // One prior record so the scanner has a corpus to match against.
        store
            .insert(&Candidate {
                title: "Old".to_string(),
                url: "https://e.com/old".to_string(),
                category: "World".to_string(),
                body: "Old body".to_string(),
            })
            .await
            .unwrap();

        let cms = Arc::new(StubCms {
            post_creates: AtomicUsize::new(0),
            fail_posts: false,
        });
        let source = OneArticleSource::new("https://e.com/new");
        let p = pipeline(
            store.clone(),
            RoutingModel {
                similarity: "YES",
                categories: "World",
            },
            cms.clone(),
        );

        let stats = p.run_source(&source).await.unwrap();
        assert_eq!(stats.duplicates, 1);
        assert_eq!(cms.post_creates.load(Ordering::SeqCst), 0);
        // Provisional record stays; the topic is permanently "seen".
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn empty_category_list_is_stored_but_never_published() {
        let store = Arc::new(MemoryStore::new());
        let cms = Arc::new(StubCms {
            post_creates: AtomicUsize::new(0),
            fail_posts: false,
        });
        let source = OneArticleSource::new("https://e.com/a");
        let p = pipeline(
            store.clone(),
            RoutingModel {
                similarity: "NO",
                categories: "\n, ,\n",
            },
            cms.clone(),
        );

        let stats = p.run_source(&source).await.unwrap();
        assert_eq!(stats.no_categories, 1);
        assert_eq!(cms.post_creates.load(Ordering::SeqCst), 0);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn publish_failure_deletes_provisional_record() {
        let store = Arc::new(MemoryStore::new());
        let cms = Arc::new(StubCms {
            post_creates: AtomicUsize::new(0),
            fail_posts: true,
        });
        let source = OneArticleSource::new("https://e.com/a");
        let p = pipeline(
            store.clone(),
            RoutingModel {
                similarity: "NO",
                categories: "World",
            },
            cms.clone(),
        );

        let stats = p.run_source(&source).await.unwrap();
        assert_eq!(stats.rolled_back, 1);
        assert_eq!(cms.post_creates.load(Ordering::SeqCst), 1);
        // Compensating delete removed the record; the URL is retryable.
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn successful_publish_leaves_record_in_place() {
        let store = Arc::new(MemoryStore::new());
        let cms = Arc::new(StubCms {
            post_creates: AtomicUsize::new(0),
            fail_posts: false,
        });
        let source = OneArticleSource::new("https://e.com/a");
        let p = pipeline(
            store.clone(),
            RoutingModel {
                similarity: "NO",
                categories: "World, India",
            },
            cms.clone(),
        );

        let stats = p.run_source(&source).await.unwrap();
        assert_eq!(stats.published, 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn extraction_without_content_is_a_skip_not_a_store() {
        let store = Arc::new(MemoryStore::new());
        let cms = Arc::new(StubCms {
            post_creates: AtomicUsize::new(0),
            fail_posts: false,
        });
        let mut source = OneArticleSource::new("https://e.com/a");
        source.candidate = None;
        let p = pipeline(
            store.clone(),
            RoutingModel {
                similarity: "NO",
                categories: "World",
            },
            cms,
        );

        let stats = p.run_source(&source).await.unwrap();
        assert_eq!(stats.no_content, 1);
        assert_eq!(store.len().await, 0);
    }
}
