//! Error taxonomy for the pipeline.
//!
//! Each stage owns a small `thiserror` enum; the orchestrator and scheduler
//! work in `anyhow` and decide what is fatal for an article, a source, or a
//! run. Only `PublishError` carries special meaning upstream: it is the
//! signal for the compensating store delete.

use thiserror::Error;

/// Failures while fetching or parsing a news site.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Failures in the persistent article store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io: {0}")]
    Io(#[from] std::io::Error),

    #[error("store serialization: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("no stored article with id {0}")]
    MissingRecord(u64),

    #[error("article already stored for url {0}")]
    DuplicateUrl(String),
}

/// Failures talking to the generative text model.
#[derive(Debug, Error)]
pub enum GenerativeError {
    #[error("model request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model returned no candidates")]
    EmptyResponse,
}

/// Any failure inside the publish sequence, including the overall budget
/// expiring. The caller compensates; the publisher never rolls back.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("seo metadata generation failed: {0}")]
    Seo(#[source] GenerativeError),

    #[error("seo metadata was not valid json: {0}")]
    SeoParse(#[source] serde_json::Error),

    #[error("summary generation failed: {0}")]
    Summary(#[source] GenerativeError),

    #[error("cms request failed: {0}")]
    Cms(#[from] CmsError),

    #[error("publish exceeded the {budget_secs}s budget")]
    Timeout { budget_secs: u64 },
}

/// Failures from the CMS REST surface.
#[derive(Debug, Error)]
pub enum CmsError {
    #[error("cms http: {0}")]
    Http(#[from] reqwest::Error),

    #[error("cms rejected {what}: status {status}")]
    Rejected { what: &'static str, status: u16 },
}
