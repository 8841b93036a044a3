//! WordPress-style CMS REST client.
//!
//! The consumed surface is small: search/create for categories and tags,
//! media upload, and post creation. The credential pair is held once per
//! client and sent as HTTP basic auth on every request. Find-or-create
//! logic lives in the publisher; this module only exposes the raw calls.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::CmsSettings;
use crate::error::CmsError;

/// A category or tag as the CMS returns it.
#[derive(Debug, Clone, Deserialize)]
pub struct Term {
    pub id: u64,
    pub name: String,
}

/// Body for post creation. Posts go out published, never as drafts.
#[derive(Debug, Clone, Serialize)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub status: String,
    pub categories: Vec<u64>,
    pub tags: Vec<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured_media: Option<u64>,
}

/// The CMS operations the publisher consumes.
#[async_trait]
pub trait Cms: Send + Sync {
    async fn search_category(&self, name: &str) -> Result<Option<Term>, CmsError>;
    async fn create_category(&self, name: &str) -> Result<Term, CmsError>;
    async fn search_tag(&self, name: &str) -> Result<Option<Term>, CmsError>;
    async fn create_tag(&self, name: &str) -> Result<Term, CmsError>;
    /// Upload a PNG; returns the media id.
    async fn upload_media(&self, png: Vec<u8>) -> Result<u64, CmsError>;
    /// Create the post; returns the post id.
    async fn create_post(&self, post: &NewPost) -> Result<u64, CmsError>;
}

#[derive(Deserialize)]
struct Created {
    id: u64,
}

/// Client for the WordPress REST API (`/wp-json/wp/v2`).
pub struct WordPressClient {
    http: reqwest::Client,
    api_root: String,
    username: String,
    app_password: String,
}

impl WordPressClient {
    pub fn new(http: reqwest::Client, settings: &CmsSettings) -> Self {
        Self {
            http,
            api_root: format!("{}/wp-json/wp/v2", settings.base_url),
            username: settings.username.clone(),
            app_password: settings.app_password.clone(),
        }
    }

    async fn search_term(&self, endpoint: &str, name: &str) -> Result<Option<Term>, CmsError> {
        let response = self
            .http
            .get(format!("{}/{}", self.api_root, endpoint))
            .query(&[("search", name)])
            .basic_auth(&self.username, Some(&self.app_password))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(CmsError::Rejected {
                what: "term search",
                status: response.status().as_u16(),
            });
        }
        let mut terms: Vec<Term> = response.json().await?;
        // WordPress search is substring-based; the first hit wins, matching
        // the upsert's reuse semantics.
        Ok(if terms.is_empty() {
            None
        } else {
            Some(terms.remove(0))
        })
    }

    async fn create_term(&self, endpoint: &str, name: &str) -> Result<Term, CmsError> {
        let response = self
            .http
            .post(format!("{}/{}", self.api_root, endpoint))
            .basic_auth(&self.username, Some(&self.app_password))
            .json(&serde_json::json!({ "name": name }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(CmsError::Rejected {
                what: "term create",
                status: response.status().as_u16(),
            });
        }
        let term: Term = response.json().await?;
        debug!(endpoint, name, id = term.id, "Created CMS term");
        Ok(term)
    }
}

#[async_trait]
impl Cms for WordPressClient {
    async fn search_category(&self, name: &str) -> Result<Option<Term>, CmsError> {
        self.search_term("categories", name).await
    }

    async fn create_category(&self, name: &str) -> Result<Term, CmsError> {
        self.create_term("categories", name).await
    }

    async fn search_tag(&self, name: &str) -> Result<Option<Term>, CmsError> {
        self.search_term("tags", name).await
    }

    async fn create_tag(&self, name: &str) -> Result<Term, CmsError> {
        self.create_term("tags", name).await
    }

    #[instrument(level = "debug", skip_all, fields(bytes = png.len()))]
    async fn upload_media(&self, png: Vec<u8>) -> Result<u64, CmsError> {
        let response = self
            .http
            .post(format!("{}/media", self.api_root))
            .basic_auth(&self.username, Some(&self.app_password))
            .header("Content-Disposition", "attachment; filename=output.png")
            .header("Content-Type", "image/png")
            .body(png)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(CmsError::Rejected {
                what: "media upload",
                status: response.status().as_u16(),
            });
        }
        let created: Created = response.json().await?;
        Ok(created.id)
    }

    #[instrument(level = "debug", skip_all, fields(title = %post.title))]
    async fn create_post(&self, post: &NewPost) -> Result<u64, CmsError> {
        let response = self
            .http
            .post(format!("{}/posts", self.api_root))
            .basic_auth(&self.username, Some(&self.app_password))
            .json(post)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(CmsError::Rejected {
                what: "post create",
                status: response.status().as_u16(),
            });
        }
        let created: Created = response.json().await?;
        Ok(created.id)
    }
}
