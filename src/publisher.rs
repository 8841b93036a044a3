//! The publish sequence: SEO metadata, summary, optional featured image,
//! category/tag upsert, post create — all under one wall-clock budget.
//!
//! The budget is a race against the whole sequence, not per step. Losing
//! the race abandons the in-flight call; its side effects may still land
//! on the CMS later. That window is accepted: only the article store gets
//! compensated, and that is the caller's job — the publisher never deletes
//! anything itself.

use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::cms::{Cms, NewPost};
use crate::error::{CmsError, PublishError};
use crate::image::TextToImage;
use crate::llm::GenerateText;
use crate::models::SeoData;
use crate::prompts;

/// Wall-clock budget for one publish attempt, end to end.
pub const PUBLISH_BUDGET: Duration = Duration::from_secs(180);

/// Inner budget for image synthesis; expiry degrades to "no image".
pub const IMAGE_TIMEOUT: Duration = Duration::from_secs(60);

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```(?:json)?").unwrap());

/// Strip Markdown code fences the model wraps around "strict" JSON.
fn strip_code_fences(raw: &str) -> String {
    CODE_FENCE.replace_all(raw, "").trim().to_string()
}

pub struct Publisher {
    cms: Arc<dyn Cms>,
    llm: Arc<dyn GenerateText>,
    image: Arc<dyn TextToImage>,
    budget: Duration,
    image_timeout: Duration,
}

impl Publisher {
    pub fn new(cms: Arc<dyn Cms>, llm: Arc<dyn GenerateText>, image: Arc<dyn TextToImage>) -> Self {
        Self {
            cms,
            llm,
            image,
            budget: PUBLISH_BUDGET,
            image_timeout: IMAGE_TIMEOUT,
        }
    }

    /// Override the overall budget; tests shrink it.
    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    /// Run the full publish sequence. Any step failure or budget expiry is
    /// a [`PublishError`]; the caller owns compensation.
    #[instrument(level = "info", skip_all, fields(title = %title))]
    pub async fn publish(
        &self,
        title: &str,
        body: &str,
        categories: &[String],
    ) -> Result<u64, PublishError> {
        match tokio::time::timeout(self.budget, self.publish_sequence(title, body, categories))
            .await
        {
            Ok(result) => result,
            Err(_) => {
                warn!(budget_secs = self.budget.as_secs(), "Publish budget expired");
                Err(PublishError::Timeout {
                    budget_secs: self.budget.as_secs(),
                })
            }
        }
    }

    async fn publish_sequence(
        &self,
        title: &str,
        body: &str,
        categories: &[String],
    ) -> Result<u64, PublishError> {
        let raw_seo = self
            .llm
            .generate(&prompts::seo(title, body))
            .await
            .map_err(PublishError::Seo)?;
        let seo: SeoData = serde_json::from_str(&strip_code_fences(&raw_seo))
            .map_err(PublishError::SeoParse)?;

        let summary = self
            .llm
            .generate(&prompts::summary(title, body))
            .await
            .map_err(PublishError::Summary)?;

        let featured_media = self.featured_media(title).await?;

        let category_ids = self.resolve_category_ids(categories).await?;
        let tag_names: Vec<String> = seo
            .keywords
            .split(", ")
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .unique()
            .collect();
        let tag_ids = self.resolve_tag_ids(&tag_names).await?;

        let post = NewPost {
            title: seo.optimized_title,
            content: summary,
            status: "publish".to_string(),
            categories: category_ids,
            tags: tag_ids,
            featured_media,
        };
        let post_id = self.cms.create_post(&post).await?;
        info!(post_id, featured = featured_media.is_some(), "Created post");
        Ok(post_id)
    }

    /// Derive, synthesize, and upload the featured image. Prompt or
    /// synthesis failure (including the inner timeout) degrades to no
    /// image; a produced image that the CMS refuses to take is fatal.
    async fn featured_media(&self, title: &str) -> Result<Option<u64>, PublishError> {
        let prompt = match self.llm.generate(&prompts::image_prompt(title)).await {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "Image prompt generation failed; posting without image");
                return Ok(None);
            }
        };

        match tokio::time::timeout(self.image_timeout, self.image.synthesize(&prompt)).await {
            Ok(Ok(png)) => Ok(Some(self.cms.upload_media(png).await?)),
            Ok(Err(e)) => {
                warn!(error = %e, "Image synthesis failed; posting without image");
                Ok(None)
            }
            Err(_) => {
                warn!(
                    timeout_secs = self.image_timeout.as_secs(),
                    "Image synthesis timed out; posting without image"
                );
                Ok(None)
            }
        }
    }

    /// Idempotent find-or-create for category labels, in order. Within a
    /// run the upsert observes its own creations through search, so the
    /// same label never produces two terms.
    pub async fn resolve_category_ids(&self, labels: &[String]) -> Result<Vec<u64>, CmsError> {
        let mut ids = Vec::with_capacity(labels.len());
        for label in labels {
            let term = match self.cms.search_category(label).await? {
                Some(term) => term,
                None => self.cms.create_category(label).await?,
            };
            ids.push(term.id);
        }
        Ok(ids)
    }

    /// Same upsert for tags.
    pub async fn resolve_tag_ids(&self, names: &[String]) -> Result<Vec<u64>, CmsError> {
        let mut ids = Vec::with_capacity(names.len());
        for name in names {
            let term = match self.cms.search_tag(name).await? {
                Some(term) => term,
                None => self.cms.create_tag(name).await?,
            };
            ids.push(term.id);
        }
        Ok(ids)
    }
}
