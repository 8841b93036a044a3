//! News source scrapers.
//!
//! Each source implements [`NewsSource`] in two phases:
//!
//! 1. **Listing**: discover candidate article URLs (with a site-derived
//!    category label) from the source's front or section pages.
//! 2. **Extraction**: fetch one article page and pull out headline and
//!    body text. Extraction yielding nothing usable is a skip, never an
//!    error.
//!
//! DOM parsing is kept in pure functions over the fetched HTML so the
//! selector logic is testable without a network.

use async_trait::async_trait;

use crate::error::FetchError;
use crate::models::{Candidate, Listing};

pub mod bbc;
pub mod toi;

/// A scrapeable news site.
#[async_trait]
pub trait NewsSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Discover candidate listings with absolute URLs.
    async fn list(&self, http: &reqwest::Client) -> Result<Vec<Listing>, FetchError>;

    /// Fetch and extract one article. `Ok(None)` means no usable
    /// title/body was found.
    async fn extract(
        &self,
        http: &reqwest::Client,
        listing: &Listing,
    ) -> Result<Option<Candidate>, FetchError>;
}

/// All configured sources, in processing order.
pub fn all() -> Vec<Box<dyn NewsSource>> {
    vec![Box::new(bbc::BbcNews), Box::new(toi::TimesOfIndia)]
}

pub(crate) async fn fetch_text(http: &reqwest::Client, url: &str) -> Result<String, FetchError> {
    Ok(http.get(url).send().await?.error_for_status()?.text().await?)
}
