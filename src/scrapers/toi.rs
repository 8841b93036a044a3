//! Times of India section scraper.
//!
//! Listings come from per-category section pages; article links match
//! `/articleshow/`. The headline lives on the article page (`h1.HNMDR`),
//! the body in `div._s30J` with whitespace collapsed.

use async_trait::async_trait;
use itertools::Itertools;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument};
use url::Url;

use crate::error::FetchError;
use crate::models::{Candidate, Listing};
use crate::scrapers::{fetch_text, NewsSource};
use crate::utils::collapse_whitespace;

const BASE_URL: &str = "https://timesofindia.indiatimes.com/";

/// Scraped sections: (category label, path under the site root).
const SECTIONS: &[(&str, &str)] = &[("Mumbai", "city/mumbai")];

static ARTICLE_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"a[href*="/articleshow/"]"#).unwrap());
static HEADLINE: Lazy<Selector> = Lazy::new(|| Selector::parse("h1.HNMDR").unwrap());
static BODY: Lazy<Selector> = Lazy::new(|| Selector::parse("div._s30J").unwrap());

fn parse_listings(html: &str, category: &str) -> Vec<Listing> {
    let base = Url::parse(BASE_URL).expect("static base url");
    let document = Html::parse_document(html);
    document
        .select(&ARTICLE_LINK)
        .filter_map(|anchor| {
            let href = anchor.value().attr("href")?;
            let url = base.join(href).ok()?.to_string();
            Some(Listing {
                url,
                category: category.to_string(),
                title: None,
            })
        })
        .unique_by(|l| l.url.clone())
        .collect()
}

fn parse_article(html: &str) -> Option<(String, String)> {
    let document = Html::parse_document(html);
    let title = document
        .select(&HEADLINE)
        .next()
        .map(|h| h.text().collect::<String>().trim().to_string())?;
    let body = document
        .select(&BODY)
        .next()
        .map(|d| collapse_whitespace(&d.text().collect::<String>()))?;
    if title.is_empty() || body.is_empty() {
        return None;
    }
    Some((title, body))
}

pub struct TimesOfIndia;

#[async_trait]
impl NewsSource for TimesOfIndia {
    fn name(&self) -> &'static str {
        "toi"
    }

    #[instrument(level = "info", skip_all)]
    async fn list(&self, http: &reqwest::Client) -> Result<Vec<Listing>, FetchError> {
        let mut listings = Vec::new();
        for (category, path) in SECTIONS {
            let html = fetch_text(http, &format!("{BASE_URL}{path}")).await?;
            let mut section = parse_listings(&html, category);
            debug!(category, count = section.len(), "Indexed TOI section");
            listings.append(&mut section);
        }
        info!(count = listings.len(), "Indexed TOI listings");
        Ok(listings)
    }

    #[instrument(level = "debug", skip_all, fields(url = %listing.url))]
    async fn extract(
        &self,
        http: &reqwest::Client,
        listing: &Listing,
    ) -> Result<Option<Candidate>, FetchError> {
        let html = fetch_text(http, &listing.url).await?;
        let Some((title, body)) = parse_article(&html) else {
            debug!("No usable title/body on article page");
            return Ok(None);
        };
        Ok(Some(Candidate {
            title,
            url: listing.url.clone(),
            category: listing.category.clone(),
            body,
        }))
    }
}
