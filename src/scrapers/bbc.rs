//! BBC News front-page scraper.
//!
//! Headline cards are anchors containing `h2[data-testid="card-headline"]`.
//! The category comes from the URL path; Live, Photo and Video entries are
//! excluded at listing time because they carry no scrapeable article body.

use async_trait::async_trait;
use itertools::Itertools;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument};
use url::Url;

use crate::error::FetchError;
use crate::models::{Candidate, Listing};
use crate::scrapers::{fetch_text, NewsSource};

const BASE_URL: &str = "https://www.bbc.com/news";

static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());
static CARD_HEADLINE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"h2[data-testid="card-headline"]"#).unwrap());
static ARTICLE_PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("article p").unwrap());

/// Map an article URL to the site-derived category label.
fn category_for_url(url: &str) -> &'static str {
    if url.contains("/sport") {
        "Sports"
    } else if url.contains("/politics") {
        "Politics"
    } else if url.contains("/business") {
        "Business"
    } else if url.contains("/science") {
        "Science"
    } else if url.contains("/health") {
        "Health"
    } else if url.contains("/entertainment") {
        "Entertainment"
    } else if url.contains("/live") {
        "Live"
    } else if url.contains("/photo") || url.contains("/gallery") {
        "Photo"
    } else if url.contains("/video") {
        "Videos"
    } else {
        "World"
    }
}

fn parse_listings(html: &str) -> Vec<Listing> {
    let base = Url::parse(BASE_URL).expect("static base url");
    let document = Html::parse_document(html);

    document
        .select(&ANCHOR)
        .filter_map(|anchor| {
            let headline = anchor.select(&CARD_HEADLINE).next()?;
            let title = headline.text().collect::<String>().trim().to_string();
            let href = anchor.value().attr("href")?;
            let url = base.join(href).ok()?.to_string();
            let category = category_for_url(&url);
            if title.is_empty() || matches!(category, "Live" | "Photo" | "Videos") {
                return None;
            }
            Some(Listing {
                url,
                category: category.to_string(),
                title: Some(title),
            })
        })
        .unique_by(|l| l.url.clone())
        .collect()
}

fn parse_body(html: &str) -> String {
    let document = Html::parse_document(html);
    document
        .select(&ARTICLE_PARAGRAPH)
        .map(|p| p.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

pub struct BbcNews;

#[async_trait]
impl NewsSource for BbcNews {
    fn name(&self) -> &'static str {
        "bbc"
    }

    #[instrument(level = "info", skip_all)]
    async fn list(&self, http: &reqwest::Client) -> Result<Vec<Listing>, FetchError> {
        let html = fetch_text(http, BASE_URL).await?;
        let listings = parse_listings(&html);
        info!(count = listings.len(), "Indexed BBC listings");
        Ok(listings)
    }

    #[instrument(level = "debug", skip_all, fields(url = %listing.url))]
    async fn extract(
        &self,
        http: &reqwest::Client,
        listing: &Listing,
    ) -> Result<Option<Candidate>, FetchError> {
        let Some(title) = listing.title.clone() else {
            return Ok(None);
        };
        let html = fetch_text(http, &listing.url).await?;
        let body = parse_body(&html);
        if body.is_empty() {
            debug!("No article paragraphs found");
            return Ok(None);
        }
        Ok(Some(Candidate {
            title,
            url: listing.url.clone(),
            category: listing.category.clone(),
            body,
        }))
    }
}
