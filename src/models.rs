//! Data models shared across the pipeline stages.
//!
//! A [`Listing`] is a link discovered on a source's front page, a
//! [`Candidate`] is the in-memory extracted article awaiting the
//! duplicate/publish decisions, and an [`Article`] is the persisted record
//! keyed by URL. [`SeoData`] is the strict JSON shape the generative model
//! must return for publish step one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A candidate link discovered on a listing page, before any article fetch.
#[derive(Debug, Clone)]
pub struct Listing {
    /// Absolute article URL.
    pub url: String,
    /// Site-derived category label (e.g. "Sports", "Mumbai").
    pub category: String,
    /// Headline when the listing page carries one; otherwise the article
    /// page supplies it during extraction.
    pub title: Option<String>,
}

/// An extracted article held in memory; becomes an [`Article`] on store.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub title: String,
    pub url: String,
    pub category: String,
    /// Newline-joined paragraphs.
    pub body: String,
}

/// A persisted article record. At most one exists per URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: u64,
    pub title: String,
    pub url: String,
    pub category: String,
    pub content: String,
    pub scraped_at: DateTime<Utc>,
}

/// SEO metadata returned by the model as strict JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeoData {
    /// Comma-separated keyword list; seeds the tag-name set on publish.
    pub keywords: String,
    pub optimized_title: String,
    pub meta_description: String,
}
