//! # newsdesk
//!
//! A scheduled content pipeline: scrape news-site listing pages, extract
//! per-article text, filter out topics the corpus already covers, classify
//! and summarize through a generative model, and publish a post to a
//! WordPress-style CMS — rolling back the store record if publishing fails.
//!
//! ## Architecture
//!
//! Per article, data flows strictly downward:
//! 1. **Listing**: discover candidate URLs per source
//! 2. **Store filter**: URLs already stored are never re-fetched
//! 3. **Extraction**: headline/body text from the article page
//! 4. **Provisional store write**
//! 5. **Similarity scan**: batched, rate-limited duplicate check
//! 6. **Category resolution**
//! 7. **Publish** with a hard wall-clock budget; failure triggers the
//!    compensating store delete
//!
//! A process-wide run guard keeps pipeline runs single-flight; a 10-minute
//! timer plus one immediate run at startup drive it.
//!
//! ## Usage
//!
//! ```sh
//! newsdesk                # loop on the timer
//! newsdesk --once         # single pass, cron-friendly
//! ```

use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod categories;
mod cli;
mod cms;
mod config;
mod error;
mod image;
mod llm;
mod models;
mod pipeline;
mod prompts;
mod publisher;
mod scheduler;
mod scrapers;
mod similarity;
mod store;
mod utils;

use categories::CategoryResolver;
use cli::Cli;
use cms::{Cms, WordPressClient};
use config::Settings;
use image::{HfTextToImage, TextToImage};
use llm::{GeminiClient, GenerateText, RetryGenerate};
use pipeline::Pipeline;
use publisher::Publisher;
use scheduler::Scheduler;
use similarity::{FixedDelay, SimilarityScanner, BATCH_DELAY};
use store::{ArticleStore, JsonFileStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    info!("newsdesk starting up");

    let args = Cli::parse();
    let mut settings = Settings::from_env();
    if let Some(store_path) = args.store.clone() {
        settings.store_path = store_path;
    }
    settings.run_interval = Duration::from_secs(args.interval_secs);

    let http = reqwest::Client::builder()
        .user_agent(concat!("newsdesk/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let store: Arc<dyn ArticleStore> = Arc::new(JsonFileStore::open(&settings.store_path).await?);
    let llm: Arc<dyn GenerateText> = Arc::new(RetryGenerate::new(
        GeminiClient::new(
            http.clone(),
            settings.gemini_api_base.clone(),
            settings.gemini_api_key.clone(),
        ),
        5,
        Duration::from_secs(1),
    ));
    let image: Arc<dyn TextToImage> = Arc::new(HfTextToImage::new(
        http.clone(),
        settings.hf_api_base.clone(),
        settings.hf_api_key.clone(),
    ));
    let cms: Arc<dyn Cms> = Arc::new(WordPressClient::new(http.clone(), &settings.cms));

    let pipeline = Pipeline::new(
        http,
        store,
        SimilarityScanner::new(llm.clone(), Arc::new(FixedDelay(BATCH_DELAY))),
        CategoryResolver::new(llm.clone()),
        Publisher::new(cms, llm, image),
    );
    let sources = scrapers::all();

    let scheduler = Scheduler::new(settings.run_interval);
    if args.once {
        scheduler.trigger(pipeline.run(&sources)).await;
        info!("Single pass complete");
        return Ok(());
    }

    info!(
        interval_secs = settings.run_interval.as_secs(),
        "Entering scheduler loop"
    );
    scheduler.run(|| pipeline.run(&sources)).await;
    Ok(())
}
