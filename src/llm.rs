//! Generative text model client with exponential backoff retry logic.
//!
//! The model is a single request/response `generate(prompt) -> text` call
//! over REST, treated as unreliable: callers that can degrade use
//! [`generate_or_fallback`] and get [`FALLBACK_RESPONSE`] on failure;
//! callers that cannot (SEO metadata) propagate the error.
//!
//! # Retry Strategy
//!
//! - Maximum 5 retry attempts
//! - Exponential backoff starting at 1 second
//! - Maximum delay capped at 30 seconds
//! - Random jitter (0-250ms) added to prevent thundering herd

use async_trait::async_trait;
use rand::{rng, Rng};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, instrument, warn};

use crate::error::GenerativeError;
use crate::utils::truncate_for_log;

/// Fixed degraded response used where a failed model call must not sink
/// the surrounding scan. Never contains the token "YES".
pub const FALLBACK_RESPONSE: &str = "No response available.";

/// Single-shot text generation.
#[async_trait]
pub trait GenerateText: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerativeError>;
}

/// Call the model, degrading to [`FALLBACK_RESPONSE`] on any failure.
pub async fn generate_or_fallback(llm: &dyn GenerateText, prompt: &str) -> String {
    match llm.generate(prompt).await {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "Model call failed; using fallback response");
            FALLBACK_RESPONSE.to_string()
        }
    }
}

// --- Gemini-style REST wire types ---

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<RequestContent>,
}

#[derive(Serialize)]
struct RequestContent {
    parts: Vec<TextPart>,
}

#[derive(Serialize)]
struct TextPart {
    text: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Deserialize)]
struct ResponseCandidate {
    content: Option<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

/// Client for a Gemini-compatible `generateContent` endpoint.
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: "gemini-1.5-flash".to_string(),
        }
    }
}

#[async_trait]
impl GenerateText for GeminiClient {
    #[instrument(level = "debug", skip_all)]
    async fn generate(&self, prompt: &str) -> Result<String, GenerativeError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let body = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![TextPart {
                    text: prompt.to_string(),
                }],
            }],
        };

        let t0 = Instant::now();
        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<GenerateResponse>()
            .await?;

        let text = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .map(|p| p.text)
            .filter(|t| !t.is_empty())
            .ok_or(GenerativeError::EmptyResponse)?;

        debug!(
            elapsed_ms = t0.elapsed().as_millis() as u64,
            response_preview = %truncate_for_log(&text, 200),
            "Model call succeeded"
        );
        Ok(text)
    }
}

/// Wrapper that adds exponential backoff retry logic to any
/// [`GenerateText`] implementation.
///
/// The delay between retries follows:
/// `delay = min(base_delay * 2^(attempt-1), max_delay) + jitter(0..250ms)`
pub struct RetryGenerate<T> {
    inner: T,
    max_retries: usize,
    base_delay: Duration,
    max_delay: Duration,
}

impl<T> RetryGenerate<T>
where
    T: GenerateText,
{
    pub fn new(inner: T, max_retries: usize, base_delay: Duration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: Duration::from_secs(30),
        }
    }
}

#[async_trait]
impl<T> GenerateText for RetryGenerate<T>
where
    T: GenerateText,
{
    #[instrument(level = "debug", skip_all)]
    async fn generate(&self, prompt: &str) -> Result<String, GenerativeError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            match self.inner.generate(prompt).await {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    attempt += 1;
                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_total = total_t0.elapsed().as_millis() as u64,
                            error = %e,
                            "generate() exhausted retries"
                        );
                        return Err(e);
                    }

                    let mut delay = self.base_delay.saturating_mul(1 << (attempt - 1));
                    if delay > self.max_delay {
                        delay = self.max_delay;
                    }
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = delay + Duration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_retries,
                        ?delay,
                        error = %e,
                        "generate() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}
