//! Text-to-image backend for the optional featured image.
//!
//! One call, binary out. Failures here never sink a publish on their own;
//! the publisher degrades to "no image" on error or on its inner timeout.

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::error::GenerativeError;

/// Synthesize an image from a short text prompt.
#[async_trait]
pub trait TextToImage: Send + Sync {
    async fn synthesize(&self, prompt: &str) -> Result<Vec<u8>, GenerativeError>;
}

/// Hugging Face-style inference endpoint running a diffusion model.
pub struct HfTextToImage {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl HfTextToImage {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: "CompVis/stable-diffusion-v1-4".to_string(),
        }
    }
}

#[async_trait]
impl TextToImage for HfTextToImage {
    #[instrument(level = "debug", skip_all)]
    async fn synthesize(&self, prompt: &str) -> Result<Vec<u8>, GenerativeError> {
        let url = format!("{}/models/{}", self.base_url, self.model);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "inputs": prompt,
                "parameters": { "num_inference_steps": 5 }
            }))
            .send()
            .await?
            .error_for_status()?;

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(GenerativeError::EmptyResponse);
        }
        debug!(bytes = bytes.len(), "Synthesized image");
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn returns_binary_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/CompVis/stable-diffusion-v1-4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x89, 0x50, 0x4e, 0x47]))
            .mount(&server)
            .await;

        let backend = HfTextToImage::new(reqwest::Client::new(), server.uri(), "k");
        let png = backend.synthesize("stormy sky").await.unwrap();
        assert_eq!(&png[..4], &[0x89, 0x50, 0x4e, 0x47]);
    }

    #[tokio::test]
    async fn empty_body_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/CompVis/stable-diffusion-v1-4"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let backend = HfTextToImage::new(reqwest::Client::new(), server.uri(), "k");
        let err = backend.synthesize("stormy sky").await.unwrap_err();
        assert!(matches!(err, GenerativeError::EmptyResponse));
    }
}
