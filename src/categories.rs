//! Category resolution for non-duplicate candidates.
//!
//! One generative call, then deterministic normalization of the
//! comma-separated response. Normalization is a pure function so the exact
//! splitting rules stay testable without a model.

use std::sync::Arc;
use tracing::{info, instrument};

use crate::error::GenerativeError;
use crate::llm::GenerateText;
use crate::models::Candidate;
use crate::prompts;

pub struct CategoryResolver {
    llm: Arc<dyn GenerateText>,
}

impl CategoryResolver {
    pub fn new(llm: Arc<dyn GenerateText>) -> Self {
        Self { llm }
    }

    /// Derive the flat label list for a candidate. Model failures
    /// propagate; the orchestrator decides what they sink.
    #[instrument(level = "info", skip_all, fields(url = %candidate.url))]
    pub async fn resolve(&self, candidate: &Candidate) -> Result<Vec<String>, GenerativeError> {
        let response = self.llm.generate(&prompts::categories(candidate)).await?;
        let labels = normalize_labels(&response);
        info!(count = labels.len(), labels = ?labels, "Resolved categories");
        Ok(labels)
    }
}

/// Normalize a raw model response into an ordered label list:
/// newlines stripped, comma-split, tokens trimmed, empties dropped, and
/// tokens containing the literal `" and "` split into separate labels.
/// No dedup, no case folding; order is preserved.
pub fn normalize_labels(response: &str) -> Vec<String> {
    response
        .replace('\n', "")
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .flat_map(|t| {
            if t.contains(" and ") {
                t.split(" and ").map(|s| s.trim().to_string()).collect()
            } else {
                vec![t.to_string()]
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    #[test]
    fn normalizes_the_reference_example() {
        assert_eq!(
            normalize_labels("Sports and Football, Mumbai, , Politics\n"),
            vec!["Sports", "Football", "Mumbai", "Politics"]
        );
    }

    #[test]
    fn preserves_order_and_duplicates() {
        assert_eq!(
            normalize_labels("World, India, World"),
            vec!["World", "India", "World"]
        );
    }

    #[test]
    fn empty_response_yields_no_labels() {
        assert!(normalize_labels("").is_empty());
        assert!(normalize_labels("\n, ,\n").is_empty());
    }

    #[tokio::test]
    async fn resolver_runs_normalization_over_model_output() {
        struct Fixed;
        #[async_trait]
        impl GenerateText for Fixed {
            async fn generate(&self, _prompt: &str) -> Result<String, GenerativeError> {
                Ok("Education, Mumbai, Maharashtra\n".to_string())
            }
        }
        let resolver = CategoryResolver::new(Arc::new(Fixed));
        let labels = resolver
            .resolve(&Candidate {
                title: "T".to_string(),
                url: "https://e.com/a".to_string(),
                category: "Mumbai".to_string(),
                body: "B".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(labels, vec!["Education", "Mumbai", "Maharashtra"]);
    }
}
