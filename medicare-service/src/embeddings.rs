use async_trait::async_trait;
use prompt_flow::ChainError;
use rig::{client::EmbeddingsClient, embeddings::EmbeddingModel as _, providers::gemini};
use std::sync::Arc;
use tracing::info;

use crate::config::AppConfig;
use crate::error::AssistantError;

pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-004";

/// Texts used by the `embed_samples` binary to show how similar sentences land close together.
pub const SAMPLE_TEXTS: [&str; 4] = [
    "The weather is beautiful today.",
    "It's a sunny and pleasant day outside.",
    "I love programming in Python.",
    "Machine learning is fascinating.",
];

/// Turns texts into vectors using a hosted embeddings model.
#[async_trait]
pub trait Embedder: Send + Sync {
    fn model_id(&self) -> &str;

    /// One vector per input text, in input order.
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f64>>, AssistantError>;
}

/// Gemini embeddings through `rig`.
pub struct RigEmbedder {
    config: Arc<AppConfig>,
    model_id: String,
}

impl RigEmbedder {
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self {
            config,
            model_id: DEFAULT_EMBEDDING_MODEL.to_string(),
        }
    }
}

#[async_trait]
impl Embedder for RigEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f64>>, AssistantError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let api_key = self.config.google_api_key()?;
        let client = gemini::Client::new(api_key);
        let model = client.embedding_model(&self.model_id);

        info!(
            model = %self.model_id,
            count = texts.len(),
            "Generating embeddings"
        );

        let embeddings = model
            .embed_texts(texts.to_vec())
            .await
            .map_err(|e| ChainError::Upstream(e.to_string()))?;

        info!(
            count = embeddings.len(),
            dimensions = embeddings.first().map(|e| e.vec.len()).unwrap_or(0),
            "Embeddings generated"
        );

        Ok(embeddings.into_iter().map(|e| e.vec).collect())
    }
}

/// Cosine similarity of two vectors; `None` when lengths differ or a vector is all zeros.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return None;
    }
    Some(dot / (norm_a * norm_b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unconfigured() -> RigEmbedder {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        RigEmbedder::new(Arc::new(config))
    }

    #[tokio::test]
    async fn empty_input_needs_no_key() {
        let embeddings = unconfigured().embed_texts(&[]).await.unwrap();
        assert!(embeddings.is_empty());
    }

    #[tokio::test]
    async fn missing_google_key_is_a_configuration_error() {
        let err = unconfigured()
            .embed_texts(&["hello".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, AssistantError::Configuration(_)));
    }

    #[test]
    fn uses_the_text_embedding_model() {
        assert_eq!(unconfigured().model_id(), "text-embedding-004");
    }

    #[test]
    fn cosine_similarity_basics() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]), Some(1.0));
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 3.0]), Some(0.0));
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), None);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), None);
    }
}
