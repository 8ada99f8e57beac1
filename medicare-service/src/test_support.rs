use async_trait::async_trait;
use prompt_flow::{ChainError, LanguageModel, ModelConfig, RenderedPrompt};
use std::sync::{Arc, Mutex};

use crate::embeddings::Embedder;
use crate::error::{AssistantError, ConfigError};
use crate::gateway::{ModelGateway, ModelKind};

type Calls = Arc<Mutex<Vec<(ModelKind, RenderedPrompt)>>>;

/// Gateway whose models answer with a fixed reply and record every prompt.
pub struct StubGateway {
    reply: Option<Result<String, ChainError>>,
    calls: Calls,
}

impl StubGateway {
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(Ok(reply.to_string())),
            calls: Calls::default(),
        })
    }

    pub fn failing(error: ChainError) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(Err(error)),
            calls: Calls::default(),
        })
    }

    /// Behaves as if the provider key were missing.
    pub fn unconfigured() -> Arc<Self> {
        Arc::new(Self {
            reply: None,
            calls: Calls::default(),
        })
    }

    pub fn kinds(&self) -> Vec<ModelKind> {
        self.calls.lock().unwrap().iter().map(|(kind, _)| *kind).collect()
    }

    pub fn last_prompt(&self) -> Option<RenderedPrompt> {
        self.calls.lock().unwrap().last().map(|(_, prompt)| prompt.clone())
    }
}

impl ModelGateway for StubGateway {
    fn model(&self, kind: ModelKind) -> Result<Arc<dyn LanguageModel>, ConfigError> {
        let reply = self
            .reply
            .clone()
            .ok_or(ConfigError::MissingKey("GOOGLE_API_KEY"))?;
        Ok(Arc::new(StubModel {
            kind,
            config: ModelConfig::new("stub-model", kind.default_temperature()),
            reply,
            calls: self.calls.clone(),
        }))
    }
}

struct StubModel {
    kind: ModelKind,
    config: ModelConfig,
    reply: Result<String, ChainError>,
    calls: Calls,
}

#[async_trait]
impl LanguageModel for StubModel {
    fn config(&self) -> &ModelConfig {
        &self.config
    }

    async fn generate(&self, prompt: &RenderedPrompt) -> prompt_flow::Result<String> {
        self.calls.lock().unwrap().push((self.kind, prompt.clone()));
        self.reply.clone()
    }
}

/// Embedder producing `[len, index]` for every text.
pub struct StubEmbedder;

#[async_trait]
impl Embedder for StubEmbedder {
    fn model_id(&self) -> &str {
        "stub-embedding"
    }

    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f64>>, AssistantError> {
        Ok(texts
            .iter()
            .enumerate()
            .map(|(i, text)| vec![text.len() as f64, i as f64])
            .collect())
    }
}
