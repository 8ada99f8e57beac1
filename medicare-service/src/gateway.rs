use async_trait::async_trait;
use prompt_flow::{ChainError, LanguageModel, ModelConfig, RenderedPrompt, ResilientModel};
use rig::{
    client::CompletionClient,
    completion::Prompt,
    providers::{gemini, groq, openai},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::config::{AppConfig, Provider};
use crate::error::ConfigError;

/// Which flavour of hosted model a chain needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Single-shot text completion, used for structured analysis
    Completion,
    /// Conversational model, used for question answering
    Chat,
}

impl ModelKind {
    pub fn default_temperature(self) -> f64 {
        match self {
            ModelKind::Completion => 0.9,
            ModelKind::Chat => 0.7,
        }
    }
}

/// Hands out model handles. Fails only when configuration is missing.
pub trait ModelGateway: Send + Sync {
    fn model(&self, kind: ModelKind) -> Result<Arc<dyn LanguageModel>, ConfigError>;
}

/// Gateway over the `rig` provider clients selected by [`AppConfig::provider`].
pub struct RigGateway {
    config: Arc<AppConfig>,
}

impl RigGateway {
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self { config }
    }

    pub fn model_config(&self, kind: ModelKind) -> ModelConfig {
        ModelConfig::new(self.config.model_id(), kind.default_temperature())
    }
}

impl ModelGateway for RigGateway {
    fn model(&self, kind: ModelKind) -> Result<Arc<dyn LanguageModel>, ConfigError> {
        let provider = self.config.provider;
        let api_key = self.config.api_key(provider)?;
        let model_config = self.model_config(kind);
        debug!(
            ?provider,
            ?kind,
            model = %model_config.model_id,
            temperature = model_config.temperature,
            "Building model handle"
        );

        let inner: Arc<dyn LanguageModel> = match provider {
            Provider::Gemini => Arc::new(RigModel::new(gemini::Client::new(api_key), model_config)),
            Provider::OpenAi => Arc::new(RigModel::new(openai::Client::new(api_key), model_config)),
            Provider::Groq => Arc::new(RigModel::new(groq::Client::new(api_key), model_config)),
        };

        Ok(Arc::new(ResilientModel::new(inner, self.config.retry.clone())))
    }
}

/// A `rig` completion client bound to one model id and temperature.
pub struct RigModel<C> {
    client: C,
    config: ModelConfig,
}

impl<C> RigModel<C> {
    pub fn new(client: C, config: ModelConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl<C> LanguageModel for RigModel<C>
where
    C: CompletionClient + Send + Sync + 'static,
{
    fn config(&self) -> &ModelConfig {
        &self.config
    }

    async fn generate(&self, prompt: &RenderedPrompt) -> prompt_flow::Result<String> {
        let agent = self
            .client
            .agent(&self.config.model_id)
            .preamble(&prompt.system)
            .temperature(self.config.temperature)
            .build();

        let text = agent
            .prompt(prompt.user.as_str())
            .await
            .map_err(|e| ChainError::Upstream(e.to_string()))?;

        if text.trim().is_empty() {
            return Err(ChainError::Upstream(
                "model returned an empty response".to_string(),
            ));
        }
        Ok(text)
    }
}
