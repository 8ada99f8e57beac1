use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use crate::{
    error::{ChainError, Result},
    template::RenderedPrompt,
};

/// Model identifier and sampling temperature, fixed for the lifetime of a handle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub model_id: String,
    pub temperature: f64,
}

impl ModelConfig {
    pub fn new(model_id: impl Into<String>, temperature: f64) -> Self {
        Self {
            model_id: model_id.into(),
            temperature,
        }
    }
}

/// A hosted model that produces text for a rendered prompt.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Configuration the handle was built with
    fn config(&self) -> &ModelConfig;

    async fn generate(&self, prompt: &RenderedPrompt) -> Result<String>;
}

/// Timeout and retry settings for upstream calls.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Attempts including the first one
    pub max_attempts: usize,
    /// Applied to each attempt separately
    pub attempt_timeout: Duration,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            attempt_timeout: Duration::from_secs(30),
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Exponential backoff before retry number `attempt_index + 1`.
    pub fn backoff(&self, attempt_index: usize) -> Duration {
        let factor = 1u32 << attempt_index.min(16);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Wraps a model with a per-attempt timeout and retries transient failures.
pub struct ResilientModel {
    inner: Arc<dyn LanguageModel>,
    policy: RetryPolicy,
}

impl ResilientModel {
    pub fn new(inner: Arc<dyn LanguageModel>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl LanguageModel for ResilientModel {
    fn config(&self) -> &ModelConfig {
        self.inner.config()
    }

    async fn generate(&self, prompt: &RenderedPrompt) -> Result<String> {
        let attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            let outcome = match timeout(self.policy.attempt_timeout, self.inner.generate(prompt))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(ChainError::Timeout(self.policy.attempt_timeout)),
            };

            match outcome {
                Ok(text) => {
                    debug!(
                        model = %self.config().model_id,
                        attempt = attempt + 1,
                        "Model call succeeded"
                    );
                    return Ok(text);
                }
                Err(e) if e.is_transient() && attempt + 1 < attempts => {
                    let delay = self.policy.backoff(attempt);
                    warn!(
                        model = %self.config().model_id,
                        attempt = attempt + 1,
                        max_attempts = attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Model call failed, retrying"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
