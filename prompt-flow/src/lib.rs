pub mod chain;
pub mod context;
pub mod error;
pub mod model;
pub mod parser;
pub mod template;

// Re-export commonly used types
pub use chain::{Chain, ChainBuilder, FORMAT_INSTRUCTIONS};
pub use context::Context;
pub use error::{ChainError, Result};
pub use model::{LanguageModel, ModelConfig, ResilientModel, RetryPolicy};
pub use parser::{OutputParser, SchemaParser, StrOutputParser, extract_json_object};
pub use template::{PromptTemplate, RenderedPrompt};

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use schemars::JsonSchema;
    use serde::Deserialize;
    use std::sync::{Arc, Mutex};

    struct EchoModel {
        config: ModelConfig,
        reply: String,
        seen: Mutex<Vec<RenderedPrompt>>,
    }

    impl EchoModel {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                config: ModelConfig::new("echo", 0.5),
                reply: reply.to_string(),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LanguageModel for EchoModel {
        fn config(&self) -> &ModelConfig {
            &self.config
        }

        async fn generate(&self, prompt: &RenderedPrompt) -> Result<String> {
            self.seen.lock().unwrap().push(prompt.clone());
            Ok(self.reply.clone())
        }
    }

    #[derive(Debug, Deserialize, JsonSchema, PartialEq)]
    struct Answer {
        answer: String,
    }

    #[tokio::test]
    async fn test_string_chain_execution() {
        let model = EchoModel::replying("Drink plenty of water.");
        let chain = ChainBuilder::new(
            "qa",
            PromptTemplate::new("You are helpful.", "{user_question}"),
            StrOutputParser,
        )
        .build(model.clone());

        let output = chain
            .invoke(Context::new().with("user_question", "How to avoid dehydration?"))
            .await
            .unwrap();

        assert_eq!(output, "Drink plenty of water.");
        let seen = model.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].system, "You are helpful.");
        assert_eq!(seen[0].user, "How to avoid dehydration?");
    }

    #[tokio::test]
    async fn test_schema_chain_prefills_format_instructions() {
        let model = EchoModel::replying(r#"{"answer": "42"}"#);
        let chain = ChainBuilder::new(
            "structured",
            PromptTemplate::new("sys", "{question}\n\n{format_instructions}"),
            SchemaParser::<Answer>::new(),
        )
        .build(model.clone());

        let output = chain
            .invoke(Context::new().with("question", "meaning of life"))
            .await
            .unwrap();
        assert_eq!(output, Answer { answer: "42".to_string() });

        let seen = model.seen.lock().unwrap();
        assert!(seen[0].user.starts_with("meaning of life\n\n"));
        assert!(seen[0].user.contains("Here is the output schema:"));
        assert!(!seen[0].user.contains("{format_instructions}"));
    }

    #[tokio::test]
    async fn test_missing_variable_skips_model_call() {
        let model = EchoModel::replying("unused");
        let chain = ChainBuilder::new(
            "qa",
            PromptTemplate::new("", "{user_question}"),
            StrOutputParser,
        )
        .build(model.clone());

        let err = chain.invoke(Context::new()).await.unwrap_err();
        assert_eq!(err, ChainError::MissingVariable("user_question".to_string()));
        assert!(model.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_schema_failure_surfaces_as_validation_error() {
        let model = EchoModel::replying("I cannot answer that.");
        let chain = ChainBuilder::new(
            "structured",
            PromptTemplate::new("", "{format_instructions}"),
            SchemaParser::<Answer>::new(),
        )
        .build(model);

        let err = chain.invoke(Context::new()).await.unwrap_err();
        assert!(matches!(err, ChainError::SchemaValidation(_)));
    }
}
