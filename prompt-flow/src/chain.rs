use std::sync::Arc;
use tracing::{debug, info};

use crate::{
    context::Context,
    error::Result,
    model::LanguageModel,
    parser::OutputParser,
    template::{PromptTemplate, RenderedPrompt},
};

/// Variable name under which a parser's format instructions are pre-filled.
pub const FORMAT_INSTRUCTIONS: &str = "format_instructions";

/// prompt → model → parser, invoked once per set of variables.
pub struct Chain<P: OutputParser> {
    id: String,
    template: PromptTemplate,
    model: Arc<dyn LanguageModel>,
    parser: P,
}

impl<P: OutputParser> Chain<P> {
    /// Render without calling the model.
    pub fn render(&self, context: &Context) -> Result<RenderedPrompt> {
        self.template.render(context)
    }

    pub async fn invoke(&self, context: Context) -> Result<P::Output> {
        let prompt = self.render(&context)?;
        debug!(
            chain_id = %self.id,
            model = %self.model.config().model_id,
            prompt_chars = prompt.system.len() + prompt.user.len(),
            "Prompt rendered"
        );

        let raw = self.model.generate(&prompt).await?;
        info!(
            chain_id = %self.id,
            response_chars = raw.len(),
            "Model responded"
        );

        self.parser.parse(&raw)
    }
}

/// Builder for creating chains
pub struct ChainBuilder<P: OutputParser> {
    id: String,
    template: PromptTemplate,
    parser: P,
}

impl<P: OutputParser> ChainBuilder<P> {
    /// Starts a chain. If the parser publishes format instructions they are
    /// pre-filled as the `{format_instructions}` placeholder.
    pub fn new(id: impl Into<String>, template: PromptTemplate, parser: P) -> Self {
        let template = match parser.format_instructions() {
            Some(instructions) => template.partial(FORMAT_INSTRUCTIONS, instructions),
            None => template,
        };
        Self {
            id: id.into(),
            template,
            parser,
        }
    }

    pub fn build(self, model: Arc<dyn LanguageModel>) -> Chain<P> {
        Chain {
            id: self.id,
            template: self.template,
            model,
            parser: self.parser,
        }
    }
}
