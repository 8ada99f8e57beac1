use prompt_flow::{Chain, ChainBuilder, Context, SchemaParser, StrOutputParser};
use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    analysis::{AnalysisOutcome, MedicalAnalysis, analysis_parser},
    error::{AssistantError, ConfigError},
    gateway::{ModelGateway, ModelKind},
    prompts::{self, Locale, TaskKind},
};

/// What a chain run produced, depending on the task.
#[derive(Debug, Clone, PartialEq)]
pub enum ChainOutput {
    Text(String),
    Analysis(MedicalAnalysis),
}

/// Builds and runs the chat and analysis chains against a model gateway.
#[derive(Clone)]
pub struct MedicalAssistant {
    gateway: Arc<dyn ModelGateway>,
}

impl MedicalAssistant {
    pub fn new(gateway: Arc<dyn ModelGateway>) -> Self {
        Self { gateway }
    }

    pub fn analysis_chain(
        &self,
        locale: Locale,
    ) -> Result<Chain<SchemaParser<MedicalAnalysis>>, ConfigError> {
        let model = self.gateway.model(ModelKind::Completion)?;
        let template = prompts::prompt_spec(TaskKind::Analysis, locale).template();
        Ok(ChainBuilder::new("medical_analysis", template, analysis_parser()).build(model))
    }

    pub fn chat_chain(&self, locale: Locale) -> Result<Chain<StrOutputParser>, ConfigError> {
        let model = self.gateway.model(ModelKind::Chat)?;
        let template = prompts::prompt_spec(TaskKind::Chat, locale).template();
        Ok(ChainBuilder::new("medical_chat", template, StrOutputParser).build(model))
    }

    /// Render, call the model and decode for the given task. No fallback here.
    pub async fn run(
        &self,
        task: TaskKind,
        language: &str,
        variables: Context,
    ) -> Result<ChainOutput, AssistantError> {
        let locale = Locale::from_code(language);
        match task {
            TaskKind::Chat => self.run_chat(locale, variables).await.map(ChainOutput::Text),
            TaskKind::Analysis => self
                .run_analysis(locale, variables)
                .await
                .map(ChainOutput::Analysis),
        }
    }

    async fn run_chat(&self, locale: Locale, variables: Context) -> Result<String, AssistantError> {
        let chain = self.chat_chain(locale)?;
        Ok(chain.invoke(variables).await?)
    }

    async fn run_analysis(
        &self,
        locale: Locale,
        variables: Context,
    ) -> Result<MedicalAnalysis, AssistantError> {
        let chain = self.analysis_chain(locale)?;
        Ok(chain.invoke(variables).await?)
    }

    /// Analyse a medical record.
    ///
    /// Upstream and validation failures are absorbed into
    /// [`AnalysisOutcome::Degraded`]; only missing configuration is returned
    /// as an error.
    pub async fn analyze_medical_record(
        &self,
        text: &str,
        context: &str,
        language: &str,
    ) -> Result<AnalysisOutcome, ConfigError> {
        info!(
            language = %language,
            text_chars = text.chars().count(),
            has_context = !context.trim().is_empty(),
            "Starting medical record analysis"
        );

        let variables = prompts::analysis_variables(text, context);
        match self
            .run_analysis(Locale::from_code(language), variables)
            .await
        {
            Ok(analysis) => {
                info!(
                    findings = analysis.key_findings.len(),
                    recommendations = analysis.recommendations.len(),
                    "Medical record analysis completed"
                );
                Ok(AnalysisOutcome::Complete(analysis))
            }
            Err(AssistantError::Configuration(e)) => Err(e),
            Err(AssistantError::Chain(e)) => {
                warn!(error = %e, "Analysis error, returning degraded result");
                Ok(AnalysisOutcome::degraded(&e))
            }
        }
    }

    /// Answer a question. Every failure is returned to the caller.
    pub async fn get_chat_response(
        &self,
        message: &str,
        language: &str,
    ) -> Result<String, AssistantError> {
        info!(language = %language, "Answering chat message");

        self.run_chat(Locale::from_code(language), prompts::chat_variables(message))
            .await
    }
}
