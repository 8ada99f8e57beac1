use serde::{Deserialize, Serialize};

use crate::analysis::{AnalysisOutcome, MedicalAnalysis};

fn default_language() -> String {
    "en".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeRequest {
    pub text: String,
    #[serde(default)]
    pub context: String,
    #[serde(default = "default_language")]
    pub language: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    Complete,
    Degraded,
}

/// Analysis fields at the top level, plus whether the fallback was used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub status: AnalysisStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(flatten)]
    pub analysis: MedicalAnalysis,
}

impl From<AnalysisOutcome> for AnalysisResponse {
    fn from(outcome: AnalysisOutcome) -> Self {
        match outcome {
            AnalysisOutcome::Complete(analysis) => Self {
                status: AnalysisStatus::Complete,
                reason: None,
                analysis,
            },
            AnalysisOutcome::Degraded { analysis, reason } => Self {
                status: AnalysisStatus::Degraded,
                reason: Some(reason),
                analysis,
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default = "default_language")]
    pub language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherSummaryResponse {
    pub city: String,
    pub summary: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingsRequest {
    pub texts: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingsResponse {
    pub model: String,
    pub dimensions: usize,
    pub embeddings: Vec<Vec<f64>>,
}
