use prompt_flow::{ChainError, OutputParser, SchemaParser};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::sync::LazyLock;

pub const DEGRADED_SUMMARY_PREFIX: &str = "Analysis completed but encountered formatting issues: ";
const MAX_REASON_CHARS: usize = 200;

const FALLBACK_FINDING: &str = "Analysis was performed but results need manual review";
const FALLBACK_RECOMMENDATION: &str =
    "Consult with a healthcare professional for detailed interpretation";
const FALLBACK_NEXT_STEPS: [&str; 2] = [
    "Schedule appointment with your doctor",
    "Keep this record for your medical history",
];

/// Structured analysis of a medical record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MedicalAnalysis {
    /// Brief, plain-language summary of the medical record
    pub summary: String,
    /// Important findings from the record (abnormal values, diagnoses, notable observations)
    pub key_findings: Vec<String>,
    /// Health recommendations based on the findings
    pub recommendations: Vec<String>,
    /// Concrete next steps the patient should take
    pub next_steps: Vec<String>,
}

static ANALYSIS_PARSER: LazyLock<SchemaParser<MedicalAnalysis>> = LazyLock::new(SchemaParser::new);

fn bounded_reason(error: &impl Display) -> String {
    error.to_string().chars().take(MAX_REASON_CHARS).collect()
}

impl MedicalAnalysis {
    /// Generic result used when the model output could not be obtained or validated.
    pub fn fallback(error: &impl Display) -> Self {
        let reason = bounded_reason(error);
        Self {
            summary: format!("{}{}", DEGRADED_SUMMARY_PREFIX, reason),
            key_findings: vec![FALLBACK_FINDING.to_string()],
            recommendations: vec![FALLBACK_RECOMMENDATION.to_string()],
            next_steps: FALLBACK_NEXT_STEPS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// The parser whose schema feeds the prompt and whose validator checks the reply.
pub fn analysis_parser() -> SchemaParser<MedicalAnalysis> {
    SchemaParser::new()
}

pub fn decode_analysis(raw: &str) -> Result<MedicalAnalysis, ChainError> {
    ANALYSIS_PARSER.parse(raw)
}

/// Result of an analysis request, with degradation made explicit.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    Complete(MedicalAnalysis),
    Degraded {
        analysis: MedicalAnalysis,
        reason: String,
    },
}

impl AnalysisOutcome {
    pub fn degraded(error: &impl Display) -> Self {
        AnalysisOutcome::Degraded {
            analysis: MedicalAnalysis::fallback(error),
            reason: bounded_reason(error),
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, AnalysisOutcome::Degraded { .. })
    }

    pub fn analysis(&self) -> &MedicalAnalysis {
        match self {
            AnalysisOutcome::Complete(analysis) | AnalysisOutcome::Degraded { analysis, .. } => {
                analysis
            }
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            AnalysisOutcome::Complete(_) => None,
            AnalysisOutcome::Degraded { reason, .. } => Some(reason),
        }
    }

    pub fn into_analysis(self) -> MedicalAnalysis {
        match self {
            AnalysisOutcome::Complete(analysis) | AnalysisOutcome::Degraded { analysis, .. } => {
                analysis
            }
        }
    }
}
