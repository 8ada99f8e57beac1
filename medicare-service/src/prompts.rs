//! Locale-specific prompt texts for the chat and analysis chains.

use prompt_flow::{Context, PromptTemplate};
use serde::{Deserialize, Serialize};

/// Template variable holding the raw medical record
pub const MEDICAL_TEXT: &str = "medical_text";
/// Template variable holding caller-supplied patient context
pub const CONTEXT: &str = "context";
/// Template variable holding the chat question
pub const USER_QUESTION: &str = "user_question";

/// Substituted for an empty analysis context.
pub const NO_CONTEXT_PROVIDED: &str = "No additional context provided";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Fr,
}

impl Locale {
    /// Anything other than French gets the English prompts.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_lowercase().as_str() {
            "fr" => Locale::Fr,
            _ => Locale::En,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Fr => "fr",
        }
    }

    fn texts(self) -> &'static LocaleTexts {
        match self {
            Locale::En => &ENGLISH,
            Locale::Fr => &FRENCH,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Chat,
    Analysis,
}

/// System instructions plus a user template with named placeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptSpec {
    pub system: &'static str,
    pub user: &'static str,
}

impl PromptSpec {
    pub fn template(self) -> PromptTemplate {
        PromptTemplate::new(self.system, self.user)
    }
}

struct LocaleTexts {
    chat: PromptSpec,
    analysis: PromptSpec,
}

static ENGLISH: LocaleTexts = LocaleTexts {
    chat: PromptSpec {
        system: "You are MediCare AI, a medical AI assistant for Cameroon.

Your responsibilities:
- Provide accurate, evidence-based medical information
- Explain medical concepts in simple terms
- Always recommend consulting qualified healthcare professionals
- Be culturally sensitive to the Cameroonian context

IMPORTANT: You are NOT a doctor. Never provide definitive diagnoses.",
        user: "{user_question}",
    },
    analysis: PromptSpec {
        system: "You are a medical AI assistant analyzing medical records.
Provide clear, accurate, and actionable insights.
Stay objective and always recommend professional medical consultation.",
        user: "Analyze this medical record and provide a structured analysis:

Medical Record:
{medical_text}

Additional Context:
{context}

{format_instructions}

Respond ONLY with valid JSON.",
    },
};

static FRENCH: LocaleTexts = LocaleTexts {
    chat: PromptSpec {
        system: "Vous êtes MediCare AI, un assistant médical IA pour le Cameroun.

Vos responsabilités:
- Fournir des informations médicales précises et basées sur des preuves
- Expliquer les concepts médicaux en termes simples
- Toujours recommander de consulter un professionnel de santé qualifié
- Être culturellement sensible au contexte camerounais

IMPORTANT: Vous n'êtes PAS un médecin. Ne donnez jamais de diagnostic définitif.",
        user: "{user_question}",
    },
    analysis: PromptSpec {
        system: "Vous êtes un assistant médical IA analysant des dossiers médicaux.
Fournissez des informations claires, précises et actionnables.
Restez objectif et recommandez toujours une consultation médicale professionnelle.",
        user: "Analysez ce dossier médical et fournissez une analyse structurée:

Dossier Médical:
{medical_text}

Contexte Additionnel:
{context}

{format_instructions}

Répondez UNIQUEMENT en JSON valide.",
    },
};

pub fn prompt_spec(task: TaskKind, locale: Locale) -> PromptSpec {
    let texts = locale.texts();
    match task {
        TaskKind::Chat => texts.chat,
        TaskKind::Analysis => texts.analysis,
    }
}

/// Variables for the analysis prompt; a blank context gets the stock placeholder.
pub fn analysis_variables(medical_text: &str, context: &str) -> Context {
    let context = if context.trim().is_empty() {
        NO_CONTEXT_PROVIDED
    } else {
        context
    };
    Context::new()
        .with(MEDICAL_TEXT, medical_text)
        .with(CONTEXT, context)
}

pub fn chat_variables(question: &str) -> Context {
    Context::new().with(USER_QUESTION, question)
}
