use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChainError {
    #[error("Missing template variable: {0}")]
    MissingVariable(String),

    #[error("Malformed template: {0}")]
    MalformedTemplate(String),

    #[error("Upstream model error: {0}")]
    Upstream(String),

    #[error("Upstream model call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Output failed schema validation: {0}")]
    SchemaValidation(String),
}

impl ChainError {
    /// Whether a retry has any chance of producing a different outcome.
    pub fn is_transient(&self) -> bool {
        matches!(self, ChainError::Upstream(_) | ChainError::Timeout(_))
    }
}

pub type Result<T> = std::result::Result<T, ChainError>;
