use prompt_flow::ChainError;
use thiserror::Error;

/// Missing or unusable configuration. Never recovered from.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{0} environment variable is not set")]
    MissingKey(&'static str),

    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Error, Debug)]
pub enum AssistantError {
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    #[error(transparent)]
    Chain(#[from] ChainError),
}

#[derive(Error, Debug)]
pub enum WeatherError {
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    #[error("Invalid weather API URL: {0}")]
    InvalidUrl(String),

    #[error("Weather API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Weather API returned status {status}: {body}")]
    Status { status: u16, body: String },
}
