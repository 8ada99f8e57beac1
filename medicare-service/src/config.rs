//! Process-wide configuration, loaded once at startup and shared read-only.
//!
//! Secrets are kept optional here; asking for one that is absent yields a
//! [`ConfigError`] at the point of use, so a service without a weather key can
//! still analyse records.

use prompt_flow::RetryPolicy;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

pub const GOOGLE_API_KEY: &str = "GOOGLE_API_KEY";
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const GROQ_API_KEY: &str = "GROQ_API_KEY";
pub const WEATHER_API_KEY: &str = "WEATHER_API_KEY";

const LLM_PROVIDER: &str = "LLM_PROVIDER";
const LLM_MODEL: &str = "LLM_MODEL";
const LLM_TIMEOUT_SECS: &str = "LLM_TIMEOUT_SECS";
const LLM_MAX_ATTEMPTS: &str = "LLM_MAX_ATTEMPTS";
const WEATHER_API_BASE_URL: &str = "WEATHER_API_BASE_URL";
const PORT: &str = "PORT";

pub const DEFAULT_WEATHER_BASE_URL: &str = "https://api.openweathermap.org";
pub const DEFAULT_PORT: u16 = 3000;

/// Hosted model provider behind the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Provider {
    #[default]
    Gemini,
    OpenAi,
    Groq,
}

impl Provider {
    pub fn api_key_var(self) -> &'static str {
        match self {
            Provider::Gemini => GOOGLE_API_KEY,
            Provider::OpenAi => OPENAI_API_KEY,
            Provider::Groq => GROQ_API_KEY,
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Provider::Gemini => "gemini-2.5-flash",
            Provider::OpenAi => "gpt-4o-mini",
            Provider::Groq => "llama-3.3-70b-versatile",
        }
    }
}

impl FromStr for Provider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" => Ok(Provider::Gemini),
            "openai" => Ok(Provider::OpenAi),
            "groq" => Ok(Provider::Groq),
            _ => Err(ConfigError::Invalid {
                key: LLM_PROVIDER,
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    google_api_key: Option<String>,
    openai_api_key: Option<String>,
    groq_api_key: Option<String>,
    weather_api_key: Option<String>,
    pub provider: Provider,
    /// Overrides the provider's default model id
    pub model: Option<String>,
    pub retry: RetryPolicy,
    pub weather_base_url: String,
    pub port: u16,
}

impl AppConfig {
    /// Reads `.env` (if present) and then the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded .env file");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let provider = match secret(LLM_PROVIDER) {
            Some(value) => value.parse()?,
            None => Provider::default(),
        };

        let mut retry = RetryPolicy::default();
        if let Some(secs) = parse_var::<u64>(&lookup, LLM_TIMEOUT_SECS)? {
            retry.attempt_timeout = Duration::from_secs(secs);
        }
        if let Some(attempts) = parse_var::<usize>(&lookup, LLM_MAX_ATTEMPTS)? {
            if attempts == 0 {
                return Err(ConfigError::Invalid {
                    key: LLM_MAX_ATTEMPTS,
                    value: attempts.to_string(),
                });
            }
            retry.max_attempts = attempts;
        }

        Ok(Self {
            google_api_key: secret(GOOGLE_API_KEY),
            openai_api_key: secret(OPENAI_API_KEY),
            groq_api_key: secret(GROQ_API_KEY),
            weather_api_key: secret(WEATHER_API_KEY),
            provider,
            model: secret(LLM_MODEL),
            retry,
            weather_base_url: secret(WEATHER_API_BASE_URL)
                .unwrap_or_else(|| DEFAULT_WEATHER_BASE_URL.to_string()),
            port: parse_var(&lookup, PORT)?.unwrap_or(DEFAULT_PORT),
        })
    }

    /// Key for the given provider, or a configuration error if it was not supplied.
    pub fn api_key(&self, provider: Provider) -> Result<&str, ConfigError> {
        let key = match provider {
            Provider::Gemini => &self.google_api_key,
            Provider::OpenAi => &self.openai_api_key,
            Provider::Groq => &self.groq_api_key,
        };
        key.as_deref()
            .ok_or(ConfigError::MissingKey(provider.api_key_var()))
    }

    pub fn google_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key(Provider::Gemini)
    }

    pub fn weather_api_key(&self) -> Result<&str, ConfigError> {
        self.weather_api_key
            .as_deref()
            .ok_or(ConfigError::MissingKey(WEATHER_API_KEY))
    }

    pub fn model_id(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value }),
        _ => Ok(None),
    }
}

// Keys stay out of logs.
impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |key: &Option<String>| if key.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("AppConfig")
            .field("google_api_key", &redact(&self.google_api_key))
            .field("openai_api_key", &redact(&self.openai_api_key))
            .field("groq_api_key", &redact(&self.groq_api_key))
            .field("weather_api_key", &redact(&self.weather_api_key))
            .field("provider", &self.provider)
            .field("model", &self.model_id())
            .field("retry", &self.retry)
            .field("weather_base_url", &self.weather_base_url)
            .field("port", &self.port)
            .finish()
    }
}
