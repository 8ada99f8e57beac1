pub mod analysis;
pub mod assistant;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod gateway;
pub mod models;
pub mod prompts;
pub mod service;
pub mod weather;

#[cfg(test)]
mod test_support;

pub use analysis::{AnalysisOutcome, MedicalAnalysis};
pub use assistant::{ChainOutput, MedicalAssistant};
pub use config::{AppConfig, Provider};
pub use embeddings::{Embedder, RigEmbedder};
pub use error::{AssistantError, ConfigError, WeatherError};
pub use gateway::{ModelGateway, ModelKind, RigGateway};
pub use prompts::{Locale, TaskKind};
pub use service::{AppState, build_router, create_app};
pub use weather::WeatherClient;
