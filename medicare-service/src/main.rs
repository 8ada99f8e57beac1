use medicare_service::{AppConfig, create_app};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter. `rig` logs at info so provider request bodies stay out of the output.
const DEFAULT_LOG_FILTER: &str = "medicare_service=debug,prompt_flow=debug,tower_http=debug,rig=info";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Json,
    Pretty,
    Compact,
}

impl LogFormat {
    fn from_env_value(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("pretty") => LogFormat::Pretty,
            Some("compact") => LogFormat::Compact,
            _ => LogFormat::Json,
        }
    }
}

fn init_tracing() {
    let format = LogFormat::from_env_value(std::env::var("LOG_FORMAT").ok().as_deref());
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let registry = tracing_subscriber::registry().with(env_filter);

    match format {
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).init(),
        LogFormat::Compact => registry.with(fmt::layer().compact()).init(),
        // Only the innermost span is kept, so each line carries the request's correlation_id.
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_target(true),
            )
            .init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = match AppConfig::from_env() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };

    // Keys are checked lazily; warn early so a misconfigured deploy is visible.
    if let Err(e) = config.api_key(config.provider) {
        error!(error = %e, "Model provider key missing, analysis and chat will fail");
    }
    info!(?config, "Configuration loaded");

    let app = create_app(config.clone())?;
    let listener = TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    let addr = listener.local_addr()?;

    info!("MediCare Assistant starting on {}", addr);
    info!("Health check endpoint: http://{}/health", addr);
    info!("Analysis endpoint: POST http://{}/api/analyze", addr);
    info!("Chat endpoint: POST http://{}/api/chat", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
