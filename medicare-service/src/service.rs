use axum::{
    Router,
    extract::{Path, Request, State},
    http::{HeaderValue, StatusCode},
    middleware::{Next, from_fn},
    response::{Json, Response},
    routing::{get, post},
};
use prompt_flow::ChainError;
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{Instrument, error, info};
use uuid::Uuid;

use crate::{
    assistant::MedicalAssistant,
    config::AppConfig,
    embeddings::{Embedder, RigEmbedder},
    error::{AssistantError, WeatherError},
    gateway::RigGateway,
    models::{
        AnalysisResponse, AnalyzeRequest, ChatRequest, ChatResponse, EmbeddingsRequest,
        EmbeddingsResponse, WeatherSummaryResponse,
    },
    weather::{WeatherClient, summarize_weather},
};

pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<Value>)>;
type ApiError = (StatusCode, Json<Value>);

fn bad_request_error(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

fn internal_error(message: &str, details: &str) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": message,
            "details": details
        })),
    )
}

fn upstream_error(message: &str, details: &str) -> ApiError {
    (
        StatusCode::BAD_GATEWAY,
        Json(json!({
            "error": message,
            "details": details
        })),
    )
}

fn assistant_error(message: &str, e: &AssistantError) -> ApiError {
    match e {
        AssistantError::Configuration(_) => internal_error("Service is not configured", &e.to_string()),
        AssistantError::Chain(ChainError::Upstream(_) | ChainError::Timeout(_)) => {
            upstream_error(message, &e.to_string())
        }
        AssistantError::Chain(_) => internal_error(message, &e.to_string()),
    }
}

fn weather_error(e: &WeatherError) -> ApiError {
    match e {
        WeatherError::Configuration(_) | WeatherError::InvalidUrl(_) => {
            internal_error("Weather service is not configured", &e.to_string())
        }
        WeatherError::Http(_) | WeatherError::Status { .. } => {
            upstream_error("Failed to fetch weather data", &e.to_string())
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub assistant: MedicalAssistant,
    pub weather: WeatherClient,
    pub embedder: Arc<dyn Embedder>,
}

impl AppState {
    pub fn from_config(config: Arc<AppConfig>) -> Result<Self, WeatherError> {
        Ok(Self {
            assistant: MedicalAssistant::new(Arc::new(RigGateway::new(config.clone()))),
            weather: WeatherClient::new(&config)?,
            embedder: Arc::new(RigEmbedder::new(config)),
        })
    }
}

pub fn create_app(config: Arc<AppConfig>) -> Result<Router, WeatherError> {
    Ok(build_router(AppState::from_config(config)?))
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/api/analyze", post(analyze))
        .route("/api/chat", post(chat))
        .route("/api/weather/{city}", get(weather))
        .route("/api/weather/{city}/summary", get(weather_summary))
        .route("/api/embeddings", post(embeddings))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(from_fn(correlation_id_middleware))
        .with_state(app_state)
}

/// Tags every request with a fresh correlation id and runs it inside a span carrying it.
async fn correlation_id_middleware(mut request: Request, next: Next) -> Response {
    let correlation_id = Uuid::new_v4().to_string();
    let header = HeaderValue::from_str(&correlation_id).ok();

    if let Some(value) = &header {
        request
            .headers_mut()
            .insert(CORRELATION_ID_HEADER, value.clone());
    }

    let span = tracing::info_span!("http_request", correlation_id = %correlation_id);
    let mut response = next.run(request).instrument(span).await;

    if let Some(value) = header {
        response.headers_mut().insert(CORRELATION_ID_HEADER, value);
    }
    response
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": "MediCare Assistant",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Medical record analysis and health chat backed by hosted language models",
        "endpoints": {
            "POST /api/analyze": "Analyse a medical record into summary, findings, recommendations and next steps",
            "POST /api/chat": "Ask a health question",
            "GET /api/weather/{city}": "Current weather for a city",
            "GET /api/weather/{city}/summary": "One-line weather summary for a city",
            "POST /api/embeddings": "Embed a list of texts",
            "GET /health": "Health check"
        }
    }))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

fn require_text(value: &str, message: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(bad_request_error(message));
    }
    Ok(())
}

async fn analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> ApiResult<AnalysisResponse> {
    require_text(&request.text, "Medical record text is required")?;

    let outcome = state
        .assistant
        .analyze_medical_record(&request.text, &request.context, &request.language)
        .await
        .map_err(|e| {
            error!(error = %e, "Medical record analysis aborted");
            internal_error("Service is not configured", &e.to_string())
        })?;

    Ok(Json(outcome.into()))
}

async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> ApiResult<ChatResponse> {
    require_text(&request.message, "Message is required")?;

    let response = state
        .assistant
        .get_chat_response(&request.message, &request.language)
        .await
        .map_err(|e| {
            error!(error = %e, "Chat request failed");
            assistant_error("Failed to get chat response", &e)
        })?;

    Ok(Json(ChatResponse {
        response,
        language: request.language,
    }))
}

async fn weather(State(state): State<AppState>, Path(city): Path<String>) -> ApiResult<Value> {
    let envelope = state.weather.fetch_weather(&city).await.map_err(|e| {
        error!(city = %city, error = %e, "Weather lookup failed");
        weather_error(&e)
    })?;
    Ok(Json(envelope))
}

async fn weather_summary(
    State(state): State<AppState>,
    Path(city): Path<String>,
) -> ApiResult<WeatherSummaryResponse> {
    let envelope = state.weather.fetch_weather(&city).await.map_err(|e| {
        error!(city = %city, error = %e, "Weather lookup failed");
        weather_error(&e)
    })?;

    let summary = summarize_weather(&city, &envelope).ok_or_else(|| {
        upstream_error(
            "Unexpected weather payload",
            "missing description, temperature or humidity",
        )
    })?;

    Ok(Json(WeatherSummaryResponse { city, summary }))
}

async fn embeddings(
    State(state): State<AppState>,
    Json(request): Json<EmbeddingsRequest>,
) -> ApiResult<EmbeddingsResponse> {
    info!(count = request.texts.len(), "Embedding texts");

    let embeddings = state
        .embedder
        .embed_texts(&request.texts)
        .await
        .map_err(|e| {
            error!(error = %e, "Embedding request failed");
            assistant_error("Failed to generate embeddings", &e)
        })?;

    Ok(Json(EmbeddingsResponse {
        model: state.embedder.model_id().to_string(),
        dimensions: embeddings.first().map(Vec::len).unwrap_or(0),
        embeddings,
    }))
}
