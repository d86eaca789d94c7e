//! HTTP surface: health check, the humanise endpoint and the static frontend.

pub mod server;

use std::path::Path;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use thiserror::Error;
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing::{error, info};

use crate::models::{ErrorResponse, HealthResponse, HumaniseRequest, HumaniseResponse, ValidationError};
use crate::services::HumaniserPipeline;

pub use server::{serve, ServerError};

const HEALTH_PATH: &str = "/api/health";
const HUMANISE_PATH: &str = "/api/humanise";

#[derive(Clone)]
pub struct AppState {
    pub pipeline: HumaniserPipeline,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    Pipeline(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Pipeline(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// `/api/*` routes only
pub fn build_api_router(state: AppState) -> Router {
    Router::new()
        .route(HEALTH_PATH, get(health))
        .route(HUMANISE_PATH, post(humanise))
        .with_state(state)
}

/// API routes plus the static frontend, CORS and request tracing
pub fn build_app_router(state: AppState, static_dir: &Path) -> Router {
    let index = static_dir.join("index.html");
    let frontend = ServeDir::new(static_dir).fallback(ServeFile::new(index));

    build_api_router(state)
        .fallback_service(frontend)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

async fn humanise(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<HumaniseResponse>, ApiError> {
    // A missing or unparsable body counts as `{}`
    let request: HumaniseRequest = serde_json::from_slice(&body).unwrap_or_default();
    let text = request.requested_text()?;

    let pipeline = state.pipeline.clone();
    let input = text.clone();
    let humanised = tokio::spawn(async move { pipeline.humanise(&input).await })
        .await
        .map_err(|e| {
            error!(error = %e, "humanise.pipeline_failed");
            ApiError::Pipeline(e.to_string())
        })?;

    info!(
        input_chars = text.chars().count(),
        output_chars = humanised.chars().count(),
        "humanise.completed"
    );

    Ok(Json(HumaniseResponse {
        original: text,
        humanised,
    }))
}
