//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
    /// Whether the OCR engine binary can be launched
    pub ocr_available: bool,
}

/// GET /health
///
/// Reports "ok" even when the OCR engine is missing; uploads will then fail
/// with the engine-unavailable response.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let engine = state.engine.clone();
    let ocr_available = tokio::task::spawn_blocking(move || engine.is_available())
        .await
        .unwrap_or(false);

    Json(HealthResponse {
        status: "ok".to_string(),
        module: "rollcall-api".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        ocr_available,
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
