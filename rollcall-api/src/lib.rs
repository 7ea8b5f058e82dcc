//! rollcall-api library - attendance sheet upload service
//!
//! Accepts a photographed attendance sheet, runs OCR over it and maps the
//! text onto the configured roster.

use axum::extract::DefaultBodyLimit;
use axum::Router;
use rollcall_common::config::TomlConfig;
use rollcall_common::Roster;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;
pub mod ocr;
pub mod simulator;

pub use error::{ApiError, ApiResult};

use ocr::{OcrEngine, TesseractEngine};
use simulator::AttendanceSimulator;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Expected attendees (read-only)
    pub roster: Arc<Roster>,
    /// Text extractor
    pub engine: Arc<dyn OcrEngine>,
    /// Roster matcher
    pub simulator: Arc<AttendanceSimulator>,
    /// Largest accepted request body
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Create new application state
    pub fn new(
        roster: Roster,
        engine: Arc<dyn OcrEngine>,
        simulator: AttendanceSimulator,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            roster: Arc::new(roster),
            engine,
            simulator: Arc::new(simulator),
            max_upload_bytes,
        }
    }

    /// Wire up Tesseract and the heuristic simulator from bootstrap config
    pub fn from_config(config: &TomlConfig) -> rollcall_common::Result<Self> {
        let roster = config.roster()?;
        let engine: Arc<dyn OcrEngine> = Arc::new(TesseractEngine::from_config(&config.ocr));
        let simulator = AttendanceSimulator::heuristic(config.subject.clone());

        Ok(Self::new(roster, engine, simulator, config.max_upload_bytes))
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    let body_limit = state.max_upload_bytes;

    // Upload form and its script
    let ui = Router::new()
        .route("/", get(api::serve_index))
        .route("/static/app.js", get(api::serve_app_js));

    let api = Router::new()
        .route("/upload", post(api::upload_sheet))
        .route("/api/roster", get(api::get_roster))
        .merge(api::health_routes());

    Router::new()
        .merge(ui)
        .merge(api)
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        // Enable CORS for local access
        .layer(CorsLayer::permissive())
}
