//! Error types for rollcall-api
//!
//! Every failure on the upload path ends here and is rendered as JSON:
//! - validation errors → 400 `{error}`
//! - OCR errors → 500 `{error, extracted_data: [failure record], summary: {anomalies_flagged: 100}}`
//! - anything else → 500 `{error}`

use crate::ocr::OcrError;
use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rollcall_common::{AttendanceRecord, FailureSummary};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// No `file` part in the multipart body (400)
    #[error("No file part in the request")]
    NoFilePart,

    /// `file` part sent with an empty filename (400)
    #[error("No selected file")]
    NoSelectedFile,

    /// Extension outside the allow-list (400)
    #[error("File type not allowed. Only PNG, JPG, JPEG are accepted.")]
    FileTypeNotAllowed,

    /// Text extraction failed (500, with failure record)
    #[error(transparent)]
    Ocr(#[from] OcrError),

    /// Anything unanticipated (500)
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::Unexpected(err.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();

        match self {
            ApiError::NoFilePart | ApiError::NoSelectedFile | ApiError::FileTypeNotAllowed => {
                warn!("Upload rejected: {}", message);
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Ocr(ref err) => {
                error!("OCR failed: {}", message);
                let body = Json(json!({
                    "error": message,
                    "extracted_data": [AttendanceRecord::system_error(err.record_notes())],
                    "summary": FailureSummary::default(),
                }));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
            ApiError::Unexpected(_) => {
                error!("{}", message);
                (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": message }))).into_response()
            }
        }
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
