//! Sheet upload endpoint
//!
//! POST /upload with a multipart `file` part holding a PNG or JPEG.
//! Validation happens before any bytes are read; the image is never written
//! to disk.

use axum::{
    extract::{
        multipart::{Multipart, MultipartRejection},
        State,
    },
    Json,
};
use rollcall_common::{AttendanceRecord, Summary};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Multipart field carrying the sheet image
const FILE_FIELD: &str = "file";

/// Accepted extensions, compared case-insensitively
const ALLOWED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

const SUCCESS_MESSAGE: &str = "Structured extraction and anomaly check simulated successfully!";

/// Successful upload response
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub filename: String,
    pub summary: Summary,
    pub extracted_data: Vec<AttendanceRecord>,
    pub raw_ocr_output: String,
}

/// Validated upload, held in memory for the duration of the request
struct UploadedFile {
    filename: String,
    bytes: Vec<u8>,
}

/// POST /upload
///
/// Extracts text from the uploaded sheet and maps it onto the roster.
pub async fn upload_sheet(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<UploadResponse>> {
    let upload = read_upload(multipart).await?;
    info!(
        filename = %upload.filename,
        bytes = upload.bytes.len(),
        engine = state.engine.name(),
        "Processing attendance sheet"
    );

    let raw_text = state.engine.extract_text(upload.bytes).await?;
    debug!(chars = raw_text.len(), "OCR text extracted");

    let result = state.simulator.simulate_today(&raw_text, &state.roster);
    info!(
        filename = %upload.filename,
        total = result.summary.total_students,
        present = result.summary.present_count,
        anomalies = result.summary.anomalies_flagged,
        "Attendance simulated"
    );

    Ok(Json(UploadResponse {
        message: SUCCESS_MESSAGE.to_string(),
        filename: upload.filename,
        summary: result.summary,
        extracted_data: result.records,
        raw_ocr_output: raw_text,
    }))
}

/// Find the `file` part and validate it, in order: present, named, allowed type
async fn read_upload(multipart: Result<Multipart, MultipartRejection>) -> ApiResult<UploadedFile> {
    let mut multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            debug!("Request body is not multipart: {}", rejection);
            return Err(ApiError::NoFilePart);
        }
    };

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        // A `file` part without a filename parameter is a plain form value
        let Some(filename) = field.file_name().map(str::to_owned) else {
            continue;
        };

        if filename.is_empty() {
            return Err(ApiError::NoSelectedFile);
        }
        if !allowed_file(&filename) {
            return Err(ApiError::FileTypeNotAllowed);
        }

        let bytes = field.bytes().await?;
        return Ok(UploadedFile {
            filename,
            bytes: bytes.to_vec(),
        });
    }

    Err(ApiError::NoFilePart)
}

/// Extension after the last dot is one of [`ALLOWED_EXTENSIONS`]
fn allowed_file(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| {
            let ext = ext.to_ascii_lowercase();
            ALLOWED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}
