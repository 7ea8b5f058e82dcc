//! Integration tests for rollcall-api endpoints
//!
//! Tests cover:
//! - Upload page and script serving
//! - Health and roster endpoints
//! - Upload validation order (file part, filename, extension)
//! - Successful extraction response shape
//! - OCR failure responses carrying the failure record and sentinel summary
//!
//! A fake OCR engine stands in for Tesseract so these run on any host.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use rollcall_api::ocr::{OcrEngine, OcrError, TesseractEngine};
use rollcall_api::simulator::AttendanceSimulator;
use rollcall_api::{build_router, AppState};
use rollcall_common::Roster;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::util::ServiceExt; // for `oneshot` method

const BOUNDARY: &str = "rollcall-test-boundary";

/// What the fake engine should do when called
enum FakeOutcome {
    Text(&'static str),
    Unavailable,
    Fails(&'static str),
}

struct FakeEngine {
    outcome: FakeOutcome,
    calls: AtomicUsize,
}

impl FakeEngine {
    fn new(outcome: FakeOutcome) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OcrEngine for FakeEngine {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn is_available(&self) -> bool {
        !matches!(self.outcome, FakeOutcome::Unavailable)
    }

    async fn extract_text(&self, _image: Vec<u8>) -> Result<String, OcrError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.outcome {
            FakeOutcome::Text(text) => Ok(text.to_string()),
            FakeOutcome::Unavailable => Err(OcrError::EngineUnavailable),
            FakeOutcome::Fails(cause) => Err(OcrError::Processing(cause.to_string())),
        }
    }
}

/// Test helper: Create app around the given engine with the default roster
fn setup_app(engine: Arc<dyn OcrEngine>) -> axum::Router {
    let state = AppState::new(
        Roster::default(),
        engine,
        AttendanceSimulator::heuristic("CS 405 - Computer Vision"),
        1024 * 1024,
    );
    build_router(state)
}

/// Test helper: Create request with empty body
fn test_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// One multipart form part
struct Part<'a> {
    name: &'a str,
    filename: Option<&'a str>,
    bytes: &'a [u8],
}

fn part<'a>(name: &'a str, filename: Option<&'a str>, bytes: &'a [u8]) -> Part<'a> {
    Part { name, filename, bytes }
}

/// Test helper: Build a multipart POST /upload from the given parts
fn upload_request(parts: &[Part<'_>]) -> Request<Body> {
    let mut body = Vec::new();
    for Part { name, filename, bytes } in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        let disposition = match filename {
            Some(filename) => format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                name, filename
            ),
            None => format!("Content-Disposition: form-data; name=\"{}\"\r\n", name),
        };
        body.extend_from_slice(disposition.as_bytes());
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

/// Test helper: Encode a small blank PNG
fn blank_png() -> Vec<u8> {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(16, 16));
    let mut buf = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

// =============================================================================
// UI, Health and Roster
// =============================================================================

#[tokio::test]
async fn test_index_serves_html() {
    let app = setup_app(FakeEngine::new(FakeOutcome::Text("")));

    let response = app.oneshot(test_request("GET", "/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/html"));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("uploadForm"));
}

#[tokio::test]
async fn test_app_js_served() {
    let app = setup_app(FakeEngine::new(FakeOutcome::Text("")));

    let response = app.oneshot(test_request("GET", "/static/app.js")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/javascript");

    // The page lists the expected roster before any upload
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let script = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(script.contains("fetch('/api/roster')"));
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = setup_app(FakeEngine::new(FakeOutcome::Text("")));

    let response = app.oneshot(test_request("GET", "/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "rollcall-api");
    assert!(body["version"].is_string());
    assert_eq!(body["ocr_available"], true);
}

#[tokio::test]
async fn test_health_reports_missing_engine() {
    let app = setup_app(FakeEngine::new(FakeOutcome::Unavailable));

    let response = app.oneshot(test_request("GET", "/health")).await.unwrap();

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["ocr_available"], false);
}

#[tokio::test]
async fn test_roster_endpoint_lists_students_in_order() {
    let app = setup_app(FakeEngine::new(FakeOutcome::Text("")));

    let response = app.oneshot(test_request("GET", "/api/roster")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    let roster = body.as_array().unwrap();
    assert_eq!(roster.len(), 7);
    assert_eq!(roster[0]["roll_no"], "2301");
    assert_eq!(roster[5]["name"], "Kunal Desai");
}

// =============================================================================
// Upload Validation
// =============================================================================

#[tokio::test]
async fn test_upload_without_multipart_body_is_no_file_part() {
    let engine = FakeEngine::new(FakeOutcome::Text(""));
    let app = setup_app(engine.clone());

    let response = app.oneshot(test_request("POST", "/upload")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "No file part in the request");
    assert_eq!(engine.calls(), 0);
}

#[tokio::test]
async fn test_upload_missing_file_field() {
    let engine = FakeEngine::new(FakeOutcome::Text(""));
    let app = setup_app(engine.clone());

    let request = upload_request(&[part("document", Some("sheet.png"), b"data")]);
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "No file part in the request");
    assert!(body.get("extracted_data").is_none());
    assert_eq!(engine.calls(), 0);
}

#[tokio::test]
async fn test_upload_file_field_without_filename_is_not_a_file() {
    let app = setup_app(FakeEngine::new(FakeOutcome::Text("")));

    let request = upload_request(&[part("file", None, b"just text")]);
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "No file part in the request");
}

#[tokio::test]
async fn test_upload_empty_filename() {
    let engine = FakeEngine::new(FakeOutcome::Text(""));
    let app = setup_app(engine.clone());

    let request = upload_request(&[part("file", Some(""), b"")]);
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "No selected file");
    assert_eq!(engine.calls(), 0);
}

#[tokio::test]
async fn test_upload_disallowed_extension() {
    let engine = FakeEngine::new(FakeOutcome::Text("Sharma"));
    let app = setup_app(engine.clone());

    let request = upload_request(&[part("file", Some("sheet.gif"), b"GIF89a")]);
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(
        body["error"],
        "File type not allowed. Only PNG, JPG, JPEG are accepted."
    );
    assert_eq!(engine.calls(), 0);
}

// =============================================================================
// Successful Extraction
// =============================================================================

#[tokio::test]
async fn test_upload_success_response_shape() {
    let engine = FakeEngine::new(FakeOutcome::Text("Sharma signed\nPatil signed\nDesai\nDesai"));
    let app = setup_app(engine.clone());

    let request = upload_request(&[
        part("comment", None, b"ignored"),
        part("file", Some("Sheet.JPG"), b"jpeg bytes"),
    ]);
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(engine.calls(), 1);

    let body = extract_json(response.into_body()).await;
    assert_eq!(
        body["message"],
        "Structured extraction and anomaly check simulated successfully!"
    );
    assert_eq!(body["filename"], "Sheet.JPG");
    assert_eq!(body["raw_ocr_output"], "Sharma signed\nPatil signed\nDesai\nDesai");

    let summary = &body["summary"];
    assert_eq!(summary["subject"], "CS 405 - Computer Vision");
    assert_eq!(summary["total_students"], 7);
    assert_eq!(summary["present"], 3);
    assert_eq!(summary["anomalies_flagged"], 1);
    let date = summary["date"].as_str().unwrap();
    assert!(chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok());

    let records = body["extracted_data"].as_array().unwrap();
    assert_eq!(records.len(), 7);
    assert_eq!(records[0]["roll_no"], "2301");
    assert_eq!(records[0]["name"], "Priya Sharma");
    assert_eq!(records[0]["status"], "Present");
    assert_eq!(records[0]["anomaly_flag"], false);
    assert_eq!(records[2]["status"], "Absent");
    assert_eq!(records[2]["notes"], "No signature detected.");
    assert_eq!(records[5]["roll_no"], "2306");
    assert_eq!(records[5]["status"], "Signed");
    assert_eq!(records[5]["anomaly_flag"], true);
}

#[tokio::test]
async fn test_upload_suspicious_mark_flags_found_students() {
    let app = setup_app(FakeEngine::new(FakeOutcome::Text("Mehta X\nIyer")));

    let request = upload_request(&[part("file", Some("sheet.png"), b"png bytes")]);
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    let records = body["extracted_data"].as_array().unwrap();
    assert_eq!(records[2]["status"], "Proxy?");
    assert_eq!(records[6]["status"], "Proxy?");
    assert_eq!(records[6]["anomaly_flag"], true);
    assert_eq!(body["summary"]["anomalies_flagged"], 2);
    assert_eq!(body["summary"]["present"], 0);
}

// =============================================================================
// OCR Failures
// =============================================================================

#[tokio::test]
async fn test_upload_engine_unavailable() {
    let app = setup_app(FakeEngine::new(FakeOutcome::Unavailable));

    let request = upload_request(&[part("file", Some("sheet.png"), b"png bytes")]);
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = extract_json(response.into_body()).await;
    assert_eq!(
        body["error"],
        "Tesseract OCR Engine Not Found. Please check installation steps in the README."
    );
    assert_eq!(body["summary"]["anomalies_flagged"], 100);

    let records = body["extracted_data"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["roll_no"], "ERROR");
    assert_eq!(records[0]["name"], "System Error");
    assert_eq!(records[0]["status"], "FAILED");
    assert_eq!(records[0]["anomaly_flag"], true);
    assert_eq!(records[0]["notes"], "Tesseract Missing. See README.");
}

#[tokio::test]
async fn test_upload_processing_failure() {
    let app = setup_app(FakeEngine::new(FakeOutcome::Fails("cannot identify image file")));

    let request = upload_request(&[part("file", Some("sheet.jpeg"), b"not really a jpeg")]);
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = extract_json(response.into_body()).await;
    assert_eq!(
        body["error"],
        "An error occurred during OCR: cannot identify image file"
    );
    assert_eq!(body["summary"]["anomalies_flagged"], 100);
    assert_eq!(body["extracted_data"][0]["roll_no"], "ERROR");
    assert_eq!(body["extracted_data"][0]["notes"], "OCR Failed.");
}

#[tokio::test]
async fn test_upload_with_missing_tesseract_binary() {
    let engine = Arc::new(TesseractEngine::new("/nonexistent/rollcall/tesseract", "eng", 6));
    let app = setup_app(engine);

    let png = blank_png();
    let request = upload_request(&[part("file", Some("sheet.png"), &png)]);
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["summary"]["anomalies_flagged"], 100);
    assert_eq!(body["extracted_data"][0]["roll_no"], "ERROR");
    assert_eq!(body["extracted_data"][0]["notes"], "Tesseract Missing. See README.");
}
