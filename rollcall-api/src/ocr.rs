//! Text extraction from uploaded sheet images
//!
//! The image is decoded in-process first so that corrupt or unsupported
//! uploads are rejected before the engine is spawned. Recognition itself is
//! delegated to the external `tesseract` binary, fed the original bytes on
//! stdin and read back from stdout.

use async_trait::async_trait;
use image::ImageFormat;
use rollcall_common::config::OcrConfig;
use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::{debug, info};

/// OCR failure categories
#[derive(Debug, Error)]
pub enum OcrError {
    /// Engine binary is not installed or not on PATH
    #[error("Tesseract OCR Engine Not Found. Please check installation steps in the README.")]
    EngineUnavailable,

    /// Decoding or recognition failed for any other reason
    #[error("An error occurred during OCR: {0}")]
    Processing(String),
}

impl OcrError {
    /// Notes carried by the failure record in the error response
    pub fn record_notes(&self) -> &'static str {
        match self {
            OcrError::EngineUnavailable => "Tesseract Missing. See README.",
            OcrError::Processing(_) => "OCR Failed.",
        }
    }
}

/// Converts raw image bytes into plain text
#[async_trait]
pub trait OcrEngine: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether the engine can currently be invoked on this host
    fn is_available(&self) -> bool;

    async fn extract_text(&self, image: Vec<u8>) -> Result<String, OcrError>;
}

/// Tesseract invoked as a subprocess
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    binary_path: PathBuf,
    language: String,
    page_segmentation_mode: u8,
}

impl TesseractEngine {
    pub fn new(binary_path: impl Into<PathBuf>, language: impl Into<String>, page_segmentation_mode: u8) -> Self {
        Self {
            binary_path: binary_path.into(),
            language: language.into(),
            page_segmentation_mode,
        }
    }

    pub fn from_config(config: &OcrConfig) -> Self {
        Self::new(
            config.tesseract_path.clone(),
            config.language.clone(),
            config.page_segmentation_mode,
        )
    }
}

#[async_trait]
impl OcrEngine for TesseractEngine {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn is_available(&self) -> bool {
        Command::new(&self.binary_path)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok()
    }

    async fn extract_text(&self, image: Vec<u8>) -> Result<String, OcrError> {
        let engine = self.clone();

        // Decoding and recognition are CPU-bound; keep them off the async workers
        tokio::task::spawn_blocking(move || {
            check_image(&image)?;
            engine.run(&image)
        })
        .await
        .map_err(|e| OcrError::Processing(format!("Task join error: {}", e)))?
    }
}

impl TesseractEngine {
    /// Usage: tesseract stdin stdout -l <lang> --psm <mode>
    fn run(&self, image: &[u8]) -> Result<String, OcrError> {
        debug!(
            binary = %self.binary_path.display(),
            language = %self.language,
            psm = self.page_segmentation_mode,
            bytes = image.len(),
            "Running tesseract"
        );

        let mut child = Command::new(&self.binary_path)
            .arg("stdin")
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .arg("--psm")
            .arg(self.page_segmentation_mode.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => OcrError::EngineUnavailable,
                _ => OcrError::Processing(e.to_string()),
            })?;

        // Feed stdin from its own thread while stdout/stderr are drained, so an
        // early exit surfaces tesseract's stderr and the child is always reaped
        let stdin = child.stdin.take();
        let (write_result, output) = std::thread::scope(|scope| {
            let writer = scope.spawn(move || match stdin {
                Some(mut stdin) => stdin.write_all(image),
                None => Ok(()),
            });
            let output = child.wait_with_output();
            (writer.join(), output)
        });

        let output = output.map_err(|e| OcrError::Processing(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Processing(format!(
                "Exit code: {:?}, stderr: {}",
                output.status.code(),
                stderr.trim()
            )));
        }

        match write_result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                return Err(OcrError::Processing(format!(
                    "Failed to send image to tesseract: {}",
                    e
                )))
            }
            Err(_) => {
                return Err(OcrError::Processing(
                    "Image writer thread panicked".to_string(),
                ))
            }
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        info!(chars = text.len(), "Tesseract recognition completed");
        Ok(text)
    }
}

/// Verify the bytes are a PNG or JPEG that actually decodes
fn check_image(bytes: &[u8]) -> Result<(), OcrError> {
    let format = image::guess_format(bytes)
        .map_err(|e| OcrError::Processing(format!("cannot identify image file: {}", e)))?;

    if !matches!(format, ImageFormat::Png | ImageFormat::Jpeg) {
        return Err(OcrError::Processing(format!(
            "unsupported image format: {:?}",
            format
        )));
    }

    let decoded = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| OcrError::Processing(e.to_string()))?;
    debug!(
        width = decoded.width(),
        height = decoded.height(),
        ?format,
        "Decoded sheet image"
    );
    Ok(())
}
