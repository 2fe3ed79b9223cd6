//! Failure reasons for a single file's extraction.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("{format} extraction failed: {reason}")]
    Document { format: &'static str, reason: String },
    #[error("image decode failed: {0}")]
    ImageDecode(#[from] image::ImageError),
    #[error("inference service failed: {0:#}")]
    Inference(anyhow::Error),
    #[error("response is not valid JSON: {0}")]
    ResponseDecode(#[from] serde_json::Error),
    #[error("response JSON has unexpected shape: {0}")]
    UnexpectedShape(String),
    #[error("unsupported file type: .{0}")]
    UnsupportedType(String),
}

impl ExtractionError {
    pub fn document(format: &'static str, reason: impl ToString) -> Self {
        Self::Document {
            format,
            reason: reason.to_string(),
        }
    }
}
