//! Model-based field extraction from resume images.
//!
//! Defines the [`VisionModel`] trait so the inference backend is injected at
//! construction time and can be swapped for a fake in tests.

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::ExtractionError;
use crate::normalizer;
use crate::schema::CanonicalRecord;

/// Instruction sent alongside every resume image.
pub const RESUME_PROMPT: &str = "You are an expert Resume Parser. Analyze this resume image and extract:
Name, Contact, Email, College, Degree, Department, Location, Passed Out.
Return ONLY clean JSON.";

/// Async trait implemented by each multimodal inference backend.
#[async_trait::async_trait]
pub trait VisionModel: Send + Sync {
    fn name(&self) -> &str;

    /// Send a prompt plus one PNG image, return the raw response text.
    async fn complete(&self, prompt: &str, image_png: &[u8]) -> anyhow::Result<String>;
}

/// Extracts canonical fields from an image via a [`VisionModel`].
#[derive(Clone)]
pub struct ImageFieldExtractor {
    model: Arc<dyn VisionModel>,
}

impl ImageFieldExtractor {
    pub fn new(model: Arc<dyn VisionModel>) -> Self {
        Self { model }
    }

    pub async fn parse_image_fields(&self, path: &Path) -> Result<CanonicalRecord, ExtractionError> {
        let png = load_as_png(path)?;
        info!(
            "Sending {:?} ({} PNG bytes) to {}",
            path,
            png.len(),
            self.model.name()
        );

        let response = self
            .model
            .complete(RESUME_PROMPT, &png)
            .await
            .map_err(ExtractionError::Inference)?;
        debug!("Raw model response length: {} chars", response.len());

        normalizer::normalize(&response)
    }
}

/// Decode any supported image format and re-encode it as PNG.
fn load_as_png(path: &Path) -> Result<Vec<u8>, ExtractionError> {
    let img = image::open(path)?;
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageOutputFormat::Png)?;
    Ok(buf)
}
