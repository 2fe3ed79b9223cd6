//! Extraction dispatcher: routes each file to the pattern or model strategy.

use std::path::PathBuf;

use tracing::{info, warn};

use crate::patterns::FieldPatterns;
use crate::schema::{CanonicalRecord, Strategy};
use crate::text_extractor;
use crate::vision::ImageFieldExtractor;

/// Upload extensions accepted by the service.
pub const ALLOWED_EXTENSIONS: [&str; 6] = ["pdf", "docx", "png", "jpg", "jpeg", "webp"];

/// File kinds, one per extraction route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    Image,
}

impl DocumentKind {
    /// Classify an extension (case-insensitive). `None` for anything off the allow-list.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "png" | "jpg" | "jpeg" | "webp" => Some(Self::Image),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Image => "image",
        }
    }
}

/// A saved file awaiting extraction.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    pub path: PathBuf,
    pub extension: String,
}

/// Record produced for one file, tagged with the strategy that built it.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub record: CanonicalRecord,
    pub strategy: Strategy,
}

/// Extraction pipeline orchestrator.
pub struct Extractor {
    patterns: FieldPatterns,
    images: ImageFieldExtractor,
}

impl Extractor {
    pub fn new(patterns: FieldPatterns, images: ImageFieldExtractor) -> Self {
        Self { patterns, images }
    }

    /// Extract one file.
    ///
    /// PDF and DOCX always yield a record (unreadable content degrades to an
    /// all-sentinel record). Images yield `None` on any failure. There is no
    /// fallback between the two strategies.
    pub async fn extract(&self, request: &ExtractionRequest) -> Option<Extraction> {
        let Some(kind) = DocumentKind::from_extension(&request.extension) else {
            warn!(
                "Refusing {:?}: extension .{} is not allow-listed",
                request.path, request.extension
            );
            return None;
        };

        info!("Extracting {:?} as {}", request.path, kind.as_str());

        match kind {
            DocumentKind::Pdf | DocumentKind::Docx => {
                let text = text_extractor::extract_text(&request.path, kind).unwrap_or_else(|e| {
                    warn!("Treating {:?} as empty text: {}", request.path, e);
                    String::new()
                });
                Some(Extraction {
                    record: self.patterns.parse_text_fields(&text),
                    strategy: Strategy::Pattern,
                })
            }
            DocumentKind::Image => match self.images.parse_image_fields(&request.path).await {
                Ok(record) => Some(Extraction {
                    record,
                    strategy: Strategy::Model,
                }),
                Err(e) => {
                    warn!("Skipping {:?}: {}", request.path, e);
                    None
                }
            },
        }
    }
}
