//! Upload intake: allow-listing, filename sanitizing, and saving to disk.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::extractor::{ExtractionRequest, ALLOWED_EXTENSIONS};

/// A file written to the upload directory.
#[derive(Debug, Clone)]
pub struct SavedUpload {
    pub filename: String,
    pub path: PathBuf,
    pub extension: String,
    pub content_hash: String,
}

impl SavedUpload {
    pub fn request(&self) -> ExtractionRequest {
        ExtractionRequest {
            path: self.path.clone(),
            extension: self.extension.clone(),
        }
    }
}

/// Lower-cased extension after the last dot, if any.
pub fn extension_of(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() && ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

pub fn allowed_file(filename: &str) -> bool {
    extension_of(filename)
        .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Reduce a client-supplied filename to a safe single path component.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();

    let cleaned: String = base
        .chars()
        .filter_map(|c| match c {
            c if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') => Some(c),
            c if c.is_whitespace() => Some('_'),
            _ => None,
        })
        .collect();

    let trimmed = cleaned.trim_start_matches(['.', '_']);
    if trimmed.is_empty() {
        "upload".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Write `data` under `dir` using the sanitized name, returning its location and hash.
pub fn save_upload(dir: &Path, filename: &str, data: &[u8]) -> Result<SavedUpload> {
    let filename = sanitize_filename(filename);
    let extension = extension_of(&filename).unwrap_or_default();

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create upload dir: {:?}", dir))?;
    let path = dir.join(&filename);
    std::fs::write(&path, data).with_context(|| format!("Failed to write upload: {:?}", path))?;

    let content_hash = {
        let mut hasher = Sha256::new();
        hasher.update(data);
        format!("{:x}", hasher.finalize())
    };

    debug!("Saved upload {:?} ({} bytes)", path, data.len());
    Ok(SavedUpload {
        filename,
        path,
        extension,
        content_hash,
    })
}
