//! Service configuration, read from the environment (after `.env` is loaded).

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

const DEFAULT_MODEL: &str = "google/gemini-2.5-flash";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_UPLOAD_DIR: &str = "uploads";
const DEFAULT_MAX_UPLOAD_MB: usize = 100;
const DEFAULT_INFERENCE_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub upload_dir: PathBuf,
    /// Model identifier passed to the inference service.
    pub vision_model: String,
    /// Shared secret for the admin endpoints. `None` leaves them open.
    pub admin_token: Option<String>,
    pub max_upload_bytes: usize,
    pub inference_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let max_upload_mb = match get("MAX_UPLOAD_MB") {
            Some(v) => v
                .trim()
                .parse::<usize>()
                .with_context(|| format!("MAX_UPLOAD_MB is not a number: {}", v))?,
            None => DEFAULT_MAX_UPLOAD_MB,
        };

        let timeout_secs = match get("INFERENCE_TIMEOUT_SECS") {
            Some(v) => v
                .trim()
                .parse::<u64>()
                .with_context(|| format!("INFERENCE_TIMEOUT_SECS is not a number: {}", v))?,
            None => DEFAULT_INFERENCE_TIMEOUT_SECS,
        };

        let config = Self {
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            upload_dir: PathBuf::from(
                get("UPLOAD_DIR").unwrap_or_else(|| DEFAULT_UPLOAD_DIR.to_string()),
            ),
            vision_model: get("VISION_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            admin_token: get("ADMIN_TOKEN"),
            max_upload_bytes: max_upload_mb * 1024 * 1024,
            inference_timeout: Duration::from_secs(timeout_secs),
        };

        info!(
            "Config: bind={} uploads={:?} model={} admin_gate={}",
            config.bind_addr,
            config.upload_dir,
            config.vision_model,
            config.admin_token.is_some()
        );
        Ok(config)
    }
}
