//! Normalization of inference-service responses into canonical records.

use serde_json::Value;
use tracing::debug;

use crate::error::ExtractionError;
use crate::schema::{CanonicalRecord, Field, NOT_SPECIFIED};

const FENCE_OPEN: &str = "```json";
const FENCE_CLOSE: &str = "```";

/// Response key → canonical field.
pub const RESPONSE_KEYS: &[(&str, Field)] = &[
    ("Name", Field::Name),
    ("Email", Field::Email),
    ("Contact", Field::Phone),
    ("College", Field::College),
    ("Degree", Field::Degree),
    ("Department", Field::Department),
    ("Passed Out", Field::Year),
    ("Location", Field::Location),
];

/// Remove a leading ```` ```json ```` and trailing ```` ``` ```` marker, if present.
pub fn strip_fences(response: &str) -> &str {
    let mut text = response.trim();
    if let Some(rest) = text.strip_prefix(FENCE_OPEN) {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix(FENCE_CLOSE) {
        text = rest;
    }
    text
}

/// Decode a service response and map its keys onto the canonical schema.
pub fn normalize(response: &str) -> Result<CanonicalRecord, ExtractionError> {
    let json_str = strip_fences(response);
    let value: Value = serde_json::from_str(json_str)?;

    let obj = value.as_object().ok_or_else(|| {
        ExtractionError::UnexpectedShape(format!(
            "expected object, got: {}",
            json_str.chars().take(200).collect::<String>()
        ))
    })?;

    let mut record = CanonicalRecord::default();
    for (key, field) in RESPONSE_KEYS {
        if let Some(value) = obj.get(*key) {
            record.set(*field, render_value(value));
        }
    }

    let unmapped: Vec<&str> = obj
        .keys()
        .map(String::as_str)
        .filter(|k| !RESPONSE_KEYS.iter().any(|(key, _)| key == k))
        .collect();
    if !unmapped.is_empty() {
        debug!("Ignoring unmapped response keys: {:?}", unmapped);
    }

    Ok(record)
}

/// Render a JSON value as field text. Blank renderings become the sentinel via
/// [`CanonicalRecord::set`].
fn render_value(value: &Value) -> String {
    match value {
        Value::Null => NOT_SPECIFIED.to_string(),
        Value::String(s) => s.trim().to_string(),
        Value::Bool(_) | Value::Number(_) | Value::Object(_) => value.to_string(),
        Value::Array(items) => items
            .iter()
            .map(render_value)
            .filter(|s| !s.is_empty() && s != NOT_SPECIFIED)
            .collect::<Vec<_>>()
            .join(", "),
    }
}
