//! OpenRouter API client for multimodal resume parsing.

use std::time::Duration;

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::vision::VisionModel;

const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// OpenRouter client for chat completions.
#[derive(Clone)]
pub struct OpenRouterClient {
    client: Client,
    api_key: String,
    model: String,
}

impl OpenRouterClient {
    /// Create a new client, reading the API key from OPENROUTER_API_KEY.
    ///
    /// `timeout` bounds each request end to end.
    pub fn from_env(model: impl Into<String>, timeout: Duration) -> Result<Self> {
        let api_key = std::env::var("OPENROUTER_API_KEY")
            .context("OPENROUTER_API_KEY environment variable not set")?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_key,
            model: model.into(),
        })
    }

    /// Send a chat completion request, returning the first choice's text.
    pub async fn chat(&self, messages: Vec<Message>) -> Result<String> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            max_tokens: Some(4096),
        };

        debug!("Sending request to OpenRouter: model={}", request.model);

        let response = self
            .client
            .post(OPENROUTER_API_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to OpenRouter")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("OpenRouter API error ({}): {}", status, error_text);
        }

        let response: ChatCompletionResponse = response
            .json()
            .await
            .context("Failed to parse OpenRouter response")?;

        if let Some(usage) = &response.usage {
            info!(
                "OpenRouter response: {} tokens (prompt: {}, completion: {})",
                usage.total_tokens, usage.prompt_tokens, usage.completion_tokens
            );
        }

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .context("OpenRouter response contained no message content")
    }
}

#[async_trait::async_trait]
impl VisionModel for OpenRouterClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str, image_png: &[u8]) -> Result<String> {
        self.chat(vec![Message::user_with_png(prompt, image_png)])
            .await
    }
}

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

// ============================================================================
// Message types
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: Vec<ContentPart>,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

impl Message {
    /// Create a user message with text followed by one PNG image as a data URL.
    pub fn user_with_png(text: impl Into<String>, png: &[u8]) -> Self {
        let data_url = format!("data:image/png;base64,{}", BASE64.encode(png));
        Self {
            role: Role::User,
            content: vec![
                ContentPart::Text { text: text.into() },
                ContentPart::ImageUrl {
                    image_url: ImageUrl { url: data_url },
                },
            ],
        }
    }
}
