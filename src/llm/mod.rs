//! Client for the LLM completion collaborator.
//!
//! A single "create message" endpoint: system prompt, one user message
//! (text or text plus an inline image), text completion back. Requests are
//! retried with doubling backoff on rate-limit and server errors; anything
//! else surfaces as an error for the caller's batch-local handling.

pub mod parse;

use std::time::Duration;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::Config;

/// Attempts per request, including the first.
const MAX_ATTEMPTS: u32 = 3;

/// Initial backoff; doubles per retry.
const BACKOFF_BASE_MS: u64 = 500;

const API_VERSION: &str = "2023-06-01";

/// One part of a user message.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentPart {
    Text { text: String },
    Image { source: ImageSource },
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageSource {
    #[serde(rename = "type")]
    pub kind: String,
    pub media_type: String,
    pub data: String,
}

impl ContentPart {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Inline image part from raw bytes.
    #[must_use]
    pub fn image(media_type: &str, bytes: &[u8]) -> Self {
        Self::Image {
            source: ImageSource {
                kind: "base64".to_string(),
                media_type: media_type.to_string(),
                data: BASE64.encode(bytes),
            },
        }
    }
}

/// User message content: plain text or a part list.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a MessageContent,
}

#[derive(Debug, Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    content: Vec<ResponseBlock>,
}

#[derive(Debug, Deserialize)]
struct ResponseBlock {
    #[serde(default)]
    text: Option<String>,
}

/// Completion API client.
#[derive(Debug, Clone)]
pub struct LlmClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl LlmClient {
    /// Build a client from configuration. `None` when no API key is set;
    /// callers report the missing credential instead of failing later.
    #[must_use]
    pub fn from_config(config: &Config) -> Option<Self> {
        let api_key = config.llm_api_key.clone()?;
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout.max(Duration::from_secs(60)))
            .build()
            .expect("Failed to build HTTP client");
        Some(Self {
            client,
            base_url: config.llm_base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.llm_model.clone(),
        })
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Request a completion for one user message.
    ///
    /// # Errors
    ///
    /// Fails after exhausted retries or on any non-retryable error status.
    pub async fn complete(
        &self,
        system: Option<&str>,
        content: &MessageContent,
        max_tokens: u32,
    ) -> Result<String> {
        let body = CompletionBody {
            model: &self.model,
            max_tokens,
            system,
            messages: vec![Message {
                role: "user",
                content,
            }],
        };
        let url = format!("{}/v1/messages", self.base_url);

        let mut backoff = Duration::from_millis(BACKOFF_BASE_MS);
        let mut last_err = None;
        for attempt in 1..=MAX_ATTEMPTS {
            let response = self
                .client
                .post(&url)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", API_VERSION)
                .json(&body)
                .send()
                .await;

            match response {
                Ok(resp) if resp.status().is_success() => {
                    let parsed: CompletionResponse =
                        resp.json().await.context("Failed to decode completion")?;
                    let text: String = parsed
                        .content
                        .into_iter()
                        .filter_map(|b| b.text)
                        .collect::<Vec<_>>()
                        .join("");
                    debug!(chars = text.len(), "completion received");
                    return Ok(text);
                }
                Ok(resp) => {
                    let status = resp.status();
                    let retryable = status.as_u16() == 429 || status.is_server_error();
                    if !retryable {
                        anyhow::bail!("completion request failed with status {status}");
                    }
                    warn!(%status, attempt, "completion request throttled, backing off");
                    last_err = Some(anyhow::anyhow!(
                        "completion request failed with status {status}"
                    ));
                }
                Err(e) => {
                    warn!(error = %e, attempt, "completion request error");
                    last_err = Some(anyhow::Error::new(e).context("completion request failed"));
                }
            }

            if attempt < MAX_ATTEMPTS {
                sleep(backoff).await;
                backoff *= 2;
            }
        }
        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("completion request failed")))
    }

    /// Text-only convenience wrapper.
    pub async fn complete_text(
        &self,
        system: Option<&str>,
        prompt: impl Into<String>,
        max_tokens: u32,
    ) -> Result<String> {
        self.complete(system, &MessageContent::Text(prompt.into()), max_tokens)
            .await
    }
}
