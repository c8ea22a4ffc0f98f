//! Anthropic Messages API client (https://api.anthropic.com by default).
//! Non-streaming only: one user message in, first text block out.

use crate::llm::CompletionBackend;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Client for the Anthropic Messages API.
#[derive(Clone)]
pub struct ClaudeClient {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

#[derive(Debug, thiserror::Error)]
pub enum ClaudeError {
    #[error("claude request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("claude api error: {0}")]
    Api(String),
    #[error("claude response contained no text content")]
    Empty,
}

impl ClaudeClient {
    pub fn new(api_key: Option<String>, base_url: Option<String>) -> Self {
        let base_url = base_url
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self {
            base_url,
            api_key,
            client: reqwest::Client::new(),
        }
    }

    /// POST /v1/messages — single-turn completion; returns the first text block.
    pub async fn messages(
        &self,
        model: &str,
        max_tokens: u32,
        prompt: &str,
    ) -> Result<String, ClaudeError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ClaudeError::Api("anthropic api key not configured".to_string()))?;
        let url = format!("{}/v1/messages", self.base_url);
        let body = MessagesRequest {
            model: model.to_string(),
            max_tokens,
            messages: vec![MessageParam {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };
        let res = self
            .client
            .post(&url)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(ClaudeError::Api(format!("{} {}", status, body)));
        }
        let data: MessagesResponse = res.json().await?;
        let text = data
            .content
            .iter()
            .find_map(|block| match block {
                ContentBlock::Text { text } if !text.is_empty() => Some(text.clone()),
                _ => None,
            })
            .ok_or(ClaudeError::Empty)?;
        Ok(text)
    }
}

#[async_trait]
impl CompletionBackend for ClaudeClient {
    async fn complete(
        &self,
        model: &str,
        max_tokens: u32,
        prompt: &str,
    ) -> Result<String, ClaudeError> {
        self.messages(model, max_tokens, prompt).await
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<MessageParam>,
}

#[derive(Debug, Serialize)]
struct MessageParam {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}
