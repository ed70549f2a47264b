use std::fmt;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".into(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".into(), content: content.into() }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// A chat-completion backend that returns the assistant's reply text.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<String>;
}

/// Perplexity's OpenAI-compatible chat completion endpoint.
pub struct PerplexityClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl fmt::Debug for PerplexityClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PerplexityClient")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl PerplexityClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ChatClient for PerplexityClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String> {
        let res = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?
            .error_for_status()?;

        let json: serde_json::Value = res.json().await?;
        extract_reply(&json)
    }
}

fn extract_reply(json: &serde_json::Value) -> Result<String> {
    json["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| AppError::LlmError("Invalid response format from LLM".to_string()))
}
