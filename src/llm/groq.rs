//! Groq chat-completions client.
//!
//! Speaks the OpenAI-compatible `chat/completions` endpoint. HTTP 429
//! maps to [`LlmError::RateLimited`] (honoring `retry-after` when the
//! server sends one) so the retry controller can back off; every other
//! failure propagates as-is.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::Completion;
use crate::error::LlmError;

const GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Default classification model.
const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

/// Kept tight — the classifier runs on every message and only needs a
/// small JSON object back.
const MAX_TOKENS: u32 = 128;

/// Deterministic-ish classification.
const TEMPERATURE: f32 = 0.0;

pub struct GroqClient {
    http: reqwest::Client,
    api_key: SecretString,
    model: String,
    endpoint: String,
}

impl GroqClient {
    pub fn new(api_key: SecretString) -> Self {
        Self::with_endpoint(api_key, GROQ_API_URL)
    }

    /// Point the client at a different endpoint (tests).
    pub fn with_endpoint(api_key: SecretString, endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            model: DEFAULT_MODEL.to_string(),
            endpoint: endpoint.into(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

#[async_trait]
impl Completion for GroqClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, system_prompt: &str, user_text: &str) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage { role: "system", content: system_prompt },
                ChatMessage { role: "user", content: user_text },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed { reason: e.to_string() })?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(LlmError::RateLimited { retry_after });
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::RequestFailed {
                reason: format!("status {status}: {body}"),
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse { reason: e.to_string() })?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| LlmError::InvalidResponse {
                reason: "no choices in completion response".into(),
            })
    }
}
