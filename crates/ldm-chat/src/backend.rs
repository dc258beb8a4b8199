//! Adapter to the external text-generation service.
//!
//! [`ChatBackend`] is the single seam between the conversation logic and
//! the language model. [`OpenAiCompatBackend`] speaks the Chat Completions
//! REST API (Groq, OpenAI, Ollama and friends); [`ScriptedBackend`] replays
//! canned replies for tests and offline runs.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use ldm_core::config::LlmConfig;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::ChatError;

// =============================================================================
// Request types
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptRole {
    System,
    User,
    Assistant,
}

/// One message of the prompt sent to the backend.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PromptMessage {
    pub role: PromptRole,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::Assistant,
            content: content.into(),
        }
    }
}

/// Output constraint requested from the backend.
#[derive(Clone, Debug, PartialEq)]
pub enum ResponseFormat {
    Text,
    JsonObject,
    JsonSchema {
        name: String,
        schema: serde_json::Value,
    },
}

/// A backend-agnostic completion request.
#[derive(Clone, Debug, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<PromptMessage>,
    pub response_format: ResponseFormat,
}

/// Text-generation service used by every pipeline stage.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Run one completion and return the generated text.
    async fn complete(&self, request: CompletionRequest) -> Result<String, ChatError>;

    /// Short name used in logs.
    fn name(&self) -> &str;
}

// =============================================================================
// OpenAI-compatible HTTP backend
// =============================================================================

/// Backend that talks to an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Clone)]
pub struct OpenAiCompatBackend {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl OpenAiCompatBackend {
    /// Build a backend from the `[llm]` configuration section.
    pub fn from_config(config: &LlmConfig) -> Result<Self, ChatError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ChatError::Config(format!("failed to build HTTP client: {}", e)))?;

        if config.api_key.is_none() {
            tracing::warn!(
                base_url = %config.base_url,
                "No LLM API key configured; requests are sent without credentials"
            );
        }

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send_request(&self, body: &ChatCompletionRequest<'_>) -> Result<String, ChatError> {
        let mut request = self.client.post(&self.endpoint).json(body);
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ChatError::Llm(format!("request to {} failed: {}", self.endpoint, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error body".to_string());
            return Err(map_http_error(status, body_text));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ChatError::Llm(format!("failed to parse completion response: {}", e)))?;

        extract_text_response(parsed)
    }
}

#[async_trait]
impl ChatBackend for OpenAiCompatBackend {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ChatError> {
        let response_format = match request.response_format {
            ResponseFormat::Text => None,
            ResponseFormat::JsonObject => Some(serde_json::json!({ "type": "json_object" })),
            ResponseFormat::JsonSchema { name, schema } => Some(serde_json::json!({
                "type": "json_schema",
                "json_schema": { "name": name, "schema": schema }
            })),
        };

        let body = ChatCompletionRequest {
            model: &self.model,
            messages: &request.messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            response_format,
        };

        let started = std::time::Instant::now();
        let result = self.send_request(&body).await;
        tracing::debug!(
            model = %self.model,
            messages = request.messages.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            ok = result.is_ok(),
            "Completion finished"
        );
        result
    }

    fn name(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [PromptMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

fn extract_text_response(response: ChatCompletionResponse) -> Result<String, ChatError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| ChatError::Llm("completion response contained no content".to_string()))
}

fn map_http_error(status: StatusCode, body: String) -> ChatError {
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|wrapper| wrapper.error.message)
        .unwrap_or(body);

    ChatError::UpstreamStatus {
        status: status.as_u16(),
        body: message,
    }
}

// =============================================================================
// Scripted backend
// =============================================================================

/// Backend that replays queued replies in order and records every request.
///
/// Running out of replies is reported as an LLM error.
#[derive(Default)]
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply.
    pub fn push_reply(&self, reply: impl Into<String>) -> &Self {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(Ok(reply.into()));
        }
        self
    }

    /// Queue a transport failure.
    pub fn push_failure(&self, message: impl Into<String>) -> &Self {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(Err(message.into()));
        }
        self
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Number of queued replies not yet consumed.
    pub fn remaining(&self) -> usize {
        self.replies.lock().map(|r| r.len()).unwrap_or(0)
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ChatError> {
        self.requests
            .lock()
            .map_err(|e| ChatError::StorageError(format!("request log lock poisoned: {}", e)))?
            .push(request);

        let next = self
            .replies
            .lock()
            .map_err(|e| ChatError::StorageError(format!("reply queue lock poisoned: {}", e)))?
            .pop_front();

        match next {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(ChatError::Llm(message)),
            None => Err(ChatError::Llm("scripted backend has no replies left".to_string())),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

// =============================================================================
// Tests
// =============================================================================
