//! Completion service boundary.
//!
//! The dispatcher only sees the [`CompletionService`] trait: a blocking call
//! that turns a [`CompletionRequest`] into the text of the first choice.
//! [`ChatCompletionClient`] implements it against any OpenAI-compatible
//! `/chat/completions` endpoint.

use crate::config::ApiSettings;
use crate::error::CompletionError;
use anyhow::{Context, Result, bail};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

/// Prompt template used when none is supplied: asks for one
/// `english | chinese | status | indication | combination | brands` row per
/// name, with worked examples. Ends with the line that introduces the names.
pub const DEFAULT_PROMPT: &str = include_str!("default_prompt.txt");

/// One chat message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Request body for one batch, serialized as-is to the service.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// Build the request for one batch: the system message from `api`, and a
    /// user message holding `prompt`, a newline, then the names one per line.
    pub fn for_batch<S: AsRef<str>>(api: &ApiSettings, prompt: &str, names: &[S]) -> Self {
        let batch = names
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join("\n");
        Self {
            model: api.model.clone(),
            messages: vec![
                ChatMessage::system(api.system_prompt.clone()),
                ChatMessage::user(format!("{prompt}\n{batch}")),
            ],
            temperature: api.temperature,
            max_tokens: api.max_tokens,
        }
    }
}

/// A blocking text-completion backend.
///
/// `Ok(None)` means the service answered but the first choice carried no
/// message text.
pub trait CompletionService: Send + Sync {
    fn complete(&self, request: &CompletionRequest) -> Result<Option<String>, CompletionError>;
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Text of the first choice in a chat-completion response body.
///
/// # Errors
///
/// Returns [`CompletionError::Decode`] if `body` is not a chat-completion
/// response.
pub fn parse_response_body(body: &str) -> Result<Option<String>, CompletionError> {
    let parsed: ChatCompletionResponse =
        serde_json::from_str(body).map_err(|e| CompletionError::Decode(e.to_string()))?;
    Ok(parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content))
}

/// Client for an OpenAI-compatible chat-completion endpoint.
pub struct ChatCompletionClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl ChatCompletionClient {
    /// Create a client from the `[api]` settings.
    ///
    /// # Errors
    ///
    /// Returns an error if `api_key` is empty or the HTTP client cannot be
    /// constructed.
    pub fn new(api: &ApiSettings) -> Result<Self> {
        if api.api_key.trim().is_empty() {
            bail!("api.api_key is required to call the completion service");
        }

        let client = Client::builder()
            .timeout(api.timeout())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            endpoint: chat_endpoint(&api.base_url),
            api_key: api.api_key.clone(),
        })
    }

    /// Full URL requests are posted to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// `{base_url}/chat/completions`, tolerating a trailing slash on the base.
#[must_use]
pub fn chat_endpoint(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

impl CompletionService for ChatCompletionClient {
    fn complete(&self, request: &CompletionRequest) -> Result<Option<String>, CompletionError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(CompletionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        parse_response_body(&body)
    }
}
