//! OpenRouter API Provider.
//!
//! Implements the `LLMProvider` trait for OpenRouter's OpenAI-compatible
//! Chat Completions API.

use super::provider::{LLMProvider, ProviderError};
use super::types::{CompletionResponse, Message, Role, Usage};
use crate::config::UpstreamConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Output length cap sent with every request
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

const FALLBACK_ERROR_MESSAGE: &str = "API call failed";

/// OpenRouter provider configuration and state.
pub struct OpenRouterProvider {
    client: Client,
    url: String,
    referer: String,
    title: String,
    max_tokens: u32,
}

impl OpenRouterProvider {
    pub fn new(
        url: impl Into<String>,
        referer: impl Into<String>,
        title: impl Into<String>,
        max_tokens: u32,
    ) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
            referer: referer.into(),
            title: title.into(),
            max_tokens,
        }
    }

    pub fn from_config(config: &UpstreamConfig) -> Self {
        Self::new(
            config.url.clone(),
            config.referer.clone(),
            config.title.clone(),
            config.max_tokens,
        )
    }
}

impl Default for OpenRouterProvider {
    fn default() -> Self {
        Self::from_config(&UpstreamConfig::default())
    }
}

#[async_trait]
impl LLMProvider for OpenRouterProvider {
    async fn completion(
        &self,
        api_key: &str,
        model: &str,
        messages: &[Message],
    ) -> Result<CompletionResponse, ProviderError> {
        let request = ChatRequest {
            model,
            messages: messages.iter().map(ApiMessage::from).collect(),
            stream: false,
            max_tokens: self.max_tokens,
        };

        debug!(url = %self.url, model, "Sending chat completion request");

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(api_key)
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.title)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %error_text, "OpenRouter API error");
            return Err(ProviderError::Status {
                status: status.as_u16(),
                message: extract_error_message(&error_text),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Unreachable(e.to_string()))?;
        let chat_response: ChatResponse =
            serde_json::from_str(&body).map_err(|e| ProviderError::Decode(e.to_string()))?;

        Ok(chat_response.into())
    }
}

/// Best-effort message from an upstream error body.
///
/// Structured bodies yield `error.message`, else `error` itself. Bodies that
/// are not JSON are returned verbatim unless empty.
pub fn extract_error_message(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => match value.get("error") {
            Some(serde_json::Value::Object(error)) => match error.get("message") {
                Some(serde_json::Value::String(message)) if !message.is_empty() => message.clone(),
                _ => serde_json::Value::Object(error.clone()).to_string(),
            },
            Some(serde_json::Value::String(message)) if !message.is_empty() => message.clone(),
            _ => FALLBACK_ERROR_MESSAGE.to_string(),
        },
        Err(_) if body.trim().is_empty() => FALLBACK_ERROR_MESSAGE.to_string(),
        Err(_) => body.to_string(),
    }
}

// -----------------------------------------------------------------------------
// OpenRouter DTOs (Data Transfer Objects)
// -----------------------------------------------------------------------------

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ApiMessage<'a>>,
    stream: bool,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ApiMessage<'a> {
    role: Role,
    content: &'a str,
}

impl<'a> From<&'a Message> for ApiMessage<'a> {
    fn from(msg: &'a Message) -> Self {
        Self {
            role: msg.role,
            content: &msg.content,
        }
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ApiResponseMessage>,
}

#[derive(Deserialize)]
struct ApiResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiUsage {
    #[serde(default)]
    prompt_tokens: usize,
    #[serde(default)]
    completion_tokens: usize,
    #[serde(default)]
    total_tokens: usize,
}

impl From<ApiUsage> for Usage {
    fn from(u: ApiUsage) -> Self {
        Self {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        }
    }
}

impl From<ChatResponse> for CompletionResponse {
    fn from(response: ChatResponse) -> Self {
        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .unwrap_or_default();

        Self {
            content,
            usage: response.usage.map(Usage::from),
        }
    }
}
