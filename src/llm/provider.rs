//! The Provider Abstraction.
//!
//! This trait defines the interface the relay uses to reach a chat-completion
//! backend, so the relay can be exercised against fakes.

use async_trait::async_trait;
use thiserror::Error;

use super::types::{CompletionResponse, Message};

/// Failure talking to the upstream service
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// Upstream answered with a non-2xx status
    #[error("upstream returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The request never got an HTTP response
    #[error("upstream unreachable: {0}")]
    Unreachable(String),

    /// 2xx response whose body could not be decoded
    #[error("invalid upstream response: {0}")]
    Decode(String),
}

/// The core trait for LLM interactions.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Send one non-streaming chat completion request.
    ///
    /// The credential is passed per call because it is looked up at request
    /// time, never cached by the provider.
    async fn completion(
        &self,
        api_key: &str,
        model: &str,
        messages: &[Message],
    ) -> Result<CompletionResponse, ProviderError>;
}
