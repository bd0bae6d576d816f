//! LLM layer
//!
//! Everything that talks to the upstream chat-completion service:
//! - Provider abstraction (`LLMProvider`)
//! - Provider-neutral message and response types
//! - The OpenRouter client

pub mod types;
pub mod provider;
pub mod openrouter;

// Re-export key types
pub use types::{CompletionResponse, Message, Role, Usage};
pub use provider::{LLMProvider, ProviderError};
pub use openrouter::OpenRouterProvider;
