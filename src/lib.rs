//! Scribe - writing assistant relay
//!
//! A relay composes a writing prompt from structured form options and forwards
//! it to an LLM chat-completion API. An orchestrator drives the relay from the
//! client side with a bounded retry protocol.

pub mod config;
pub mod llm;
pub mod logging;
pub mod orchestrator;
pub mod prompt;
pub mod relay;
pub mod server;
pub mod session;
pub mod types;

pub use config::Config;
pub use orchestrator::{
    CallError, GenerationError, HttpRelayClient, NoticeLevel, NoticeLog, NotificationSink,
    Orchestrator, Outcome, Phase, RelayClient, RetryPolicy, TracingSink,
};
pub use prompt::ComposedPrompt;
pub use relay::{CredentialSource, Relay, RelayError};
pub use server::{router, run_server, AppState};
pub use session::{IdentityProvider, SessionHandle, User};
pub use types::{
    ErrorBody, ErrorKind, GenerateResponse, GenerationRequest, Language, Tone, DEFAULT_MODEL,
    KNOWN_MODELS,
};
