//! Prompt composer and relay
//!
//! Validates a generation request, looks up the upstream credential, composes
//! the prompt and issues exactly one upstream completion call. Retries are the
//! caller's business.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::config::{Config, DEFAULT_API_KEY_ENV};
use crate::llm::{LLMProvider, OpenRouterProvider, ProviderError};
use crate::prompt::ComposedPrompt;
use crate::types::{ErrorKind, GenerationRequest};

/// Where the upstream API key comes from
#[derive(Debug, Clone)]
pub enum CredentialSource {
    /// Read the named environment variable on every request
    Env(String),
    /// A fixed value; `None` behaves like an unset variable
    Fixed(Option<String>),
}

impl CredentialSource {
    /// Current credential, `None` if unset or blank
    pub fn resolve(&self) -> Option<String> {
        let value = match self {
            Self::Env(name) => std::env::var(name).ok(),
            Self::Fixed(value) => value.clone(),
        };
        value.filter(|v| !v.trim().is_empty())
    }

    fn describe(&self) -> &str {
        match self {
            Self::Env(name) => name.as_str(),
            Self::Fixed(_) => "configured credential",
        }
    }
}

impl Default for CredentialSource {
    fn default() -> Self {
        Self::Env(DEFAULT_API_KEY_ENV.to_string())
    }
}

/// Relay failure. `Display` is the message returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("Missing required parameters")]
    MissingParameters { missing: Vec<&'static str> },

    #[error("Invalid request body")]
    InvalidBody(String),

    #[error("Missing OpenRouter API Key")]
    MissingCredential { source_name: String },

    #[error("{message}")]
    Upstream { status: u16, message: String },

    #[error("Failed to connect to OpenRouter API")]
    Unreachable(String),

    #[error("Invalid response from OpenRouter API")]
    InvalidResponse(String),
}

impl RelayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingParameters { .. } => ErrorKind::MissingParameters,
            Self::InvalidBody(_) => ErrorKind::InvalidBody,
            Self::MissingCredential { .. } => ErrorKind::MissingCredential,
            Self::Upstream { status: 429, .. } => ErrorKind::UpstreamRateLimited,
            Self::Upstream { .. } => ErrorKind::UpstreamError,
            Self::Unreachable(_) => ErrorKind::UpstreamUnreachable,
            Self::InvalidResponse(_) => ErrorKind::InvalidResponse,
        }
    }

    /// HTTP status for the relay response; upstream statuses pass through
    pub fn status_code(&self) -> u16 {
        match self {
            Self::MissingParameters { .. } | Self::InvalidBody(_) => 400,
            Self::MissingCredential { .. } => 500,
            Self::Upstream { status, .. } => *status,
            Self::Unreachable(_) | Self::InvalidResponse(_) => 502,
        }
    }
}

impl From<ProviderError> for RelayError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Status { status, message } => Self::Upstream { status, message },
            ProviderError::Unreachable(detail) => Self::Unreachable(detail),
            ProviderError::Decode(detail) => Self::InvalidResponse(detail),
        }
    }
}

/// Composes prompts and forwards them upstream
#[derive(Clone)]
pub struct Relay {
    provider: Arc<dyn LLMProvider>,
    credential: CredentialSource,
}

impl Relay {
    pub fn new(provider: Arc<dyn LLMProvider>, credential: CredentialSource) -> Self {
        Self {
            provider,
            credential,
        }
    }

    /// OpenRouter relay reading its key from the configured variable
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(OpenRouterProvider::from_config(&config.upstream)),
            CredentialSource::Env(config.upstream.api_key_env.clone()),
        )
    }

    /// Generate text for a request.
    ///
    /// Validation and the credential check both happen before any network
    /// traffic. An upstream answer without content yields an empty string.
    #[instrument(skip_all, fields(model = %request.model))]
    pub async fn generate(&self, request: &GenerationRequest) -> Result<String, RelayError> {
        let missing = request.missing_fields();
        if !missing.is_empty() {
            debug!(?missing, "Rejecting incomplete request");
            return Err(RelayError::MissingParameters { missing });
        }

        let Some(api_key) = self.credential.resolve() else {
            warn!(source = self.credential.describe(), "Upstream API key is not configured");
            return Err(RelayError::MissingCredential {
                source_name: self.credential.describe().to_string(),
            });
        };

        let prompt = ComposedPrompt::compose(request);
        let messages = prompt.messages();

        let completion = self
            .provider
            .completion(&api_key, &request.model, &messages)
            .await
            .map_err(|err| {
                warn!(error = %err, "Upstream completion failed");
                RelayError::from(err)
            })?;

        match &completion.usage {
            Some(usage) => info!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                chars = completion.content.len(),
                "Completion received"
            ),
            None => info!(chars = completion.content.len(), "Completion received"),
        }

        Ok(completion.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{CompletionResponse, Message, Role};
    use crate::types::{Language, Tone};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records calls and replays a fixed answer
    struct FakeProvider {
        answer: Result<CompletionResponse, ProviderError>,
        calls: Mutex<Vec<(String, String, Vec<Message>)>>,
    }

    impl FakeProvider {
        fn answering(answer: Result<CompletionResponse, ProviderError>) -> Arc<Self> {
            Arc::new(Self {
                answer,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn text(content: &str) -> Arc<Self> {
            Self::answering(Ok(CompletionResponse {
                content: content.to_string(),
                usage: None,
            }))
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl LLMProvider for FakeProvider {
        async fn completion(
            &self,
            api_key: &str,
            model: &str,
            messages: &[Message],
        ) -> Result<CompletionResponse, ProviderError> {
            self.calls.lock().unwrap().push((
                api_key.to_string(),
                model.to_string(),
                messages.to_vec(),
            ));
            self.answer.clone()
        }
    }

    fn relay_with(provider: Arc<FakeProvider>) -> Relay {
        Relay::new(provider, CredentialSource::Fixed(Some("sk-test".to_string())))
    }

    #[tokio::test]
    async fn test_scenario_hello() {
        let provider = FakeProvider::text("hello");
        let relay = relay_with(provider.clone());
        let request = GenerationRequest::new("m", "k", "d")
            .with_language(Language::parse_or_default("中文"))
            .with_tone(Tone::parse_or_default("专业"));

        assert_eq!(relay.generate(&request).await.unwrap(), "hello");

        let calls = provider.calls.lock().unwrap();
        let (key, model, messages) = &calls[0];
        assert_eq!(key, "sk-test");
        assert_eq!(model, "m");
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[0].content.contains("Chinese with a professional tone"));
        assert_eq!(messages[1].content, "d");
    }

    #[tokio::test]
    async fn test_missing_fields_never_call_upstream() {
        let provider = FakeProvider::text("unused");
        let relay = relay_with(provider.clone());

        for request in [
            GenerationRequest::new("", "k", "d"),
            GenerationRequest::new("m", "", "d"),
            GenerationRequest::new("m", "k", ""),
        ] {
            let err = relay.generate(&request).await.unwrap_err();
            assert_eq!(err.status_code(), 400);
            assert_eq!(err.to_string(), "Missing required parameters");
            assert_eq!(err.kind(), ErrorKind::MissingParameters);
        }
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_credential_is_checked_first() {
        let provider = FakeProvider::text("unused");
        let relay = Relay::new(provider.clone(), CredentialSource::Fixed(None));

        let err = relay
            .generate(&GenerationRequest::new("m", "k", "d"))
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), 500);
        assert_eq!(err.kind(), ErrorKind::MissingCredential);
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_blank_credential_counts_as_missing() {
        let relay = Relay::new(
            FakeProvider::text("unused"),
            CredentialSource::Fixed(Some("  ".to_string())),
        );
        let err = relay
            .generate(&GenerationRequest::new("m", "k", "d"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingCredential);
    }

    #[tokio::test]
    async fn test_upstream_status_passes_through() {
        let provider = FakeProvider::answering(Err(ProviderError::Status {
            status: 429,
            message: "Rate limit exceeded".to_string(),
        }));
        let relay = relay_with(provider.clone());

        let err = relay
            .generate(&GenerationRequest::new("m", "k", "d"))
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), 429);
        assert_eq!(err.kind(), ErrorKind::UpstreamRateLimited);
        assert_eq!(err.to_string(), "Rate limit exceeded");
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_is_distinct() {
        let relay = relay_with(FakeProvider::answering(Err(ProviderError::Unreachable(
            "connection refused".to_string(),
        ))));

        let err = relay
            .generate(&GenerationRequest::new("m", "k", "d"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UpstreamUnreachable);
        assert_eq!(err.status_code(), 502);
        assert_eq!(err.to_string(), "Failed to connect to OpenRouter API");
    }

    #[tokio::test]
    async fn test_empty_content_is_success() {
        let relay = relay_with(FakeProvider::text(""));
        let text = relay
            .generate(&GenerationRequest::new("m", "k", "d"))
            .await
            .unwrap();
        assert_eq!(text, "");
    }

    #[test]
    fn test_env_credential_source() {
        let name = "SCRIBE_TEST_CREDENTIAL_SOURCE";
        std::env::remove_var(name);
        assert_eq!(CredentialSource::Env(name.to_string()).resolve(), None);

        std::env::set_var(name, "sk-env");
        assert_eq!(
            CredentialSource::Env(name.to_string()).resolve().as_deref(),
            Some("sk-env")
        );
        std::env::remove_var(name);
    }
}
