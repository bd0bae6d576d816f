//! Client side of the relay endpoint.

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::debug;

use crate::types::{ErrorBody, ErrorKind, GenerateResponse, GenerationRequest};

/// Failure of one relay call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    /// The relay answered with a non-2xx status
    #[error("relay returned {status}: {message}")]
    Http {
        status: u16,
        kind: ErrorKind,
        /// The relay's `error` field, empty if the body had none
        message: String,
    },

    /// No HTTP response at all
    #[error("network error: {0}")]
    Network(String),

    /// 2xx response with an unreadable body
    #[error("invalid relay response: {0}")]
    Decode(String),
}

/// Anything that can perform one relay call
#[async_trait]
pub trait RelayClient: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, CallError>;
}

/// reqwest client for `POST /api/generate`
pub struct HttpRelayClient {
    client: Client,
    url: String,
}

impl HttpRelayClient {
    /// Client for the relay at `endpoint` (base URL, no path)
    pub fn new(endpoint: &str) -> Self {
        Self {
            client: Client::new(),
            url: format!("{}/api/generate", endpoint.trim_end_matches('/')),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RelayClient for HttpRelayClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, CallError> {
        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| CallError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), body = %text, "Relay returned an error");
            let (kind, message) = match serde_json::from_str::<ErrorBody>(&text) {
                Ok(body) => (body.kind, body.error),
                Err(_) => (ErrorKind::Unknown, String::new()),
            };
            return Err(CallError::Http {
                status: status.as_u16(),
                kind,
                message,
            });
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| CallError::Decode(e.to_string()))?;
        Ok(body.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_endpoint() {
        assert_eq!(
            HttpRelayClient::new("http://localhost:3000/").url(),
            "http://localhost:3000/api/generate"
        );
        assert_eq!(
            HttpRelayClient::new("https://relay.example").url(),
            "https://relay.example/api/generate"
        );
    }

    #[tokio::test]
    async fn test_unreachable_relay_is_network_error() {
        // Bind then drop to get a port nobody listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = HttpRelayClient::new(&format!("http://{}", addr));
        let err = client
            .generate(&GenerationRequest::new("m", "k", "d"))
            .await
            .unwrap_err();
        assert!(matches!(err, CallError::Network(_)));
    }
}
