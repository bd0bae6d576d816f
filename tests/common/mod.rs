//! Fake upstream chat-completion server for integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{extract::State, http::HeaderMap, http::StatusCode, routing::post, Json, Router};
use scribe::llm::OpenRouterProvider;
use scribe::{AppState, CredentialSource, Relay};
use serde_json::{json, Value};

/// One captured upstream request
#[derive(Debug, Clone)]
pub struct Captured {
    pub headers: HeaderMap,
    pub body: Value,
}

#[derive(Default)]
struct Upstream {
    replies: Mutex<VecDeque<(StatusCode, String)>>,
    captured: Mutex<Vec<Captured>>,
}

/// Handle to a running fake upstream
#[derive(Clone)]
pub struct FakeUpstream {
    pub addr: SocketAddr,
    state: Arc<Upstream>,
}

impl FakeUpstream {
    /// Start serving; replies are consumed in order, then 500s
    pub async fn start(replies: Vec<(StatusCode, String)>) -> Self {
        let state = Arc::new(Upstream {
            replies: Mutex::new(replies.into()),
            captured: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/api/v1/chat/completions", post(completions))
            .with_state(state.clone());
        let addr = spawn(app).await;

        Self { addr, state }
    }

    pub fn url(&self) -> String {
        format!("http://{}/api/v1/chat/completions", self.addr)
    }

    pub fn calls(&self) -> usize {
        self.state.captured.lock().unwrap().len()
    }

    pub fn captured(&self) -> Vec<Captured> {
        self.state.captured.lock().unwrap().clone()
    }

    /// Relay router pointed at this upstream
    pub fn relay_app(&self, api_key: Option<&str>) -> Router {
        let provider = OpenRouterProvider::new(
            self.url(),
            "https://scribe.test",
            "Scribe Tests",
            1000,
        );
        let relay = Relay::new(
            Arc::new(provider),
            CredentialSource::Fixed(api_key.map(str::to_string)),
        );
        scribe::router(Arc::new(AppState::new(relay)))
    }
}

async fn completions(
    State(state): State<Arc<Upstream>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, String) {
    state
        .captured
        .lock()
        .unwrap()
        .push(Captured { headers, body });
    state
        .replies
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or((StatusCode::INTERNAL_SERVER_ERROR, "script exhausted".to_string()))
}

/// Serve a router on an ephemeral local port
pub async fn spawn(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

pub fn completion(content: &str) -> (StatusCode, String) {
    (
        StatusCode::OK,
        json!({ "choices": [{ "message": { "content": content } }] }).to_string(),
    )
}

pub fn rate_limited() -> (StatusCode, String) {
    (
        StatusCode::TOO_MANY_REQUESTS,
        json!({ "error": { "message": "Rate limit exceeded: free-models-per-min", "code": 429 } })
            .to_string(),
    )
}
