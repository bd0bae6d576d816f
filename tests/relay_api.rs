//! HTTP contract of the relay endpoint against a fake upstream

mod common;

use axum::http::StatusCode;
use common::{completion, rate_limited, spawn, FakeUpstream};
use serde_json::{json, Value};

async fn post(app: axum::Router, body: Value) -> (StatusCode, Value) {
    let addr = spawn(app).await;
    let response = reqwest::Client::new()
        .post(format!("http://{}/api/generate", addr))
        .json(&body)
        .send()
        .await
        .unwrap();
    let status = StatusCode::from_u16(response.status().as_u16()).unwrap();
    (status, response.json().await.unwrap())
}

#[tokio::test]
async fn test_generate_returns_first_choice() {
    let upstream = FakeUpstream::start(vec![completion("hello")]).await;

    let (status, body) = post(
        upstream.relay_app(Some("sk-test")),
        json!({
            "model": "m",
            "keywords": "k",
            "description": "d",
            "language": "中文",
            "tone": "专业"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "result": "hello" }));
    assert_eq!(upstream.calls(), 1);
}

#[tokio::test]
async fn test_upstream_request_shape() {
    let upstream = FakeUpstream::start(vec![completion("x")]).await;

    post(
        upstream.relay_app(Some("sk-test")),
        json!({
            "model": "google/gemini-2.5-flash:free",
            "keywords": "rust, async",
            "description": "Explain executors",
            "language": "en",
            "tone": "friendly",
            "role": "You are a systems programmer."
        }),
    )
    .await;

    let captured = upstream.captured();
    let request = &captured[0];
    assert_eq!(request.headers["authorization"], "Bearer sk-test");
    assert_eq!(request.headers["http-referer"], "https://scribe.test");
    assert_eq!(request.headers["x-title"], "Scribe Tests");
    assert_eq!(request.body["model"], "google/gemini-2.5-flash:free");
    assert_eq!(request.body["stream"], false);
    assert_eq!(request.body["max_tokens"], 1000);
    assert_eq!(request.body["messages"][0]["role"], "system");
    assert_eq!(
        request.body["messages"][0]["content"],
        "You are a professional writing assistant. You are a systems programmer. \
         Please write in English with a friendly tone, about the following keywords: \
         rust, async. Ensure the content is logically clear, well-structured, and has depth."
    );
    assert_eq!(request.body["messages"][1]["role"], "user");
    assert_eq!(request.body["messages"][1]["content"], "Explain executors");
}

#[tokio::test]
async fn test_non_string_options_fall_back_to_defaults() {
    let upstream = FakeUpstream::start(vec![completion("ok")]).await;

    let (status, body) = post(
        upstream.relay_app(Some("sk-test")),
        json!({
            "model": "m",
            "keywords": "k",
            "description": "d",
            "language": 1,
            "tone": true,
            "role": 42
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "result": "ok" }));
    let captured = upstream.captured();
    assert_eq!(
        captured[0].body["messages"][0]["content"],
        "You are a professional writing assistant. Please write in Chinese with a \
         professional tone, about the following keywords: k. Ensure the content is \
         logically clear, well-structured, and has depth."
    );
}

#[tokio::test]
async fn test_whitespace_fields_reach_upstream() {
    let upstream = FakeUpstream::start(vec![completion("ok")]).await;

    let (status, _) = post(
        upstream.relay_app(Some("sk-test")),
        json!({ "model": "m", "keywords": "  ", "description": " " }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(upstream.calls(), 1);
    assert_eq!(upstream.captured()[0].body["messages"][1]["content"], " ");
}

#[tokio::test]
async fn test_missing_description_is_400_without_upstream_call() {
    let upstream = FakeUpstream::start(vec![completion("unused")]).await;

    let (status, body) = post(
        upstream.relay_app(Some("sk-test")),
        json!({ "model": "m", "keywords": "k" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required parameters");
    assert_eq!(upstream.calls(), 0);
}

#[tokio::test]
async fn test_missing_credential_is_500_without_upstream_call() {
    let upstream = FakeUpstream::start(vec![completion("unused")]).await;

    let (status, body) = post(
        upstream.relay_app(None),
        json!({ "model": "m", "keywords": "k", "description": "d" }),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["kind"], "missing_credential");
    assert_eq!(upstream.calls(), 0);
}

#[tokio::test]
async fn test_upstream_error_status_and_message_pass_through() {
    let upstream = FakeUpstream::start(vec![rate_limited()]).await;

    let (status, body) = post(
        upstream.relay_app(Some("sk-test")),
        json!({ "model": "m", "keywords": "k", "description": "d" }),
    )
    .await;

    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "Rate limit exceeded: free-models-per-min");
    assert_eq!(body["kind"], "upstream_rate_limited");
}

#[tokio::test]
async fn test_plain_text_upstream_error_is_used_verbatim() {
    let upstream = FakeUpstream::start(vec![(
        StatusCode::SERVICE_UNAVAILABLE,
        "upstream overloaded".to_string(),
    )])
    .await;

    let (status, body) = post(
        upstream.relay_app(Some("sk-test")),
        json!({ "model": "m", "keywords": "k", "description": "d" }),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "upstream overloaded");
    assert_eq!(body["kind"], "upstream_error");
}

#[tokio::test]
async fn test_empty_choices_yield_empty_result() {
    let upstream =
        FakeUpstream::start(vec![(StatusCode::OK, json!({ "choices": [] }).to_string())]).await;

    let (status, body) = post(
        upstream.relay_app(Some("sk-test")),
        json!({ "model": "m", "keywords": "k", "description": "d" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "result": "" }));
}

#[tokio::test]
async fn test_malformed_body_is_rejected() {
    let upstream = FakeUpstream::start(vec![]).await;
    let addr = spawn(upstream.relay_app(Some("sk-test"))).await;

    let response = reqwest::Client::new()
        .post(format!("http://{}/api/generate", addr))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["kind"], "invalid_body");
    assert_eq!(upstream.calls(), 0);
}

#[tokio::test]
async fn test_unreachable_upstream() {
    // Nothing listens on this port once the listener is dropped
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let dead = listener.local_addr().unwrap();
    drop(listener);

    let provider = scribe::llm::OpenRouterProvider::new(
        format!("http://{}/api/v1/chat/completions", dead),
        "https://scribe.test",
        "Scribe Tests",
        1000,
    );
    let relay = scribe::Relay::new(
        std::sync::Arc::new(provider),
        scribe::CredentialSource::Fixed(Some("sk-test".to_string())),
    );
    let app = scribe::router(std::sync::Arc::new(scribe::AppState::new(relay)));

    let (status, body) = post(app, json!({ "model": "m", "keywords": "k", "description": "d" })).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["kind"], "upstream_unreachable");
    assert_eq!(body["error"], "Failed to connect to OpenRouter API");
}

#[tokio::test]
async fn test_health_and_models() {
    let upstream = FakeUpstream::start(vec![]).await;
    let addr = spawn(upstream.relay_app(Some("sk-test"))).await;
    let client = reqwest::Client::new();

    let health = client
        .get(format!("http://{}/health", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(health.text().await.unwrap(), "OK");

    let models: Value = client
        .get(format!("http://{}/api/models", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(models["models"][0]["id"], scribe::DEFAULT_MODEL);
}
