mod common;

use std::sync::{Arc, Mutex};

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};

use common::{serve, TestServer};

const GOOD_KEY: &str = "gsk-good";

/// Last request body the stub provider received.
type Captured = Arc<Mutex<Option<Value>>>;

/// An OpenAI-compatible provider that accepts only [`GOOD_KEY`].
async fn stub_provider() -> (String, Captured) {
    let captured: Captured = Arc::default();

    async fn completions(
        State(captured): State<Captured>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        *captured.lock().unwrap() = Some(body);

        let expected = format!("Bearer {}", GOOD_KEY);
        let authorized = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            == Some(expected.as_str());
        if !authorized {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": { "message": "Invalid API Key" } })),
            );
        }

        (
            StatusCode::OK,
            Json(json!({
                "choices": [{ "message": { "role": "assistant", "content": "Stok kopi tinggal 3." } }]
            })),
        )
    }

    let app = Router::new()
        .route("/chat/completions", post(completions))
        .with_state(captured.clone());

    (serve(app).await, captured)
}

#[tokio::test]
async fn test_chat_relays_reply_with_context() {
    let (provider_url, captured) = stub_provider().await;
    let server = TestServer::start_with(&[("AI_BASE_URL_GROQ", provider_url.as_str())]).await;

    let (status, body) = server
        .post(
            "/api/ai/chat",
            json!({
                "messages": [{ "role": "user", "content": "Berapa stok kopi?" }],
                "config": { "provider": "groq", "apiKey": GOOD_KEY },
                "context": "Kopi: stok 3"
            }),
        )
        .await;
    assert_eq!(status, 200, "{body}");
    assert_eq!(body["data"]["content"], "Stok kopi tinggal 3.");

    let sent = captured.lock().unwrap().clone().unwrap();
    assert_eq!(sent["model"], "llama-3.3-70b-versatile");
    assert_eq!(sent["messages"][0]["role"], "system");
    assert!(sent["messages"][0]["content"]
        .as_str()
        .unwrap()
        .contains("Kopi: stok 3"));
    assert_eq!(sent["messages"][1]["content"], "Berapa stok kopi?");
}

#[tokio::test]
async fn test_chat_passes_provider_error_through() {
    let (provider_url, _) = stub_provider().await;
    let server = TestServer::start_with(&[("AI_BASE_URL_GROQ", provider_url.as_str())]).await;

    let (status, body) = server
        .post(
            "/api/ai/chat",
            json!({
                "messages": [{ "role": "user", "content": "Halo" }],
                "config": { "provider": "groq", "apiKey": "gsk-bad" }
            }),
        )
        .await;
    assert_eq!(status, 502);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Invalid API Key");
}

#[tokio::test]
async fn test_provider_probe() {
    let (provider_url, captured) = stub_provider().await;
    let server = TestServer::start_with(&[("AI_BASE_URL_GROQ", provider_url.as_str())]).await;

    let (status, body) = server
        .post(
            "/api/ai/test",
            json!({ "provider": "groq", "apiKey": GOOD_KEY, "model": "llama-3.1-8b-instant" }),
        )
        .await;
    assert_eq!(status, 200, "{body}");
    assert_eq!(body["message"], "API key valid! Model: llama-3.1-8b-instant");
    assert_eq!(body["data"]["model"], "llama-3.1-8b-instant");
    assert!(body["data"]["responseTime"].is_u64());

    let sent = captured.lock().unwrap().clone().unwrap();
    assert_eq!(sent["messages"][0]["content"], "Hi");

    let (status, _) = server
        .post("/api/ai/test", json!({ "provider": "groq", "apiKey": "gsk-bad" }))
        .await;
    assert_eq!(status, 502);
}

#[tokio::test]
async fn test_ai_input_errors() {
    let server = TestServer::start().await;

    let (status, body) = server
        .post("/api/ai/test", json!({ "provider": "llamacorp", "apiKey": "k" }))
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["success"], false);

    let (status, _) = server
        .post("/api/ai/test", json!({ "provider": "openai" }))
        .await;
    assert_eq!(status, 400);

    let (status, _) = server
        .post(
            "/api/ai/chat",
            json!({ "messages": [], "config": { "provider": "groq", "apiKey": "k" } }),
        )
        .await;
    assert_eq!(status, 400);
}
