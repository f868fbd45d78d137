//! AI assistant: chat relay and credential test.

use axum::{extract::State, routing::post, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use umkm_core::ai::{AiProvider, ChatMessage};

use crate::ai_client::{ChatCall, ProbeOutcome};
use crate::error::{ApiError, ApiResult};
use crate::response::{ApiJson, ApiResponse};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/ai/chat", post(chat))
        .route("/api/ai/test", post(test_provider))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    pub provider: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub system_prompt: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatBody {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    pub config: Option<ProviderConfig>,
    pub context: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestBody {
    pub provider: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub content: String,
}

/// Parses the provider and checks that a key is present where one is needed.
fn credentials(provider: Option<&str>, api_key: Option<&str>) -> ApiResult<(AiProvider, String)> {
    let provider = provider
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::Validation("provider is required".to_string()))?
        .parse::<AiProvider>()?;

    let api_key = api_key.map(str::trim).unwrap_or_default();
    if api_key.is_empty() && provider.requires_api_key() {
        return Err(ApiError::Validation("apiKey is required".to_string()));
    }

    Ok((provider, api_key.to_string()))
}

/// `POST /api/ai/chat`: forwards the conversation and returns the reply.
async fn chat(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ChatBody>,
) -> ApiResult<ApiResponse<ChatReply>> {
    let config = body
        .config
        .ok_or_else(|| ApiError::Validation("config is required".to_string()))?;
    if body.messages.is_empty() {
        return Err(ApiError::Validation("messages is required".to_string()));
    }

    let (provider, api_key) = credentials(config.provider.as_deref(), config.api_key.as_deref())?;

    let content = state
        .ai
        .chat(ChatCall {
            provider,
            api_key: &api_key,
            model: config.model.as_deref(),
            system_prompt: config.system_prompt.as_deref(),
            context: body.context.as_deref(),
            messages: body.messages,
        })
        .await?;

    Ok(ApiResponse::ok(ChatReply { content }))
}

/// `POST /api/ai/test`: one tiny request to confirm the key works.
async fn test_provider(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<TestBody>,
) -> ApiResult<ApiResponse<ProbeOutcome>> {
    let (provider, api_key) = credentials(body.provider.as_deref(), body.api_key.as_deref())?;

    let outcome = state
        .ai
        .probe(provider, &api_key, body.model.as_deref())
        .await?;
    info!(provider = %provider, model = %outcome.model, response_time = outcome.response_time, "AI provider verified");

    let message = format!("API key valid! Model: {}", outcome.model);
    Ok(ApiResponse::ok(outcome).with_message(message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials() {
        let (provider, key) = credentials(Some("groq"), Some(" gsk-123 ")).unwrap();
        assert_eq!(provider, AiProvider::Groq);
        assert_eq!(key, "gsk-123");

        assert!(matches!(
            credentials(Some("openai"), None),
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            credentials(Some("llamacorp"), Some("k")),
            Err(ApiError::Config(_))
        ));
        assert!(matches!(credentials(None, Some("k")), Err(ApiError::Validation(_))));

        // Local models run without a key
        assert!(credentials(Some("ollama"), None).is_ok());
    }
}
