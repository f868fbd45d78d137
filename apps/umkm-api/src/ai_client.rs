//! Outbound HTTP for the AI providers.
//!
//! Request shapes and reply parsing live in `umkm_core::ai`; this client
//! only sends the [`ProviderRequest`] and classifies the outcome. No retries,
//! no streaming.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use umkm_core::ai::{
    build_system_prompt, error_message, with_system_prompt, AiProvider, ChatMessage,
    ProviderRequest,
};

use crate::config::ApiConfig;
use crate::error::ApiError;

/// Result of a successful connectivity probe.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeOutcome {
    pub model: String,
    /// Milliseconds from send to response headers and body.
    pub response_time: u64,
}

/// A chat call: provider, credentials and conversation.
#[derive(Debug, Clone)]
pub struct ChatCall<'a> {
    pub provider: AiProvider,
    pub api_key: &'a str,
    pub model: Option<&'a str>,
    pub system_prompt: Option<&'a str>,
    pub context: Option<&'a str>,
    pub messages: Vec<ChatMessage>,
}

#[derive(Clone)]
pub struct AiClient {
    http: reqwest::Client,
    base_urls: HashMap<AiProvider, String>,
}

impl AiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.ai_timeout_secs))
            .build()
            .map_err(|e| ApiError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        let base_urls = AiProvider::ALL
            .into_iter()
            .map(|p| (p, config.ai_base_url(p).to_string()))
            .collect();

        Ok(AiClient { http, base_urls })
    }

    fn base_url(&self, provider: AiProvider) -> &str {
        self.base_urls
            .get(&provider)
            .map(String::as_str)
            .unwrap_or(provider.base_url())
    }

    /// Sends a chat and returns the assistant's reply.
    pub async fn chat(&self, call: ChatCall<'_>) -> Result<String, ApiError> {
        let provider = call.provider;
        let model = provider.resolve_model(call.model);
        let system = build_system_prompt(call.system_prompt, call.context);
        let messages = with_system_prompt(system, call.messages);

        let request =
            provider.chat_request(self.base_url(provider), call.api_key, model, &messages);
        let (status, body) = self.send(&request).await?;

        if !status.is_success() {
            let message =
                error_message(&body).unwrap_or_else(|| provider.fallback_error(false).to_string());
            warn!(provider = %provider, status = status.as_u16(), error = %message, "AI chat failed");
            return Err(ApiError::Upstream(message));
        }

        provider.parse_reply(&body).ok_or_else(|| {
            warn!(provider = %provider, "AI reply had an unexpected shape");
            ApiError::Upstream(format!("Unexpected response from {}", provider))
        })
    }

    /// Sends the minimal "Hi" request. Only the HTTP status is judged.
    pub async fn probe(
        &self,
        provider: AiProvider,
        api_key: &str,
        model: Option<&str>,
    ) -> Result<ProbeOutcome, ApiError> {
        let model = provider.resolve_model(model);
        let request = provider.probe_request(self.base_url(provider), api_key, model);

        let started = Instant::now();
        let (status, body) = self.send(&request).await?;
        let response_time = started.elapsed().as_millis() as u64;

        if !status.is_success() {
            let message =
                error_message(&body).unwrap_or_else(|| provider.fallback_error(true).to_string());
            return Err(ApiError::Upstream(message));
        }

        debug!(provider = %provider, model, response_time, "AI probe succeeded");
        Ok(ProbeOutcome {
            model: model.to_string(),
            response_time,
        })
    }

    async fn send(
        &self,
        request: &ProviderRequest,
    ) -> Result<(reqwest::StatusCode, Value), ApiError> {
        let mut builder = self.http.post(&request.url).json(&request.body);
        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Upstream(format!("Failed to reach AI provider: {}", e)))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Upstream(format!("Failed to read AI response: {}", e)))?;

        // Error pages are not always JSON
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        Ok((status, body))
    }
}
