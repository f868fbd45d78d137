//! # AI Provider Dispatch
//!
//! A closed set of chat providers, each owning its request envelope and its
//! reply parser. Nothing here performs I/O: the API crate's HTTP client sends
//! the [`ProviderRequest`] built here and hands the JSON body back to
//! [`AiProvider::parse_reply`].
//!
//! ## Dispatch Table
//! ```text
//! ┌───────────┬──────────────────────────────┬──────────────────────────────┐
//! │ Provider  │ Request                      │ Reply path                   │
//! ├───────────┼──────────────────────────────┼──────────────────────────────┤
//! │ groq      │ POST /chat/completions       │ choices[0].message.content   │
//! │ openai    │   Bearer key, messages[]     │                              │
//! ├───────────┼──────────────────────────────┼──────────────────────────────┤
//! │ anthropic │ POST /messages               │ content[0].text              │
//! │           │   x-api-key, system + turns  │                              │
//! ├───────────┼──────────────────────────────┼──────────────────────────────┤
//! │ gemini    │ POST /models/{m}:generate…   │ candidates[0].content        │
//! │           │   ?key=, contents[]          │   .parts[0].text             │
//! ├───────────┼──────────────────────────────┼──────────────────────────────┤
//! │ ollama    │ POST /chat  (probe: /generate│ message.content              │
//! │           │   stream: false              │                              │
//! └───────────┴──────────────────────────────┴──────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use umkm_core::ai::{AiProvider, ChatMessage};
//!
//! let provider: AiProvider = "groq".parse().unwrap();
//! let messages = vec![ChatMessage::system("Be brief."), ChatMessage::user("Hi")];
//! let req = provider.chat_request(provider.base_url(), "gsk-test", "llama-3.3-70b-versatile", &messages);
//!
//! assert_eq!(req.url, "https://api.groq.com/openai/v1/chat/completions");
//! assert_eq!(req.body["temperature"], 0.7);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::CoreError;

/// Header appended to the system prompt before the business snapshot.
pub const CONTEXT_HEADER: &str = "\n\n## Current business data:\n";

/// Sampling temperature for chat requests.
pub const CHAT_TEMPERATURE: f64 = 0.7;

/// Token ceiling for Anthropic chat replies.
pub const ANTHROPIC_MAX_TOKENS: u32 = 4096;

/// Token ceiling for the connectivity probe.
pub const PROBE_MAX_TOKENS: u32 = 10;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const PROBE_PROMPT: &str = "Hi";

/// System prompt used when the client does not configure one.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a friendly and sharp AI business assistant helping the owner of a small business (UMKM).

## Capabilities:
- Answer questions about sales, stock and customers
- Provide business analysis and insight
- Help calculate profit, margin and projections
- Recommend ways to grow the business

## Guidelines:
- Answer in the language the user writes in, clearly and warmly
- Quote specific figures from the business data when available
- Give actionable recommendations

## Response format:
- Use bullet points for lists
- Use bold for important numbers
- End long answers with a short summary";

// =============================================================================
// Provider
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum AiProvider {
    Groq,
    OpenAi,
    Gemini,
    Anthropic,
    Ollama,
}

/// Request envelope family shared by one or more providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wire {
    ChatCompletions,
    Messages,
    GenerateContent,
    OllamaChat,
}

impl AiProvider {
    pub const ALL: [AiProvider; 5] = [
        AiProvider::Groq,
        AiProvider::OpenAi,
        AiProvider::Gemini,
        AiProvider::Anthropic,
        AiProvider::Ollama,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            AiProvider::Groq => "groq",
            AiProvider::OpenAi => "openai",
            AiProvider::Gemini => "gemini",
            AiProvider::Anthropic => "anthropic",
            AiProvider::Ollama => "ollama",
        }
    }

    pub const fn base_url(&self) -> &'static str {
        match self {
            AiProvider::Groq => "https://api.groq.com/openai/v1",
            AiProvider::OpenAi => "https://api.openai.com/v1",
            AiProvider::Gemini => "https://generativelanguage.googleapis.com/v1beta",
            AiProvider::Anthropic => "https://api.anthropic.com/v1",
            AiProvider::Ollama => "http://localhost:11434/api",
        }
    }

    pub const fn default_model(&self) -> &'static str {
        match self {
            AiProvider::Groq => "llama-3.3-70b-versatile",
            AiProvider::OpenAi => "gpt-4o-mini",
            AiProvider::Gemini => "gemini-1.5-flash",
            AiProvider::Anthropic => "claude-3-haiku-20240307",
            AiProvider::Ollama => "llama3.2",
        }
    }

    /// Models offered in the settings screen.
    pub const fn models(&self) -> &'static [&'static str] {
        match self {
            AiProvider::Groq => &[
                "llama-3.3-70b-versatile",
                "llama-3.1-8b-instant",
                "mixtral-8x7b-32768",
            ],
            AiProvider::OpenAi => &["gpt-4o", "gpt-4o-mini", "gpt-3.5-turbo"],
            AiProvider::Gemini => &["gemini-1.5-flash", "gemini-1.5-pro"],
            AiProvider::Anthropic => &["claude-3-5-sonnet-20241022", "claude-3-haiku-20240307"],
            AiProvider::Ollama => &["llama3.2", "mistral", "qwen2.5"],
        }
    }

    /// Whether requests carry an API key. Ollama runs locally without one.
    pub const fn requires_api_key(&self) -> bool {
        !matches!(self, AiProvider::Ollama)
    }

    const fn wire(&self) -> Wire {
        match self {
            AiProvider::Groq | AiProvider::OpenAi => Wire::ChatCompletions,
            AiProvider::Anthropic => Wire::Messages,
            AiProvider::Gemini => Wire::GenerateContent,
            AiProvider::Ollama => Wire::OllamaChat,
        }
    }

    /// Chooses the requested model, or the provider default when blank.
    pub fn resolve_model<'a>(&self, model: Option<&'a str>) -> &'a str {
        model
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(self.default_model())
    }

    // -------------------------------------------------------------------------
    // Request builders
    // -------------------------------------------------------------------------

    /// Builds a chat request. `messages` may include system turns; each wire
    /// format places them where its provider expects.
    pub fn chat_request(
        &self,
        base_url: &str,
        api_key: &str,
        model: &str,
        messages: &[ChatMessage],
    ) -> ProviderRequest {
        let base = base_url.trim_end_matches('/');

        match self.wire() {
            Wire::ChatCompletions => ProviderRequest::post(format!("{base}/chat/completions"))
                .bearer(api_key)
                .body(json!({
                    "model": model,
                    "messages": messages,
                    "temperature": CHAT_TEMPERATURE,
                })),

            Wire::Messages => {
                let (system, turns) = split_system(messages);
                ProviderRequest::post(format!("{base}/messages"))
                    .anthropic_headers(api_key)
                    .body(json!({
                        "model": model,
                        "max_tokens": ANTHROPIC_MAX_TOKENS,
                        "system": system.unwrap_or_default(),
                        "messages": turns,
                    }))
            }

            Wire::GenerateContent => {
                let (system, turns) = split_system(messages);
                let contents: Vec<Value> = turns
                    .iter()
                    .map(|m| {
                        json!({
                            "role": m.role.gemini_role(),
                            "parts": [{ "text": m.content }],
                        })
                    })
                    .collect();

                let mut body = json!({
                    "contents": contents,
                    "generationConfig": { "temperature": CHAT_TEMPERATURE },
                });
                if let Some(system) = system {
                    body["systemInstruction"] = json!({ "parts": [{ "text": system }] });
                }

                ProviderRequest::post(format!("{base}/models/{model}:generateContent"))
                    .query("key", api_key)
                    .body(body)
            }

            Wire::OllamaChat => ProviderRequest::post(format!("{base}/chat")).body(json!({
                "model": model,
                "messages": messages,
                "stream": false,
            })),
        }
    }

    /// Builds the minimal "Hi" request used to check a key and model.
    pub fn probe_request(&self, base_url: &str, api_key: &str, model: &str) -> ProviderRequest {
        let base = base_url.trim_end_matches('/');
        let hi = [ChatMessage::user(PROBE_PROMPT)];

        match self.wire() {
            Wire::ChatCompletions => ProviderRequest::post(format!("{base}/chat/completions"))
                .bearer(api_key)
                .body(json!({
                    "model": model,
                    "messages": hi,
                    "max_tokens": PROBE_MAX_TOKENS,
                })),

            Wire::Messages => ProviderRequest::post(format!("{base}/messages"))
                .anthropic_headers(api_key)
                .body(json!({
                    "model": model,
                    "max_tokens": PROBE_MAX_TOKENS,
                    "messages": hi,
                })),

            Wire::GenerateContent => {
                ProviderRequest::post(format!("{base}/models/{model}:generateContent"))
                    .query("key", api_key)
                    .body(json!({
                        "contents": [{ "parts": [{ "text": PROBE_PROMPT }] }],
                        "generationConfig": { "maxOutputTokens": PROBE_MAX_TOKENS },
                    }))
            }

            Wire::OllamaChat => ProviderRequest::post(format!("{base}/generate")).body(json!({
                "model": model,
                "prompt": PROBE_PROMPT,
                "stream": false,
            })),
        }
    }

    // -------------------------------------------------------------------------
    // Response parsing
    // -------------------------------------------------------------------------

    /// Extracts the assistant text from a successful response body.
    ///
    /// Returns `None` when the body does not have the provider's shape.
    pub fn parse_reply(&self, body: &Value) -> Option<String> {
        let text = match self.wire() {
            Wire::ChatCompletions => body.pointer("/choices/0/message/content"),
            Wire::Messages => body.pointer("/content/0/text"),
            Wire::GenerateContent => body.pointer("/candidates/0/content/parts/0/text"),
            Wire::OllamaChat => body.pointer("/message/content"),
        };

        text.and_then(Value::as_str).map(str::to_string)
    }

    /// Message shown when a failed response carries no `error.message`.
    pub const fn fallback_error(&self, probe: bool) -> &'static str {
        match (*self, probe) {
            (AiProvider::Ollama, true) => "Ollama not running or model not found",
            (AiProvider::Ollama, false) => "Ollama request failed",
            (_, true) => "Invalid API Key",
            (_, false) => "API request failed",
        }
    }
}

impl fmt::Display for AiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AiProvider {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AiProvider::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| CoreError::UnknownProvider(s.to_string()))
    }
}

/// Reads `error.message` from a provider error body.
///
/// Every supported provider reports failures in that shape.
pub fn error_message(body: &Value) -> Option<String> {
    body.pointer("/error/message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

/// Combines the configured (or default) system prompt with the business
/// snapshot.
pub fn build_system_prompt(system_prompt: Option<&str>, context: Option<&str>) -> String {
    let base = system_prompt
        .filter(|p| !p.trim().is_empty())
        .unwrap_or(DEFAULT_SYSTEM_PROMPT);

    match context.filter(|c| !c.trim().is_empty()) {
        Some(ctx) => format!("{base}{CONTEXT_HEADER}{ctx}"),
        None => base.to_string(),
    }
}

/// Prepends the system prompt to the conversation.
pub fn with_system_prompt(system: String, messages: Vec<ChatMessage>) -> Vec<ChatMessage> {
    let mut all = Vec::with_capacity(messages.len() + 1);
    all.push(ChatMessage::system(system));
    all.extend(messages);
    all
}

fn split_system(messages: &[ChatMessage]) -> (Option<&str>, Vec<&ChatMessage>) {
    let system = messages
        .iter()
        .find(|m| m.role == ChatRole::System)
        .map(|m| m.content.as_str());
    let turns = messages
        .iter()
        .filter(|m| m.role != ChatRole::System)
        .collect();
    (system, turns)
}

// =============================================================================
// Messages
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatRole {
    const fn gemini_role(&self) -> &'static str {
        match self {
            ChatRole::Assistant => "model",
            ChatRole::System | ChatRole::User => "user",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

// =============================================================================
// Request Envelope
// =============================================================================

/// A fully described outbound POST, ready for an HTTP client.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRequest {
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub query: Vec<(&'static str, String)>,
    pub body: Value,
}

impl ProviderRequest {
    fn post(url: String) -> Self {
        Self {
            url,
            headers: Vec::new(),
            query: Vec::new(),
            body: Value::Null,
        }
    }

    fn bearer(mut self, api_key: &str) -> Self {
        self.headers
            .push(("authorization", format!("Bearer {api_key}")));
        self
    }

    fn anthropic_headers(mut self, api_key: &str) -> Self {
        self.headers.push(("x-api-key", api_key.to_string()));
        self.headers
            .push(("anthropic-version", ANTHROPIC_VERSION.to_string()));
        self
    }

    fn query(mut self, key: &'static str, value: &str) -> Self {
        self.query.push((key, value.to_string()));
        self
    }

    fn body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn conversation() -> Vec<ChatMessage> {
        vec![
            ChatMessage::system("SYS"),
            ChatMessage::user("How were sales?"),
            ChatMessage::assistant("Good."),
            ChatMessage::user("And stock?"),
        ]
    }

    #[test]
    fn test_parse_provider() {
        assert_eq!("openai".parse::<AiProvider>().unwrap(), AiProvider::OpenAi);
        let err = "mistral-cloud".parse::<AiProvider>().unwrap_err();
        assert_eq!(err.to_string(), "Provider mistral-cloud is not supported");
        assert_eq!(serde_json::to_string(&AiProvider::OpenAi).unwrap(), "\"openai\"");
    }

    #[test]
    fn test_chat_completions_request() {
        let p = AiProvider::OpenAi;
        let req = p.chat_request("http://stub/v1/", "sk-1", "gpt-4o-mini", &conversation());

        assert_eq!(req.url, "http://stub/v1/chat/completions");
        assert_eq!(req.header("authorization"), Some("Bearer sk-1"));
        assert_eq!(req.body["messages"].as_array().unwrap().len(), 4);
        assert_eq!(req.body["messages"][0]["role"], "system");
    }

    #[test]
    fn test_anthropic_request_separates_system() {
        let p = AiProvider::Anthropic;
        let req = p.chat_request(p.base_url(), "key", "claude-3-haiku-20240307", &conversation());

        assert_eq!(req.url, "https://api.anthropic.com/v1/messages");
        assert_eq!(req.header("x-api-key"), Some("key"));
        assert_eq!(req.header("anthropic-version"), Some("2023-06-01"));
        assert_eq!(req.body["system"], "SYS");
        assert_eq!(req.body["max_tokens"], 4096);
        assert_eq!(req.body["messages"].as_array().unwrap().len(), 3);
        assert_eq!(req.body["messages"][0]["role"], "user");
    }

    #[test]
    fn test_gemini_request_shape() {
        let p = AiProvider::Gemini;
        let req = p.chat_request(p.base_url(), "g-key", "gemini-1.5-flash", &conversation());

        assert_eq!(
            req.url,
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        );
        assert_eq!(req.query, vec![("key", "g-key".to_string())]);
        assert_eq!(req.body["contents"][1]["role"], "model");
        assert_eq!(req.body["contents"][1]["parts"][0]["text"], "Good.");
        assert_eq!(req.body["systemInstruction"]["parts"][0]["text"], "SYS");
        assert_eq!(req.body["generationConfig"]["temperature"], 0.7);
    }

    #[test]
    fn test_ollama_requests() {
        let p = AiProvider::Ollama;
        let chat = p.chat_request(p.base_url(), "", "llama3.2", &conversation());
        assert_eq!(chat.url, "http://localhost:11434/api/chat");
        assert_eq!(chat.body["stream"], false);
        assert!(chat.headers.is_empty());

        let probe = p.probe_request(p.base_url(), "", "llama3.2");
        assert_eq!(probe.url, "http://localhost:11434/api/generate");
        assert_eq!(probe.body["prompt"], "Hi");
    }

    #[test]
    fn test_probe_uses_small_token_budget() {
        let req = AiProvider::Groq.probe_request("http://stub", "k", "m");
        assert_eq!(req.body["max_tokens"], 10);
        assert_eq!(req.body["messages"][0]["content"], "Hi");

        let gem = AiProvider::Gemini.probe_request("http://stub", "k", "m");
        assert_eq!(gem.body["generationConfig"]["maxOutputTokens"], 10);
    }

    #[test]
    fn test_parse_replies() {
        let openai = json!({"choices": [{"message": {"content": "halo"}}]});
        assert_eq!(AiProvider::Groq.parse_reply(&openai).as_deref(), Some("halo"));

        let anthropic = json!({"content": [{"type": "text", "text": "hi there"}]});
        assert_eq!(
            AiProvider::Anthropic.parse_reply(&anthropic).as_deref(),
            Some("hi there")
        );

        let gemini = json!({"candidates": [{"content": {"parts": [{"text": "ok"}]}}]});
        assert_eq!(AiProvider::Gemini.parse_reply(&gemini).as_deref(), Some("ok"));

        let ollama = json!({"message": {"role": "assistant", "content": "local"}});
        assert_eq!(AiProvider::Ollama.parse_reply(&ollama).as_deref(), Some("local"));

        assert_eq!(AiProvider::OpenAi.parse_reply(&json!({"unexpected": 1})), None);
    }

    #[test]
    fn test_error_message_extraction() {
        let body = json!({"error": {"message": "Invalid API Key", "type": "auth"}});
        assert_eq!(error_message(&body).as_deref(), Some("Invalid API Key"));
        assert_eq!(error_message(&json!({"detail": "x"})), None);
    }

    #[test]
    fn test_system_prompt_with_context() {
        let prompt = build_system_prompt(Some("Be brief."), Some("sales: 10"));
        assert_eq!(prompt, "Be brief.\n\n## Current business data:\nsales: 10");

        let default = build_system_prompt(None, None);
        assert_eq!(default, DEFAULT_SYSTEM_PROMPT);

        let all = with_system_prompt(prompt, vec![ChatMessage::user("hi")]);
        assert_eq!(all[0].role, ChatRole::System);
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_resolve_model() {
        assert_eq!(AiProvider::Groq.resolve_model(None), "llama-3.3-70b-versatile");
        assert_eq!(AiProvider::Groq.resolve_model(Some("  ")), "llama-3.3-70b-versatile");
        assert_eq!(AiProvider::Groq.resolve_model(Some("mixtral-8x7b-32768")), "mixtral-8x7b-32768");
    }
}
