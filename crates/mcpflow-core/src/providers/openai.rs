//! OpenAI provider adapter
//!
//! Speaks the `/v1/chat/completions` wire format. The response parser is
//! shared with the Azure adapter, which uses the same shape.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use super::error::{ProviderError, ProviderResult};
use super::traits::{select_model, Provider, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};
use crate::logging::Logger;
use crate::types::{ChatRequest, LlmResponse, TokenUsage, ToolInvocation};

const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Adapter for the OpenAI chat completions API
pub struct OpenAiProvider {
    http: reqwest::Client,
    api_base: String,
    logger: Arc<dyn Logger>,
}

impl OpenAiProvider {
    /// Create a new OpenAI provider
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: OPENAI_API_BASE.to_string(),
            logger,
        }
    }

    /// Set a per-call transport timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http = client_with_timeout(timeout);
        self
    }

    /// Override the API base URL (OpenAI-compatible endpoints)
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }
}

pub(crate) fn client_with_timeout(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Build the chat-completions payload shared by OpenAI and Azure
pub(crate) fn build_chat_payload(provider: &str, request: &ChatRequest) -> ProviderResult<Value> {
    if request.api_key.is_empty() {
        return Err(ProviderError::missing_api_key(provider));
    }
    if request.max_tokens == Some(0) {
        return Err(ProviderError::invalid_request(
            provider,
            "max tokens must be greater than 0",
        ));
    }

    let mut messages = vec![json!({
        "role": "system",
        "content": request.prompt,
    })];
    for message in &request.chat_history {
        messages.push(json!({
            "role": message.role.to_string(),
            "content": message.content,
        }));
    }

    Ok(json!({
        "model": select_model(request),
        "messages": messages,
        "max_tokens": request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        "stream": false,
        "tools": request.tools,
        "tool_choice": request.tool_choice,
        "temperature": request.temperature.unwrap_or(DEFAULT_TEMPERATURE),
    }))
}

/// Normalize a chat-completions response.
///
/// Tool calls live at `choices[0].message.tool_calls`; their arguments
/// arrive as a JSON string and are parsed here. Usage fields absent from
/// the payload default to 0.
pub(crate) fn parse_chat_response(provider: &str, raw: Value) -> ProviderResult<LlmResponse> {
    let message = &raw["choices"][0]["message"];

    let text = message["content"].as_str().unwrap_or("").to_string();

    let mut tool_calls = Vec::new();
    if let Some(calls) = message["tool_calls"].as_array() {
        for call in calls {
            let name = call["function"]["name"]
                .as_str()
                .ok_or_else(|| {
                    ProviderError::invalid_response(provider, "tool call without a function name")
                })?
                .to_string();
            let arguments = match &call["function"]["arguments"] {
                Value::String(s) => serde_json::from_str(s)?,
                Value::Null => Value::Object(Map::new()),
                other => other.clone(),
            };
            tool_calls.push(ToolInvocation {
                id: call["id"].as_str().map(str::to_string),
                name,
                arguments,
            });
        }
    }

    let usage = TokenUsage {
        total: raw["usage"]["total_tokens"].as_u64().unwrap_or(0),
        input: raw["usage"]["prompt_tokens"].as_u64().unwrap_or(0),
        output: raw["usage"]["completion_tokens"].as_u64().unwrap_or(0),
    };

    Ok(LlmResponse {
        text,
        tool_calls,
        usage,
        raw,
    })
}

/// Read a backend reply, turning non-success statuses into [`ProviderError::Api`]
/// carrying the raw error body
pub(crate) async fn read_json_response(
    provider: &str,
    response: reqwest::Response,
) -> ProviderResult<Value> {
    let status = response.status();
    let body = response.text().await?;
    let value: Value = serde_json::from_str(&body).unwrap_or(Value::String(body));

    if !status.is_success() {
        return Err(ProviderError::api(provider, status.as_u16(), value));
    }
    Ok(value)
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn send(&self, request: &ChatRequest) -> ProviderResult<LlmResponse> {
        let payload = build_chat_payload(self.name(), request)?;
        self.logger
            .debug(&format!("[OpenAiProvider] Sending chat request, {} tools", request.tools.len()));

        let response = self
            .http
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&request.api_key)
            .json(&payload)
            .send()
            .await?;

        let raw = read_json_response(self.name(), response).await?;
        parse_chat_response(self.name(), raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use crate::types::{ChatMessage, ToolDefinition};

    fn request() -> ChatRequest {
        let mut request = ChatRequest::new("list tickets", "You are helpful");
        request.api_key = "sk-test".to_string();
        request.chat_model = "gpt-4o-mini".to_string();
        request
    }

    #[test]
    fn test_payload_defaults() {
        let payload = build_chat_payload("openai", &request()).unwrap();
        assert_eq!(payload["model"], "gpt-4o-mini");
        assert_eq!(payload["max_tokens"], 1000);
        assert_eq!(payload["temperature"], 0.1);
        assert_eq!(payload["tool_choice"], "auto");
        assert_eq!(payload["stream"], false);
        // System prompt travels separately from history
        assert_eq!(payload["messages"][0]["role"], "system");
        assert_eq!(payload["messages"][0]["content"], "You are helpful");
    }

    #[test]
    fn test_payload_serializes_history_and_tools() {
        let mut req = request();
        req.chat_history.push(ChatMessage::user("hi"));
        req.chat_history.push(ChatMessage::assistant("hello"));
        req.tools.push(ToolDefinition::new("send_email", "Send an email"));
        req.temperature = Some(0.7);

        let payload = build_chat_payload("openai", &req).unwrap();
        assert_eq!(payload["messages"][1]["role"], "user");
        assert_eq!(payload["messages"][2]["role"], "assistant");
        assert_eq!(payload["tools"][0]["function"]["name"], "send_email");
        // Caller temperature serializes exactly, no float widening noise
        assert_eq!(payload["temperature"], 0.7);
    }

    #[test]
    fn test_payload_rejects_missing_key() {
        let mut req = request();
        req.api_key.clear();
        assert!(matches!(
            build_chat_payload("openai", &req),
            Err(ProviderError::MissingApiKey { .. })
        ));
    }

    #[test]
    fn test_payload_rejects_zero_max_tokens() {
        let mut req = request();
        req.max_tokens = Some(0);
        assert!(matches!(
            build_chat_payload("openai", &req),
            Err(ProviderError::InvalidRequest { .. })
        ));
    }

    #[test]
    fn test_parse_text_response() {
        let raw = json!({
            "choices": [{ "message": { "role": "assistant", "content": "Hello there" } }],
            "usage": { "total_tokens": 30, "prompt_tokens": 20, "completion_tokens": 10 }
        });
        let response = parse_chat_response("openai", raw).unwrap();
        assert_eq!(response.text, "Hello there");
        assert!(response.tool_calls.is_empty());
        assert_eq!(response.usage.total, 30);
        assert_eq!(response.usage.input, 20);
        assert_eq!(response.usage.output, 10);
    }

    #[test]
    fn test_parse_tool_call_response() {
        let raw = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {
                            "name": "send_email",
                            "arguments": "{\"to\":\"a@b.com\"}"
                        }
                    }]
                }
            }],
            "usage": { "total_tokens": 12 }
        });
        let response = parse_chat_response("openai", raw).unwrap();
        assert_eq!(response.tool_calls.len(), 1);
        let call = &response.tool_calls[0];
        assert_eq!(call.id.as_deref(), Some("call_1"));
        assert_eq!(call.name, "send_email");
        assert_eq!(call.arguments["to"], "a@b.com");
        // Absent usage fields default to zero
        assert_eq!(response.usage.input, 0);
        assert_eq!(response.text, "");
    }

    #[test]
    fn test_parse_rejects_malformed_arguments() {
        let raw = json!({
            "choices": [{
                "message": {
                    "tool_calls": [{
                        "id": "call_1",
                        "function": { "name": "send_email", "arguments": "{not json" }
                    }]
                }
            }]
        });
        assert!(matches!(
            parse_chat_response("openai", raw),
            Err(ProviderError::Json(_))
        ));
    }

    #[test]
    fn test_parse_empty_payload_is_empty_text() {
        let response = parse_chat_response("openai", json!({})).unwrap();
        assert_eq!(response.text, "");
        assert!(response.tool_calls.is_empty());
        assert_eq!(response.usage.total, 0);
    }

    #[test]
    fn test_provider_name() {
        let provider = OpenAiProvider::new(Arc::new(NoOpLogger::new()));
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.history_role(), crate::types::MessageRole::Assistant);
    }
}
