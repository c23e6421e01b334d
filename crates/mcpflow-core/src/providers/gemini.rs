//! Gemini provider adapter
//!
//! Translates the canonical request into the `generateContent` shape:
//! history becomes `contents` (user/model roles only), the system prompt
//! travels as `system_instruction`, and tool definitions become
//! `functionDeclarations`. Tool calls come back as `functionCall` parts
//! with already-structured arguments and no correlation id.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use super::error::{ProviderError, ProviderResult};
use super::openai::{client_with_timeout, read_json_response};
use super::traits::{select_model, Provider, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};
use crate::logging::Logger;
use crate::types::{ChatRequest, LlmResponse, MessageRole, TokenUsage, ToolDefinition, ToolInvocation};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Adapter for the Google Gemini API
pub struct GeminiProvider {
    http: reqwest::Client,
    api_base: String,
    logger: Arc<dyn Logger>,
}

impl GeminiProvider {
    /// Create a new Gemini provider
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: GEMINI_API_BASE.to_string(),
            logger,
        }
    }

    /// Set a per-call transport timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http = client_with_timeout(timeout);
        self
    }

    /// Override the API base URL
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }
}

/// Build the `generateContent` payload
pub(crate) fn build_gemini_payload(request: &ChatRequest) -> ProviderResult<Value> {
    if request.api_key.is_empty() {
        return Err(ProviderError::missing_api_key("gemini"));
    }
    if request.prompt.is_empty() && request.input.is_empty() {
        return Err(ProviderError::invalid_request(
            "gemini",
            "prompt or input is required",
        ));
    }

    // Gemini only knows user and model roles; other turns are dropped
    let mut contents: Vec<Value> = request
        .chat_history
        .iter()
        .filter(|m| matches!(m.role, MessageRole::User | MessageRole::Model))
        .map(|m| {
            json!({
                "role": m.role.to_string(),
                "parts": [{ "text": m.content }]
            })
        })
        .collect();
    contents.push(json!({
        "role": "user",
        "parts": [{ "text": request.input }]
    }));

    let mut payload = json!({
        "system_instruction": {
            "parts": [{ "text": request.prompt }]
        },
        "contents": contents,
        "generationConfig": {
            "temperature": request.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            "maxOutputTokens": request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        }
    });

    if !request.tools.is_empty() {
        let declarations: Vec<Value> = request.tools.iter().map(function_declaration).collect();
        payload["tools"] = json!([{ "functionDeclarations": declarations }]);
    }

    Ok(payload)
}

/// Translate one function-style tool definition into a Gemini declaration.
///
/// Array-typed properties get an `items` sub-schema; every property gets a
/// `description` and a `default`.
pub(crate) fn function_declaration(tool: &ToolDefinition) -> Value {
    let parameters = &tool.function.parameters;

    let mut properties = Map::new();
    if let Some(props) = parameters["properties"].as_object() {
        for (key, value) in props {
            let description = value["description"].as_str().unwrap_or("");
            let translated = if value["type"] == "array" {
                json!({
                    "type": "array",
                    "items": { "type": value["items"]["type"].as_str().unwrap_or("string") },
                    "default": if value["default"].is_null() { json!([]) } else { value["default"].clone() },
                    "description": description,
                })
            } else {
                json!({
                    "type": value["type"].as_str().unwrap_or("string"),
                    "default": if value["default"].is_null() { json!("") } else { value["default"].clone() },
                    "description": description,
                })
            };
            properties.insert(key.clone(), translated);
        }
    }

    json!({
        "name": tool.function.name,
        "description": tool.function.description,
        "parameters": {
            "type": parameters["type"].as_str().unwrap_or("object"),
            "properties": properties,
            "required": parameters["required"].as_array().cloned().unwrap_or_default(),
        }
    })
}

/// Normalize a `generateContent` response.
///
/// Tool calls are `functionCall` parts under `candidates[0].content.parts`.
pub(crate) fn parse_gemini_response(raw: Value) -> LlmResponse {
    let parts = raw["candidates"][0]["content"]["parts"]
        .as_array()
        .cloned()
        .unwrap_or_default();

    let text = parts
        .iter()
        .find_map(|part| part["text"].as_str())
        .unwrap_or("")
        .to_string();

    let tool_calls: Vec<ToolInvocation> = parts
        .iter()
        .filter_map(|part| {
            let call = part.get("functionCall")?;
            Some(ToolInvocation {
                id: None,
                name: call["name"].as_str().unwrap_or("").to_string(),
                arguments: call.get("args").cloned().unwrap_or(Value::Object(Map::new())),
            })
        })
        .collect();

    let usage = TokenUsage {
        total: raw["usageMetadata"]["totalTokenCount"].as_u64().unwrap_or(0),
        input: raw["usageMetadata"]["promptTokenCount"].as_u64().unwrap_or(0),
        output: raw["usageMetadata"]["candidatesTokenCount"]
            .as_u64()
            .unwrap_or(0),
    };

    LlmResponse {
        text,
        tool_calls,
        usage,
        raw,
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn history_role(&self) -> MessageRole {
        MessageRole::Model
    }

    async fn send(&self, request: &ChatRequest) -> ProviderResult<LlmResponse> {
        let payload = build_gemini_payload(request)?;
        let model = select_model(request);
        self.logger
            .debug(&format!("[GeminiProvider] generateContent with model {}", model));

        let response = self
            .http
            .post(format!(
                "{}/models/{}:generateContent?key={}",
                self.api_base, model, request.api_key
            ))
            .json(&payload)
            .send()
            .await?;

        let raw = read_json_response(self.name(), response).await?;
        Ok(parse_gemini_response(raw))
    }
}
