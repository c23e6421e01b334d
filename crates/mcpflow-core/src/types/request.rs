//! Canonical chat request consumed by every provider adapter

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::message::{ChatMessage, InputType};
use super::tool::{ToolChoice, ToolDefinition};

/// The backend-agnostic chat request the conversation loop operates on.
///
/// Provider adapters translate this into each backend's wire format,
/// layering the fields over their fixed defaults (temperature 0.1,
/// max_tokens 1000, tool_choice auto).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The user's natural-language input
    #[serde(default)]
    pub input: String,
    /// Input modality, used for model-variant selection
    #[serde(default)]
    pub input_type: InputType,
    /// System/instruction prompt, always sent separately from history
    #[serde(default)]
    pub prompt: String,
    /// Backend API key
    #[serde(default)]
    pub api_key: String,
    /// Backend base URL override (required for Azure OpenAI)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// Model used for text input
    #[serde(default)]
    pub chat_model: String,
    /// Model used for image input, when the backend splits by modality
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vision_model: Option<String>,
    /// Model used for audio input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speech_model: Option<String>,
    /// Prior conversation turns
    #[serde(default)]
    pub chat_history: Vec<ChatMessage>,
    /// Tool catalog attached as structured declarations
    #[serde(default)]
    pub tools: Vec<ToolDefinition>,
    /// Tool choice behavior
    #[serde(default)]
    pub tool_choice: ToolChoice,
    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Temperature for response generation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

impl ChatRequest {
    /// Create a request with input and system prompt
    pub fn new(input: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    /// Set the API key
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = key.into();
        self
    }

    /// Set the chat model
    pub fn with_chat_model(mut self, model: impl Into<String>) -> Self {
        self.chat_model = model.into();
        self
    }

    /// Set the tool catalog
    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }
}

/// Outer execution payload: which client, which tool servers, the
/// per-server credential bundles, and the chat request itself
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionPayload {
    #[serde(default)]
    pub selected_client: String,
    #[serde(default)]
    pub selected_servers: Vec<String>,
    #[serde(default)]
    pub selected_server_credentials: Value,
    #[serde(default)]
    pub client_details: ChatRequest,
}
