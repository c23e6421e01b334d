//! Canonical LLM response record

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::tool::ToolInvocation;

/// Token accounting for one backend call; absent fields default to 0
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub total: u64,
    pub input: u64,
    pub output: u64,
}

impl TokenUsage {
    pub fn new(total: u64, input: u64, output: u64) -> Self {
        Self {
            total,
            input,
            output,
        }
    }
}

/// Whether a response (and, transitively, a finished request) ended in
/// plain text or in tool calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputType {
    #[default]
    Text,
    ToolCall,
}

impl std::fmt::Display for OutputType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputType::Text => write!(f, "text"),
            OutputType::ToolCall => write!(f, "tool_call"),
        }
    }
}

/// The canonical shape every provider adapter normalizes into.
///
/// Exactly one of `text` (non-empty) or `tool_calls` (non-empty) determines
/// the response kind; both empty is a text response with empty content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    /// First textual message content found, or empty string
    pub text: String,
    /// Tool invocations requested by the model
    pub tool_calls: Vec<ToolInvocation>,
    /// Token usage for this call
    pub usage: TokenUsage,
    /// The raw backend payload, echoed through untouched
    pub raw: Value,
}

impl LlmResponse {
    /// A plain-text response
    pub fn text(text: impl Into<String>, usage: TokenUsage, raw: Value) -> Self {
        Self {
            text: text.into(),
            tool_calls: Vec::new(),
            usage,
            raw,
        }
    }

    /// A tool-call response
    pub fn tool_calls(calls: Vec<ToolInvocation>, usage: TokenUsage, raw: Value) -> Self {
        Self {
            text: String::new(),
            tool_calls: calls,
            usage,
            raw,
        }
    }

    /// Response kind: tool_call iff any invocation is present
    pub fn output_type(&self) -> OutputType {
        if self.tool_calls.is_empty() {
            OutputType::Text
        } else {
            OutputType::ToolCall
        }
    }

    /// The ordered text outputs this response contributes to the result
    pub fn messages(&self) -> Vec<String> {
        vec![self.text.clone()]
    }
}
