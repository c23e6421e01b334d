//! Tool/function calling types

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Function payload of a tool definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolFunction {
    /// Tool name (function name)
    pub name: String,
    /// Description of what the tool does
    pub description: String,
    /// JSON Schema for the input parameters
    #[serde(default)]
    pub parameters: Value,
}

/// Tool definition in the function-calling shape shared by the
/// OpenAI-compatible backends (`{"type": "function", "function": {...}}`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Always "function"
    #[serde(rename = "type")]
    pub kind: String,
    /// The function declaration
    pub function: ToolFunction,
}

impl ToolDefinition {
    /// Create a new tool definition
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: "function".to_string(),
            function: ToolFunction {
                name: name.into(),
                description: description.into(),
                parameters: empty_object_schema(),
            },
        }
    }

    /// Set the parameter schema
    pub fn with_parameters(mut self, parameters: Value) -> Self {
        self.function.parameters = parameters;
        self
    }

    /// The function name
    pub fn name(&self) -> &str {
        &self.function.name
    }
}

/// The empty `{type: object}` schema used when a tool declares no parameters
pub fn empty_object_schema() -> Value {
    json!({
        "type": "object",
        "properties": {},
        "required": []
    })
}

/// Name + description pair shown to the classifier and in direct-answer
/// prompts, so the model can see capabilities without full schemas
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSummary {
    pub function_name: String,
    pub function_description: String,
}

impl From<&ToolDefinition> for ToolSummary {
    fn from(tool: &ToolDefinition) -> Self {
        Self {
            function_name: tool.function.name.clone(),
            function_description: tool.function.description.clone(),
        }
    }
}

/// A tool call requested by the LLM
///
/// `id` is present for backends that correlate calls to results
/// (OpenAI-style) and absent for others (Gemini-style).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInvocation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Name of the tool being called
    pub name: String,
    /// Parsed input arguments
    pub arguments: Value,
}

impl ToolInvocation {
    /// Create a new invocation without a correlation id
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: None,
            name: name.into(),
            arguments,
        }
    }

    /// Set the correlation id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Record of one executed tool call, kept in the result envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutedToolCall {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub arguments: Value,
    /// Opaque endpoint result, or the stringified endpoint error
    pub result: Value,
}

/// Tool choice option for requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    /// Let the model decide whether to use tools
    #[default]
    Auto,
    /// Don't use tools
    None,
    /// Force tool use
    Required,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_definition_shape() {
        let tool = ToolDefinition::new("send_email", "Send an email").with_parameters(json!({
            "type": "object",
            "properties": { "to": { "type": "string" } },
            "required": ["to"]
        }));

        let value = serde_json::to_value(&tool).unwrap();
        assert_eq!(value["type"], "function");
        assert_eq!(value["function"]["name"], "send_email");
        assert_eq!(value["function"]["parameters"]["required"][0], "to");
    }

    #[test]
    fn test_tool_summary_from_definition() {
        let tool = ToolDefinition::new("get_weather", "Get the current weather");
        let summary = ToolSummary::from(&tool);
        assert_eq!(summary.function_name, "get_weather");
        assert_eq!(summary.function_description, "Get the current weather");
    }

    #[test]
    fn test_invocation_id_skipped_when_absent() {
        let call = ToolInvocation::new("get_weather", json!({"location": "SF"}));
        let json = serde_json::to_string(&call).unwrap();
        assert!(!json.contains("\"id\""));

        let with_id = call.with_id("call_123");
        let json = serde_json::to_string(&with_id).unwrap();
        assert!(json.contains("\"id\":\"call_123\""));
    }
}
