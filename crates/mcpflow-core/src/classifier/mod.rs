//! Intent classifier
//!
//! Before any tool-enabled call, the engine runs one cheap, tools-stripped
//! call asking the model to decide whether the request maps onto the
//! available tools at all, and to rank candidate tool names. Sending the
//! full tool-schema block is the dominant token cost; this pass amortizes
//! it onto only the requests that plausibly need it.
//!
//! The reply contract is two tagged fields. Extraction is deliberately
//! forgiving: a missing or malformed tag degrades to "no tool call", which
//! is the safe default - parsing never errors.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::ToolSummary;

static FUNCTION_CALL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<function_call>([^<]+)</function_call>").unwrap());

static SELECTED_TOOLS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<selected_tools>([^<]+)</selected_tools>").unwrap());

/// Outcome of the classification call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    /// Whether the model judged the request to map onto a tool
    pub is_function_call: bool,
    /// Tool names ranked by relevance; empty when none matched or the
    /// model answered the literal `none`
    pub selected_tools: Vec<String>,
}

/// Build the classification system prompt.
///
/// The model sees only name+description summaries, decides TRUE whenever
/// the request plausibly maps onto a tool without checking parameter
/// completeness, and must answer in the exact two-tag format.
pub fn classification_prompt(server_name: &str, tools: &[ToolSummary]) -> String {
    let available = serde_json::to_string(tools).unwrap_or_else(|_| "[]".to_string());
    format!(
        r#"You are an {server_name} AI assistant that analyzes user requests and determines the required tool calls from available tools.
Available tools: {available}
Analyze each request to determine if it matches available tool capabilities or needs clarification.
Return TRUE for tool calls when the request clearly maps to available tools without checking the required parameters.
Return FALSE when the request is ambiguous, missing parameters, or requires more information.
Output format:
    <function_call>TRUE/FALSE</function_call>
    <selected_tools>function_name1,function_name2 or "none"</selected_tools>
Use exact tool names from available tools. List all relevant tools ordered by relevance. The output format should be exactly the same as mentioned above. It should be in string"#
    )
}

/// Extract the two tagged fields from the classifier's reply.
///
/// Each extraction is independent and tolerant of the other's absence.
pub fn extract_classification(reply: &str) -> Classification {
    let mut result = Classification::default();

    if let Some(captures) = FUNCTION_CALL_RE.captures(reply) {
        if let Some(flag) = captures.get(1) {
            result.is_function_call = flag.as_str().trim().eq_ignore_ascii_case("true");
        }
    }

    if let Some(captures) = SELECTED_TOOLS_RE.captures(reply) {
        if let Some(list) = captures.get(1) {
            result.selected_tools = list
                .as_str()
                .split(',')
                .map(|name| name.trim().trim_matches('"'))
                .filter(|name| !name.is_empty() && !name.eq_ignore_ascii_case("none"))
                .map(str::to_string)
                .collect();
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ToolDefinition;

    #[test]
    fn test_extract_true_with_tools() {
        let reply = "<function_call>TRUE</function_call>\n<selected_tools>send_email,create_ticket</selected_tools>";
        let result = extract_classification(reply);
        assert!(result.is_function_call);
        assert_eq!(result.selected_tools, vec!["send_email", "create_ticket"]);
    }

    #[test]
    fn test_extract_false_with_none() {
        let reply = "<function_call>FALSE</function_call><selected_tools>none</selected_tools>";
        let result = extract_classification(reply);
        assert!(!result.is_function_call);
        assert!(result.selected_tools.is_empty());
    }

    #[test]
    fn test_extract_tolerates_case_and_whitespace() {
        let reply = "<function_call> true </function_call><selected_tools> a , b </selected_tools>";
        let result = extract_classification(reply);
        assert!(result.is_function_call);
        assert_eq!(result.selected_tools, vec!["a", "b"]);
    }

    #[test]
    fn test_missing_function_call_tag_defaults_false() {
        let reply = "<selected_tools>send_email</selected_tools>";
        let result = extract_classification(reply);
        assert!(!result.is_function_call);
        assert_eq!(result.selected_tools, vec!["send_email"]);
    }

    #[test]
    fn test_missing_tools_tag_defaults_empty() {
        let reply = "<function_call>TRUE</function_call>";
        let result = extract_classification(reply);
        assert!(result.is_function_call);
        assert!(result.selected_tools.is_empty());
    }

    #[test]
    fn test_garbage_never_errors() {
        for reply in ["", "no tags here", "<function_call></function_call>", "<selected_tools>,,,</selected_tools>"] {
            let result = extract_classification(reply);
            assert!(!result.is_function_call);
            assert!(result.selected_tools.is_empty());
        }
    }

    #[test]
    fn test_prompt_includes_tool_summaries() {
        let tools = vec![ToolSummary::from(&ToolDefinition::new(
            "send_email",
            "Send an email",
        ))];
        let prompt = classification_prompt("SLACK", &tools);
        assert!(prompt.contains("SLACK"));
        assert!(prompt.contains("send_email"));
        assert!(prompt.contains("<function_call>TRUE/FALSE</function_call>"));
    }
}
