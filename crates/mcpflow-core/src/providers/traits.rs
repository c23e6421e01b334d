//! Provider trait definition

use async_trait::async_trait;

use super::error::ProviderResult;
use crate::types::{ChatRequest, InputType, LlmResponse, MessageRole};

/// Default temperature applied when the request leaves it unset.
///
/// Kept `f64` so the serialized payload carries exactly `0.1`.
pub const DEFAULT_TEMPERATURE: f64 = 0.1;

/// Default max tokens applied when the request leaves it unset
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Provider trait for LLM backend adapters
///
/// Each backend family (OpenAI, Azure OpenAI, Gemini) implements this
/// trait. `send` translates the canonical request into the backend's wire
/// format, performs the call, and normalizes the heterogeneous response
/// into the canonical [`LlmResponse`]. Business-logic conditions (the model
/// answering in text instead of calling a tool) are successes, never errors.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider name (e.g. "openai", "azure", "gemini")
    fn name(&self) -> &str;

    /// Role used for synthetic tool-result turns appended to history
    fn history_role(&self) -> MessageRole {
        MessageRole::Assistant
    }

    /// Perform one chat call
    async fn send(&self, request: &ChatRequest) -> ProviderResult<LlmResponse>;
}

/// Pick the model variant for the request's input modality, falling back
/// to the chat model when the backend has no split model
pub(crate) fn select_model(request: &ChatRequest) -> &str {
    match request.input_type {
        InputType::Text => &request.chat_model,
        InputType::Image => request
            .vision_model
            .as_deref()
            .unwrap_or(&request.chat_model),
        InputType::Audio => request
            .speech_model
            .as_deref()
            .unwrap_or(&request.chat_model),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_model_by_modality() {
        let mut request = ChatRequest::default();
        request.chat_model = "gpt-4o-mini".to_string();
        request.vision_model = Some("gpt-4o".to_string());

        assert_eq!(select_model(&request), "gpt-4o-mini");

        request.input_type = InputType::Image;
        assert_eq!(select_model(&request), "gpt-4o");

        // No speech model configured: fall back to the chat model
        request.input_type = InputType::Audio;
        assert_eq!(select_model(&request), "gpt-4o-mini");
    }
}
