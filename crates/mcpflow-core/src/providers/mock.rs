//! Mock provider for testing
//!
//! Plays back a fixed script of canonical responses without network
//! dependencies and records every request it receives, so tests can both
//! drive the conversation loop deterministically and assert on what was
//! sent to the backend.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;

use super::error::{ProviderError, ProviderResult};
use super::traits::Provider;
use crate::logging::Logger;
use crate::types::{ChatRequest, LlmResponse, MessageRole, TokenUsage, ToolInvocation};

/// Scripted LLM provider for testing
pub struct MockProvider {
    script: Mutex<VecDeque<ProviderResult<LlmResponse>>>,
    requests: Mutex<Vec<ChatRequest>>,
    history_role: MessageRole,
    logger: Arc<dyn Logger>,
}

impl MockProvider {
    /// Create a provider that replays the given responses in order
    pub fn scripted(
        script: Vec<ProviderResult<LlmResponse>>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
            history_role: MessageRole::Assistant,
            logger,
        }
    }

    /// Use the Gemini-style history role for synthetic turns
    pub fn with_model_role(mut self) -> Self {
        self.history_role = MessageRole::Model;
        self
    }

    /// A canned text response
    pub fn text_response(text: impl Into<String>, usage: TokenUsage) -> LlmResponse {
        let text = text.into();
        let raw = json!({ "mock": true, "kind": "text", "content": text });
        LlmResponse::text(text, usage, raw)
    }

    /// A canned tool-call response
    pub fn tool_call_response(calls: Vec<ToolInvocation>, usage: TokenUsage) -> LlmResponse {
        let raw = json!({
            "mock": true,
            "kind": "tool_call",
            "calls": calls.iter().map(|c| c.name.clone()).collect::<Vec<_>>(),
        });
        LlmResponse::tool_calls(calls, usage, raw)
    }

    /// Every request received so far, in order
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn history_role(&self) -> MessageRole {
        self.history_role
    }

    async fn send(&self, request: &ChatRequest) -> ProviderResult<LlmResponse> {
        self.requests.lock().push(request.clone());

        match self.script.lock().pop_front() {
            Some(entry) => entry,
            None => {
                self.logger.warn("[MockProvider] script exhausted");
                Err(ProviderError::invalid_request("mock", "script exhausted"))
            }
        }
    }
}
