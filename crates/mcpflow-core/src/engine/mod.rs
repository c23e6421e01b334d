//! Orchestration engine
//!
//! The facade that ties validation, provider selection, the conversation
//! loop, and the event stream together. One engine instance serves many
//! concurrent requests against a shared endpoint registry.

mod conversation;
mod selector;

pub use conversation::ConversationLoop;
pub use selector::select_tools;

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::config::EngineConfig;
use crate::dispatch::ToolDispatcher;
use crate::endpoint::EndpointRegistry;
use crate::events::{EventSink, ProgressEvent};
use crate::logging::SharedLogger;
use crate::providers::{AzureOpenAiProvider, GeminiProvider, OpenAiProvider, Provider};
use crate::types::{ExecutionPayload, ResultEnvelope};
use crate::validation::{validate_payload, ClientKind, ValidatedPayload};

/// Request orchestrator over a fixed endpoint registry
pub struct Engine {
    registry: Arc<EndpointRegistry>,
    config: EngineConfig,
    logger: SharedLogger,
}

impl Engine {
    pub fn new(registry: Arc<EndpointRegistry>, config: EngineConfig, logger: SharedLogger) -> Self {
        Self {
            registry,
            config,
            logger,
        }
    }

    /// Instantiate the adapter for the request's backend family
    fn provider_for(&self, client: ClientKind) -> Arc<dyn Provider> {
        let timeout = self.config.request_timeout_secs.map(Duration::from_secs);
        match client {
            ClientKind::OpenAi => {
                let provider = OpenAiProvider::new(self.logger.clone());
                Arc::new(match timeout {
                    Some(t) => provider.with_timeout(t),
                    None => provider,
                })
            }
            ClientKind::AzureOpenAi => {
                let provider = AzureOpenAiProvider::new(self.logger.clone());
                Arc::new(match timeout {
                    Some(t) => provider.with_timeout(t),
                    None => provider,
                })
            }
            ClientKind::Gemini => {
                let provider = GeminiProvider::new(self.logger.clone());
                Arc::new(match timeout {
                    Some(t) => provider.with_timeout(t),
                    None => provider,
                })
            }
        }
    }

    /// Execute one payload end to end.
    ///
    /// Emits `STARTED` before validation and exactly one terminal event;
    /// the returned envelope always matches the event stream's verdict.
    pub async fn execute(&self, payload: ExecutionPayload, sink: &dyn EventSink) -> ResultEnvelope {
        sink.emit(ProgressEvent::started());

        let validated = match validate_payload(payload, &self.registry).await {
            Ok(validated) => validated,
            Err(err) => {
                self.logger
                    .error(&format!("[engine] validation failed: {}", err));
                let error = Value::String(err.to_string());
                sink.emit(ProgressEvent::error(Value::Null, error.clone()));
                return ResultEnvelope::failure(None, error);
            }
        };

        let provider = self.provider_for(validated.client);
        self.run_loop(provider, validated, sink).await
    }

    /// Execute with a caller-supplied provider, bypassing backend selection
    pub async fn execute_with_provider(
        &self,
        payload: ExecutionPayload,
        provider: Arc<dyn Provider>,
        sink: &dyn EventSink,
    ) -> ResultEnvelope {
        sink.emit(ProgressEvent::started());

        let validated = match validate_payload(payload, &self.registry).await {
            Ok(validated) => validated,
            Err(err) => {
                self.logger
                    .error(&format!("[engine] validation failed: {}", err));
                let error = Value::String(err.to_string());
                sink.emit(ProgressEvent::error(Value::Null, error.clone()));
                return ResultEnvelope::failure(None, error);
            }
        };

        self.run_loop(provider, validated, sink).await
    }

    async fn run_loop(
        &self,
        provider: Arc<dyn Provider>,
        validated: ValidatedPayload,
        sink: &dyn EventSink,
    ) -> ResultEnvelope {
        let dispatcher = ToolDispatcher::new(self.registry.clone(), self.logger.clone());
        let conversation =
            ConversationLoop::new(provider, dispatcher, self.config.clone(), self.logger.clone());

        let envelope = conversation.run(validated, sink).await;

        if envelope.status {
            let data = serde_json::to_value(&envelope.data).unwrap_or(Value::Null);
            sink.emit(ProgressEvent::ai_response(data));
            sink.emit(ProgressEvent::completed());
        } else {
            let data = serde_json::to_value(&envelope.data).unwrap_or(Value::Null);
            let error = envelope.error.clone().unwrap_or(Value::Null);
            sink.emit(ProgressEvent::error(data, error));
        }

        envelope
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::endpoint::{StaticEndpoint, ToolDescriptor};
    use crate::events::{CollectingSink, EventAction, StreamingStatus};
    use crate::logging::NoOpLogger;
    use crate::providers::MockProvider;
    use crate::types::{ChatRequest, TokenUsage};

    fn engine() -> Engine {
        let endpoint = StaticEndpoint::new()
            .with_tool(ToolDescriptor::new("send_message").with_description("Send a message"));
        let registry = Arc::new(EndpointRegistry::new().with_endpoint(
            "SLACK",
            Arc::new(endpoint) as Arc<dyn crate::endpoint::ToolEndpoint>,
        ));
        Engine::new(registry, EngineConfig::default(), Arc::new(NoOpLogger::new()))
    }

    fn payload() -> ExecutionPayload {
        ExecutionPayload {
            selected_client: "MCP_CLIENT_OPENAI".to_string(),
            selected_servers: vec!["SLACK".to_string()],
            selected_server_credentials: json!({}),
            client_details: ChatRequest::new("what can you do", "You are a Slack assistant")
                .with_api_key("key")
                .with_chat_model("gpt-4o-mini"),
        }
    }

    #[tokio::test]
    async fn test_successful_request_event_sequence() {
        let provider = Arc::new(MockProvider::scripted(
            vec![
                Ok(MockProvider::text_response(
                    "<function_call>FALSE</function_call><selected_tools>none</selected_tools>",
                    TokenUsage::new(20, 15, 5),
                )),
                Ok(MockProvider::text_response(
                    "I can send Slack messages.",
                    TokenUsage::new(30, 20, 10),
                )),
            ],
            Arc::new(NoOpLogger::new()),
        ));
        let sink = CollectingSink::new();

        let envelope = engine()
            .execute_with_provider(payload(), provider, &sink)
            .await;

        assert!(envelope.status);

        let events = sink.events();
        assert_eq!(events[0].streaming_status, StreamingStatus::Started);
        assert_eq!(
            events.last().unwrap().streaming_status,
            StreamingStatus::Completed
        );
        // Exactly one terminal frame, preceded by the full result data
        let terminal: Vec<_> = events
            .iter()
            .filter(|e| {
                matches!(
                    e.streaming_status,
                    StreamingStatus::Completed | StreamingStatus::Error
                )
            })
            .collect();
        assert_eq!(terminal.len(), 1);

        let ai_response = events
            .iter()
            .find(|e| e.action == EventAction::AiResponse)
            .unwrap();
        assert_eq!(ai_response.data["total_llm_calls"], 2);
    }

    #[tokio::test]
    async fn test_validation_failure_single_error_event() {
        let sink = CollectingSink::new();
        let mut bad = payload();
        bad.selected_servers = vec!["JIRA".to_string()];

        let envelope = engine().execute(bad, &sink).await;

        assert!(!envelope.status);
        assert!(envelope.data.is_none());
        assert!(envelope
            .error
            .as_ref()
            .unwrap()
            .as_str()
            .unwrap()
            .contains("JIRA"));

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].streaming_status, StreamingStatus::Started);
        assert_eq!(events[1].streaming_status, StreamingStatus::Error);
    }

    #[tokio::test]
    async fn test_loop_failure_single_error_event_with_data() {
        let provider = Arc::new(MockProvider::scripted(
            vec![
                Ok(MockProvider::text_response(
                    "<function_call>FALSE</function_call><selected_tools>none</selected_tools>",
                    TokenUsage::new(20, 15, 5),
                )),
                Err(crate::providers::ProviderError::api(
                    "openai",
                    500,
                    json!({"error": "upstream down"}),
                )),
            ],
            Arc::new(NoOpLogger::new()),
        ));
        let sink = CollectingSink::new();

        let envelope = engine()
            .execute_with_provider(payload(), provider, &sink)
            .await;

        assert!(!envelope.status);

        let events = sink.events();
        let error = events.last().unwrap();
        assert_eq!(error.streaming_status, StreamingStatus::Error);
        // Partial totals from before the failure ride along
        assert_eq!(error.data["total_llm_calls"], 1);
        assert_eq!(error.error.as_ref().unwrap()["error"], "upstream down");
    }
}
