//! The tool-use conversation loop
//!
//! One generic loop drives every backend through the [`Provider`] trait:
//! classify the request, then either answer directly with tool summaries
//! in the prompt, or iterate tool rounds until the model answers in text.
//! Rounds are bounded by `max_rounds`; a model that keeps requesting tools
//! past the bound terminates the request with a round-limit error instead
//! of looping forever.

use std::sync::Arc;

use serde_json::Value;

use crate::classifier::{classification_prompt, extract_classification};
use crate::config::EngineConfig;
use crate::dispatch::ToolDispatcher;
use crate::events::{EventSink, ProgressEvent};
use crate::logging::SharedLogger;
use crate::providers::Provider;
use crate::types::{
    ChatMessage, ChatRequest, ExecutedToolCall, ExecutionResult, OutputType, ResultEnvelope,
    ToolInvocation, ToolSummary,
};
use crate::validation::ValidatedPayload;

use super::selector::select_tools;

/// Runs one request to completion against a single provider
pub struct ConversationLoop {
    provider: Arc<dyn Provider>,
    dispatcher: ToolDispatcher,
    config: EngineConfig,
    logger: SharedLogger,
}

impl ConversationLoop {
    pub fn new(
        provider: Arc<dyn Provider>,
        dispatcher: ToolDispatcher,
        config: EngineConfig,
        logger: SharedLogger,
    ) -> Self {
        Self {
            provider,
            dispatcher,
            config,
            logger,
        }
    }

    /// Drive the request to a terminal envelope.
    ///
    /// Never panics; adapter errors become failure envelopes carrying
    /// whatever totals accumulated before the error.
    pub async fn run(&self, validated: ValidatedPayload, sink: &dyn EventSink) -> ResultEnvelope {
        let ValidatedPayload {
            server,
            credentials,
            request: mut chat,
            catalog,
            ..
        } = validated;

        chat.chat_history.push(ChatMessage::user(chat.input.clone()));

        let original_prompt = chat.prompt.clone();
        let summaries: Vec<ToolSummary> = catalog.iter().map(ToolSummary::from).collect();

        let mut result = ExecutionResult::default();

        // Classification pass: summaries only, no schemas, no tools
        chat.prompt = classification_prompt(&server, &summaries);
        chat.tools = Vec::new();

        let reply = match self.provider.send(&chat).await {
            Ok(reply) => reply,
            Err(err) => {
                self.logger
                    .error(&format!("[loop] classification call failed: {}", err));
                return ResultEnvelope::failure(Some(result), err.as_error_value());
            }
        };
        result.absorb(&reply);
        sink.emit(ProgressEvent::notification(
            "Token-optimized classification call completed",
        ));

        let classification = extract_classification(&reply.text);
        self.logger.debug(&format!(
            "[loop] classified is_function_call={} tools={:?}",
            classification.is_function_call, classification.selected_tools
        ));

        chat.prompt = original_prompt.clone();

        if classification.is_function_call {
            chat.tools = select_tools(&catalog, &classification.selected_tools);
            return self
                .tool_rounds(chat, &server, &credentials, result, sink)
                .await;
        }

        // Direct answer: the prompt carries tool summaries so the model can
        // explain its capabilities, but no structured declarations go out
        let summaries_json =
            serde_json::to_string(&summaries).unwrap_or_else(|_| "[]".to_string());
        chat.prompt = format!("{}. Available tools: {}", original_prompt, summaries_json);
        chat.tools = Vec::new();

        let reply = match self.provider.send(&chat).await {
            Ok(reply) => reply,
            Err(err) => {
                self.logger
                    .error(&format!("[loop] direct answer call failed: {}", err));
                return ResultEnvelope::failure(Some(result), err.as_error_value());
            }
        };
        result.absorb(&reply);
        result.output_type = reply.output_type();

        // The model called tools anyway despite the classifier's FALSE;
        // honor them and fall into the regular round loop. Tool calls win
        // over any text riding along in the same reply.
        if reply.output_type() == OutputType::ToolCall {
            chat.prompt = original_prompt;
            chat.tools = select_tools(&catalog, &classification.selected_tools);
            self.execute_calls(
                &mut chat,
                &server,
                &credentials,
                &mut result,
                sink,
                &reply.tool_calls,
            )
            .await;
            return self
                .tool_rounds(chat, &server, &credentials, result, sink)
                .await;
        }

        if !reply.text.is_empty() {
            for message in reply.messages() {
                sink.emit(ProgressEvent::message(message.clone()));
                result.messages.push(message);
            }
        }
        ResultEnvelope::success(result)
    }

    /// Iterate tool rounds until the model answers in text or the round
    /// limit is hit
    async fn tool_rounds(
        &self,
        mut chat: ChatRequest,
        server: &str,
        credentials: &Value,
        mut result: ExecutionResult,
        sink: &dyn EventSink,
    ) -> ResultEnvelope {
        for round in 0..self.config.max_rounds {
            self.logger
                .debug(&format!("[loop] tool round {}", round + 1));

            let reply = match self.provider.send(&chat).await {
                Ok(reply) => reply,
                Err(err) => {
                    self.logger
                        .error(&format!("[loop] tool round call failed: {}", err));
                    return ResultEnvelope::failure(Some(result), err.as_error_value());
                }
            };
            result.absorb(&reply);
            result.output_type = reply.output_type();

            // Tool calls win over any text in the same reply; a Gemini
            // round can carry both text and functionCall parts
            if reply.output_type() == OutputType::ToolCall {
                self.execute_calls(
                    &mut chat,
                    server,
                    credentials,
                    &mut result,
                    sink,
                    &reply.tool_calls,
                )
                .await;
                continue;
            }

            if !reply.text.is_empty() {
                for message in reply.messages() {
                    sink.emit(ProgressEvent::message(message.clone()));
                    result.messages.push(message);
                }
            }
            return ResultEnvelope::success(result);
        }

        self.logger.error(&format!(
            "[loop] round limit hit after {} rounds",
            self.config.max_rounds
        ));
        ResultEnvelope::failure(
            Some(result),
            Value::String(format!(
                "maximum tool rounds exceeded ({})",
                self.config.max_rounds
            )),
        )
    }

    /// Execute one batch of requested tool calls, recording each and
    /// appending a synthetic history turn the model reads next round
    async fn execute_calls(
        &self,
        chat: &mut ChatRequest,
        server: &str,
        credentials: &Value,
        result: &mut ExecutionResult,
        sink: &dyn EventSink,
        calls: &[ToolInvocation],
    ) {
        sink.emit(ProgressEvent::notification("Tool Calls Started"));

        for call in calls {
            sink.emit(ProgressEvent::notification(format!(
                "{} MCP server {} call initiated",
                server, call.name
            )));

            let output = self
                .dispatcher
                .execute(server, credentials, &call.name, call.arguments.clone())
                .await;

            sink.emit(ProgressEvent::notification(format!(
                "{} MCP server {} call result: {}",
                server, call.name, output
            )));

            chat.chat_history.push(ChatMessage {
                role: self.provider.history_role(),
                content: format!(
                    "Calling tool: {} with arguments: {} and result: {}",
                    call.name, call.arguments, output
                ),
            });

            result.executed_tool_calls.push(ExecutedToolCall {
                id: call.id.clone(),
                name: call.name.clone(),
                arguments: call.arguments.clone(),
                result: output,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::endpoint::{EndpointRegistry, StaticEndpoint, ToolDescriptor};
    use crate::events::{CollectingSink, EventAction};
    use crate::logging::NoOpLogger;
    use crate::providers::{MockProvider, ProviderError, ProviderResult};
    use crate::types::{LlmResponse, MessageRole, OutputType, TokenUsage, ToolDefinition};
    use crate::validation::ClientKind;

    fn catalog() -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new("send_message", "Send a message to a channel"),
            ToolDefinition::new("list_channels", "List channels"),
        ]
    }

    fn validated(catalog: Vec<ToolDefinition>) -> ValidatedPayload {
        ValidatedPayload {
            client: ClientKind::OpenAi,
            server: "SLACK".to_string(),
            servers: vec!["SLACK".to_string()],
            credentials: json!({ "SLACK": { "slack_bot_token": "xoxb-1" } }),
            request: ChatRequest::new("post an update to #dev", "You are a Slack assistant")
                .with_api_key("key")
                .with_chat_model("gpt-4o-mini"),
            catalog,
        }
    }

    fn slack_endpoint() -> StaticEndpoint {
        StaticEndpoint::new()
            .with_tool(ToolDescriptor::new("send_message"))
            .with_result("send_message", json!({"ts": "123.456", "ok": true}))
    }

    fn loop_with(
        script: Vec<ProviderResult<LlmResponse>>,
        endpoint: StaticEndpoint,
        max_rounds: u32,
    ) -> (ConversationLoop, Arc<MockProvider>) {
        let logger: SharedLogger = Arc::new(NoOpLogger::new());
        let provider = Arc::new(MockProvider::scripted(script, logger.clone()));
        let registry = Arc::new(EndpointRegistry::new().with_endpoint(
            "SLACK",
            Arc::new(endpoint) as Arc<dyn crate::endpoint::ToolEndpoint>,
        ));
        let dispatcher = ToolDispatcher::new(registry, logger.clone());
        let config = EngineConfig::default().with_max_rounds(max_rounds);
        (
            ConversationLoop::new(provider.clone(), dispatcher, config, logger),
            provider,
        )
    }

    fn classify_reply(flag: &str, tools: &str) -> LlmResponse {
        MockProvider::text_response(
            format!(
                "<function_call>{flag}</function_call><selected_tools>{tools}</selected_tools>"
            ),
            TokenUsage::new(50, 40, 10),
        )
    }

    #[tokio::test]
    async fn test_direct_answer_path() {
        let (conversation, provider) = loop_with(
            vec![
                Ok(classify_reply("FALSE", "none")),
                Ok(MockProvider::text_response(
                    "I can send messages and list channels.",
                    TokenUsage::new(30, 20, 10),
                )),
            ],
            slack_endpoint(),
            8,
        );
        let sink = CollectingSink::new();

        let envelope = conversation.run(validated(catalog()), &sink).await;

        assert!(envelope.status);
        let data = envelope.data.unwrap();
        assert_eq!(data.total_llm_calls, 2);
        assert_eq!(data.total_tokens, 80);
        assert_eq!(data.output_type, OutputType::Text);
        assert_eq!(data.messages, vec!["I can send messages and list channels."]);
        assert!(data.executed_tool_calls.is_empty());

        // The follow-up call carries summaries in the prompt, never
        // structured declarations
        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[1].tools.is_empty());
        assert!(requests[1].prompt.starts_with("You are a Slack assistant"));
        assert!(requests[1].prompt.contains("Available tools:"));
        assert!(requests[1].prompt.contains("send_message"));

        let actions: Vec<_> = sink.events().iter().map(|e| e.action).collect();
        assert_eq!(actions, vec![EventAction::Notification, EventAction::Message]);
    }

    #[tokio::test]
    async fn test_tool_call_path() {
        let (conversation, provider) = loop_with(
            vec![
                Ok(classify_reply("TRUE", "send_message")),
                Ok(MockProvider::tool_call_response(
                    vec![ToolInvocation::new(
                        "send_message",
                        json!({"channel": "#dev", "text": "update"}),
                    )
                    .with_id("call_1")],
                    TokenUsage::new(60, 50, 10),
                )),
                Ok(MockProvider::text_response(
                    "Posted the update to #dev.",
                    TokenUsage::new(40, 30, 10),
                )),
            ],
            slack_endpoint(),
            8,
        );
        let sink = CollectingSink::new();

        let envelope = conversation.run(validated(catalog()), &sink).await;

        assert!(envelope.status);
        let data = envelope.data.unwrap();
        assert_eq!(data.total_llm_calls, 3);
        assert_eq!(data.total_tokens, 150);
        assert_eq!(data.output_type, OutputType::Text);
        assert_eq!(data.executed_tool_calls.len(), 1);
        assert_eq!(data.executed_tool_calls[0].name, "send_message");
        assert_eq!(data.executed_tool_calls[0].id.as_deref(), Some("call_1"));
        assert_eq!(data.executed_tool_calls[0].result["ok"], true);

        // Tool round requests carry only the selected schema
        let requests = provider.requests();
        assert!(requests[0].tools.is_empty());
        assert_eq!(requests[1].tools.len(), 1);
        assert_eq!(requests[1].tools[0].name(), "send_message");
        assert_eq!(requests[1].prompt, "You are a Slack assistant");

        // The tool result was fed back as a synthetic history turn
        let history = &requests[2].chat_history;
        let turn = history.last().unwrap();
        assert_eq!(turn.role, MessageRole::Assistant);
        assert!(turn.content.starts_with("Calling tool: send_message with arguments:"));
        assert!(turn.content.contains("and result:"));
        assert!(turn.content.contains("123.456"));

        let notifications: Vec<String> = sink
            .events()
            .iter()
            .filter(|e| e.action == EventAction::Notification)
            .map(|e| e.data.as_str().unwrap_or_default().to_string())
            .collect();
        assert!(notifications.contains(&"Tool Calls Started".to_string()));
        assert!(notifications
            .iter()
            .any(|n| n == "SLACK MCP server send_message call initiated"));
        assert!(notifications
            .iter()
            .any(|n| n.starts_with("SLACK MCP server send_message call result:")));
    }

    #[tokio::test]
    async fn test_mixed_reply_executes_tool_calls() {
        // Gemini rounds can carry text and functionCall parts together;
        // the tool calls win and the text is not a terminal answer
        let mixed = LlmResponse {
            text: "Let me post that for you.".to_string(),
            tool_calls: vec![ToolInvocation::new(
                "send_message",
                json!({"channel": "#dev", "text": "update"}),
            )],
            usage: TokenUsage::new(30, 25, 5),
            raw: json!({"mock": true, "kind": "mixed"}),
        };
        let (conversation, _) = loop_with(
            vec![
                Ok(classify_reply("TRUE", "send_message")),
                Ok(mixed),
                Ok(MockProvider::text_response("Posted.", TokenUsage::new(10, 8, 2))),
            ],
            slack_endpoint(),
            8,
        );
        let sink = CollectingSink::new();

        let envelope = conversation.run(validated(catalog()), &sink).await;

        assert!(envelope.status);
        let data = envelope.data.unwrap();
        assert_eq!(data.executed_tool_calls.len(), 1);
        assert_eq!(data.executed_tool_calls[0].name, "send_message");
        assert_eq!(data.output_type, OutputType::Text);
        assert_eq!(data.messages, vec!["Posted."]);
    }

    #[tokio::test]
    async fn test_round_limit_terminates() {
        let endless_call = || {
            Ok(MockProvider::tool_call_response(
                vec![ToolInvocation::new("send_message", json!({}))],
                TokenUsage::new(10, 8, 2),
            ))
        };
        let (conversation, _) = loop_with(
            vec![
                Ok(classify_reply("TRUE", "send_message")),
                endless_call(),
                endless_call(),
                endless_call(),
            ],
            slack_endpoint(),
            2,
        );
        let sink = CollectingSink::new();

        let envelope = conversation.run(validated(catalog()), &sink).await;

        assert!(!envelope.status);
        assert_eq!(
            envelope.error.unwrap(),
            json!("maximum tool rounds exceeded (2)")
        );
        // Partial totals survive: classification plus two bounded rounds
        let data = envelope.data.unwrap();
        assert_eq!(data.total_llm_calls, 3);
        assert_eq!(data.executed_tool_calls.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_tool_call_feeds_error_back() {
        let endpoint = StaticEndpoint::new().with_failure("send_message", "channel_not_found");
        let (conversation, provider) = loop_with(
            vec![
                Ok(classify_reply("TRUE", "send_message")),
                Ok(MockProvider::tool_call_response(
                    vec![ToolInvocation::new("send_message", json!({"channel": "#gone"}))],
                    TokenUsage::new(20, 15, 5),
                )),
                Ok(MockProvider::text_response(
                    "That channel does not exist.",
                    TokenUsage::new(15, 10, 5),
                )),
            ],
            endpoint,
            8,
        );
        let sink = CollectingSink::new();

        let envelope = conversation.run(validated(catalog()), &sink).await;

        // The tool failure is data, not a request failure
        assert!(envelope.status);
        let data = envelope.data.unwrap();
        let executed = &data.executed_tool_calls[0];
        let recorded = executed.result.as_str().unwrap();
        assert!(recorded.contains("Error executing tool 'send_message'"));
        assert!(recorded.contains("channel_not_found"));

        // And the model saw it in history before answering
        let history = &provider.requests()[2].chat_history;
        assert!(history.last().unwrap().content.contains("channel_not_found"));
        assert_eq!(data.messages, vec!["That channel does not exist."]);
    }

    #[tokio::test]
    async fn test_classification_failure_reports_zero_calls() {
        let (conversation, _) = loop_with(
            vec![Err(ProviderError::api(
                "openai",
                401,
                json!({"error": {"message": "bad key"}}),
            ))],
            slack_endpoint(),
            8,
        );
        let sink = CollectingSink::new();

        let envelope = conversation.run(validated(catalog()), &sink).await;

        assert!(!envelope.status);
        assert_eq!(envelope.error.unwrap()["error"]["message"], "bad key");
        assert_eq!(envelope.data.unwrap().total_llm_calls, 0);
        assert!(sink.events().is_empty());
    }

    #[tokio::test]
    async fn test_fallback_tool_calls_still_executed() {
        // Classifier says FALSE but the direct answer comes back as a tool
        // call anyway
        let (conversation, _) = loop_with(
            vec![
                Ok(classify_reply("FALSE", "send_message")),
                Ok(MockProvider::tool_call_response(
                    vec![ToolInvocation::new("send_message", json!({"channel": "#dev"}))],
                    TokenUsage::new(25, 20, 5),
                )),
                Ok(MockProvider::text_response("Done.", TokenUsage::new(10, 8, 2))),
            ],
            slack_endpoint(),
            8,
        );
        let sink = CollectingSink::new();

        let envelope = conversation.run(validated(catalog()), &sink).await;

        assert!(envelope.status);
        let data = envelope.data.unwrap();
        assert_eq!(data.executed_tool_calls.len(), 1);
        assert_eq!(data.total_llm_calls, 3);
        assert_eq!(data.messages, vec!["Done."]);
    }

    #[tokio::test]
    async fn test_deterministic_replay() {
        let script = || {
            vec![
                Ok(classify_reply("TRUE", "send_message")),
                Ok(MockProvider::tool_call_response(
                    vec![ToolInvocation::new("send_message", json!({"channel": "#dev"}))],
                    TokenUsage::new(60, 50, 10),
                )),
                Ok(MockProvider::text_response("Posted.", TokenUsage::new(40, 30, 10))),
            ]
        };

        let (first_loop, _) = loop_with(script(), slack_endpoint(), 8);
        let (second_loop, _) = loop_with(script(), slack_endpoint(), 8);

        let first = first_loop
            .run(validated(catalog()), &CollectingSink::new())
            .await;
        let second = second_loop
            .run(validated(catalog()), &CollectingSink::new())
            .await;

        assert_eq!(
            serde_json::to_value(&first).unwrap(),
            serde_json::to_value(&second).unwrap()
        );
    }
}
