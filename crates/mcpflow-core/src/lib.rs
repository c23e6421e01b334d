//! # mcpflow-core
//!
//! Tool-use orchestration over MCP tool providers.
//!
//! An [`Engine`] takes an execution payload (which backend, which tool
//! servers, per-server credentials, and the chat request), classifies the
//! request with one cheap tools-stripped call, and then either answers
//! directly or iterates bounded tool rounds: the model requests tool
//! calls, the dispatcher executes them against the matching MCP endpoint
//! with credentials injected, and results are fed back as history turns
//! until the model answers in text.
//!
//! Three backend families are supported behind the [`Provider`] trait:
//! OpenAI, Azure OpenAI, and Gemini. Progress is pushed through an
//! [`EventSink`] as structured frames; the same loop runs unobserved
//! against a [`NullSink`] in non-streaming mode.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use mcpflow_core::{
//!     connect_all, ChannelSink, Engine, EngineConfig, ExecutionPayload, NoOpLogger,
//! };
//!
//! # async fn run(payload: ExecutionPayload) -> Result<(), Box<dyn std::error::Error>> {
//! let logger = Arc::new(NoOpLogger::new());
//! let config = EngineConfig::from_json_file("mcpflow.json")?;
//!
//! let registry = Arc::new(connect_all(&config.servers, logger.clone()).await);
//! let engine = Engine::new(registry, config, logger);
//!
//! let (sink, mut events) = ChannelSink::new();
//! let envelope = engine.execute(payload, &sink).await;
//! # let _ = (envelope, events.recv().await);
//! # Ok(())
//! # }
//! ```

pub mod classifier;
pub mod config;
pub mod dispatch;
pub mod endpoint;
pub mod engine;
pub mod events;
pub mod logging;
pub mod mcp;
pub mod providers;
pub mod types;
pub mod validation;

pub use classifier::{classification_prompt, extract_classification, Classification};
pub use config::{ConfigError, EngineConfig, ServerEntry, ServerTransport};
pub use dispatch::{shape_credentials, ToolDispatcher};
pub use endpoint::{
    EndpointError, EndpointRegistry, StaticEndpoint, ToolDescriptor, ToolEndpoint,
};
pub use engine::{select_tools, ConversationLoop, Engine};
pub use events::{
    ChannelSink, CollectingSink, EventAction, EventSink, NullSink, ProgressEvent, StreamingStatus,
};
pub use logging::{ConsoleLogger, Logger, NoOpLogger, SharedLogger};
pub use mcp::{connect_all, McpClient};
pub use providers::{
    AzureOpenAiProvider, GeminiProvider, MockProvider, OpenAiProvider, Provider, ProviderError,
};
pub use types::{
    ChatMessage, ChatRequest, ExecutedToolCall, ExecutionPayload, ExecutionResult, InputType,
    LlmResponse, MessageRole, OutputType, ResultEnvelope, TokenUsage, ToolChoice, ToolDefinition,
    ToolInvocation, ToolSummary,
};
pub use validation::{validate_payload, ClientKind, ValidatedPayload, ValidationError};
