//! Core types for the orchestration engine
//!
//! This module contains the canonical shapes shared across providers and
//! the conversation loop.

mod envelope;
mod message;
mod request;
mod response;
mod tool;

pub use envelope::{ExecutionResult, ResultEnvelope};
pub use message::{ChatMessage, InputType, MessageRole};
pub use request::{ChatRequest, ExecutionPayload};
pub use response::{LlmResponse, OutputType, TokenUsage};
pub use tool::{
    empty_object_schema, ExecutedToolCall, ToolChoice, ToolDefinition, ToolFunction,
    ToolInvocation, ToolSummary,
};
