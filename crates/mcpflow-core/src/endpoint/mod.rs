//! Tool-provider capability interface
//!
//! Every tool provider is reachable through the narrow
//! `list_tools` / `call_tool` contract. The production implementation is
//! the rmcp-backed [`crate::mcp::McpClient`]; tests use [`StaticEndpoint`].
//!
//! The [`EndpointRegistry`] is built once at startup and injected wherever
//! endpoints are needed - it is never mutated afterwards, so concurrent
//! requests share it without locking.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use thiserror::Error;

/// Errors crossing the tool-provider boundary
#[derive(Error, Debug)]
pub enum EndpointError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Tool call failed: {0}")]
    ToolCallFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),
}

pub type EndpointResult<T> = Result<T, EndpointError>;

/// One tool as advertised by a provider
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: Option<String>,
    pub input_schema: Option<Value>,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            input_schema: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.input_schema = Some(schema);
        self
    }
}

/// Capability interface consumed from each tool provider
#[async_trait]
pub trait ToolEndpoint: Send + Sync {
    /// Discover the provider's tool catalog
    async fn list_tools(&self) -> EndpointResult<Vec<ToolDescriptor>>;

    /// Invoke one tool; may fail, and the dispatcher turns that failure
    /// into data rather than propagating it
    async fn call_tool(&self, name: &str, arguments: Value) -> EndpointResult<Value>;
}

/// Immutable map from server name to live endpoint
#[derive(Default)]
pub struct EndpointRegistry {
    endpoints: HashMap<String, Arc<dyn ToolEndpoint>>,
}

impl EndpointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an endpoint during construction
    pub fn with_endpoint(
        mut self,
        name: impl Into<String>,
        endpoint: Arc<dyn ToolEndpoint>,
    ) -> Self {
        self.endpoints.insert(name.into(), endpoint);
        self
    }

    /// Look up an endpoint by server name
    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolEndpoint>> {
        self.endpoints.get(name).cloned()
    }

    /// Whether a server is registered
    pub fn contains(&self, name: &str) -> bool {
        self.endpoints.contains_key(name)
    }

    /// Registered server names
    pub fn server_names(&self) -> Vec<&str> {
        self.endpoints.keys().map(String::as_str).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

/// In-memory endpoint with fixed tools and canned results, for tests and
/// wiring examples
#[derive(Default)]
pub struct StaticEndpoint {
    tools: Vec<ToolDescriptor>,
    results: HashMap<String, Value>,
    failures: HashMap<String, String>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl StaticEndpoint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advertise a tool
    pub fn with_tool(mut self, tool: ToolDescriptor) -> Self {
        self.tools.push(tool);
        self
    }

    /// Fix the result returned for a tool
    pub fn with_result(mut self, tool: impl Into<String>, result: Value) -> Self {
        self.results.insert(tool.into(), result);
        self
    }

    /// Make a tool fail with the given message
    pub fn with_failure(mut self, tool: impl Into<String>, message: impl Into<String>) -> Self {
        self.failures.insert(tool.into(), message.into());
        self
    }

    /// Every call received, in order: (tool name, shaped arguments)
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl ToolEndpoint for StaticEndpoint {
    async fn list_tools(&self) -> EndpointResult<Vec<ToolDescriptor>> {
        Ok(self.tools.clone())
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> EndpointResult<Value> {
        self.calls.lock().push((name.to_string(), arguments));

        if let Some(message) = self.failures.get(name) {
            return Err(EndpointError::ToolCallFailed(message.clone()));
        }
        match self.results.get(name) {
            Some(result) => Ok(result.clone()),
            None => Ok(json!({ "ok": true })),
        }
    }
}
