//! Request validation and tool discovery
//!
//! Checks an incoming execution payload against the endpoint registry and
//! resolves the selected backend, then discovers the full tool catalog of
//! the target server. Everything downstream works with the validated form.

use thiserror::Error;

use crate::endpoint::{EndpointError, EndpointRegistry};
use crate::types::{empty_object_schema, ChatRequest, ExecutionPayload, ToolDefinition};

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Unknown tool server: {0}")]
    UnknownServer(String),

    #[error("Unknown client selector: {0}")]
    UnknownClient(String),

    #[error("Tool discovery failed for {server}: {source}")]
    Discovery {
        server: String,
        source: EndpointError,
    },
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// The LLM backend family a request targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientKind {
    OpenAi,
    AzureOpenAi,
    Gemini,
}

impl ClientKind {
    /// Resolve a request's client selector string
    pub fn parse(selector: &str) -> ValidationResult<Self> {
        match selector {
            "MCP_CLIENT_OPENAI" => Ok(Self::OpenAi),
            "MCP_CLIENT_AZURE_AI" => Ok(Self::AzureOpenAi),
            "MCP_CLIENT_GEMINI" => Ok(Self::Gemini),
            other => Err(ValidationError::UnknownClient(other.to_string())),
        }
    }
}

/// A payload that passed validation, with the discovered tool catalog
#[derive(Debug)]
pub struct ValidatedPayload {
    pub client: ClientKind,
    /// The server the conversation targets (first selected)
    pub server: String,
    pub servers: Vec<String>,
    pub credentials: serde_json::Value,
    pub request: ChatRequest,
    /// Every tool the target server advertises
    pub catalog: Vec<ToolDefinition>,
}

/// Validate a payload against the registry and discover the target
/// server's tools.
pub async fn validate_payload(
    payload: ExecutionPayload,
    registry: &EndpointRegistry,
) -> ValidationResult<ValidatedPayload> {
    if payload.client_details.input.trim().is_empty() {
        return Err(ValidationError::InvalidPayload(
            "input must not be empty".to_string(),
        ));
    }

    let client = ClientKind::parse(&payload.selected_client)?;

    let server = payload
        .selected_servers
        .first()
        .cloned()
        .ok_or_else(|| {
            ValidationError::InvalidPayload("no tool server selected".to_string())
        })?;

    for name in &payload.selected_servers {
        if !registry.contains(name) {
            return Err(ValidationError::UnknownServer(name.clone()));
        }
    }

    let endpoint = registry
        .get(&server)
        .ok_or_else(|| ValidationError::UnknownServer(server.clone()))?;

    let descriptors = endpoint
        .list_tools()
        .await
        .map_err(|source| ValidationError::Discovery {
            server: server.clone(),
            source,
        })?;

    let catalog = descriptors
        .into_iter()
        .map(|descriptor| {
            let description = descriptor
                .description
                .unwrap_or_else(|| format!("Tool for {}", descriptor.name));
            let schema = descriptor
                .input_schema
                .unwrap_or_else(empty_object_schema);
            ToolDefinition::new(descriptor.name, description).with_parameters(schema)
        })
        .collect();

    Ok(ValidatedPayload {
        client,
        server,
        servers: payload.selected_servers,
        credentials: payload.selected_server_credentials,
        request: payload.client_details,
        catalog,
    })
}
