//! Provider error types

use serde_json::Value;
use thiserror::Error;

/// Errors that can occur during provider operations
///
/// A model that declines to call a tool is not an error - that is a
/// successful response with no invocations. These variants cover the
/// network call and the backend itself failing.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Missing API key
    #[error("API key is required for {provider}")]
    MissingApiKey { provider: String },

    /// Request rejected before it was sent
    #[error("invalid {provider} request: {message}")]
    InvalidRequest { provider: String, message: String },

    /// Backend returned a non-success status; `body` is the raw error body
    #[error("{provider} API error ({status}): {body}")]
    Api {
        provider: String,
        status: u16,
        body: Value,
    },

    /// Network/HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Response did not have the expected shape
    #[error("invalid response from {provider}: {message}")]
    InvalidResponse { provider: String, message: String },
}

impl ProviderError {
    /// Create a missing API key error
    pub fn missing_api_key(provider: impl Into<String>) -> Self {
        Self::MissingApiKey {
            provider: provider.into(),
        }
    }

    /// Create an invalid request error
    pub fn invalid_request(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create an API error from a raw error body
    pub fn api(provider: impl Into<String>, status: u16, body: Value) -> Self {
        Self::Api {
            provider: provider.into(),
            status,
            body,
        }
    }

    /// Create an invalid response error
    pub fn invalid_response(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// The value placed in the result envelope's `Error` field: the raw
    /// backend body when one exists, otherwise the display string
    pub fn as_error_value(&self) -> Value {
        match self {
            Self::Api { body, .. } => body.clone(),
            other => Value::String(other.to_string()),
        }
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;
