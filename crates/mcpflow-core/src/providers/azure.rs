//! Azure OpenAI provider adapter
//!
//! Same chat-completions wire format as OpenAI, but addressed per
//! deployment under the caller's resource endpoint and authenticated with
//! the `api-key` header instead of a bearer token.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::error::{ProviderError, ProviderResult};
use super::openai::{build_chat_payload, client_with_timeout, parse_chat_response, read_json_response};
use super::traits::{select_model, Provider};
use crate::logging::Logger;
use crate::types::{ChatRequest, LlmResponse};

const DEFAULT_API_VERSION: &str = "2024-02-15-preview";

/// Adapter for Azure-hosted OpenAI deployments
pub struct AzureOpenAiProvider {
    http: reqwest::Client,
    api_version: String,
    logger: Arc<dyn Logger>,
}

impl AzureOpenAiProvider {
    /// Create a new Azure OpenAI provider
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_version: DEFAULT_API_VERSION.to_string(),
            logger,
        }
    }

    /// Set a per-call transport timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http = client_with_timeout(timeout);
        self
    }

    /// Override the api-version query parameter
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Deployment URL for the request's model
    fn request_url(&self, request: &ChatRequest) -> ProviderResult<String> {
        let base = request.api_base.as_deref().ok_or_else(|| {
            ProviderError::invalid_request(self.name(), "Azure endpoint (api_base) is required")
        })?;
        Ok(format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            base.trim_end_matches('/'),
            select_model(request),
            self.api_version
        ))
    }
}

#[async_trait]
impl Provider for AzureOpenAiProvider {
    fn name(&self) -> &str {
        "azure"
    }

    async fn send(&self, request: &ChatRequest) -> ProviderResult<LlmResponse> {
        let payload = build_chat_payload(self.name(), request)?;
        let url = self.request_url(request)?;
        self.logger
            .debug(&format!("[AzureOpenAiProvider] POST {}", url));

        let response = self
            .http
            .post(url)
            .header("api-key", &request.api_key)
            .json(&payload)
            .send()
            .await?;

        let raw = read_json_response(self.name(), response).await?;
        parse_chat_response(self.name(), raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;

    fn provider() -> AzureOpenAiProvider {
        AzureOpenAiProvider::new(Arc::new(NoOpLogger::new()))
    }

    #[test]
    fn test_request_url_per_deployment() {
        let mut request = ChatRequest::new("hi", "prompt");
        request.api_key = "key".to_string();
        request.chat_model = "gpt-4o".to_string();
        request.api_base = Some("https://myresource.openai.azure.com/".to_string());

        let url = provider().request_url(&request).unwrap();
        assert_eq!(
            url,
            "https://myresource.openai.azure.com/openai/deployments/gpt-4o/chat/completions?api-version=2024-02-15-preview"
        );
    }

    #[test]
    fn test_missing_endpoint_rejected() {
        let mut request = ChatRequest::new("hi", "prompt");
        request.api_key = "key".to_string();
        request.chat_model = "gpt-4o".to_string();

        assert!(matches!(
            provider().request_url(&request),
            Err(ProviderError::InvalidRequest { .. })
        ));
    }
}
