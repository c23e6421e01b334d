//! Tool dispatch
//!
//! Routes a model-requested tool call to the right endpoint, injecting the
//! server's credentials into the arguments first. Execution failures are
//! returned as data so the conversation loop can feed them back to the
//! model instead of aborting the whole request.

mod credentials;

pub use credentials::{shape_credentials, CredentialShaper};

use std::sync::Arc;

use serde_json::Value;

use crate::endpoint::EndpointRegistry;
use crate::logging::SharedLogger;

/// Executes tool calls against registered endpoints
pub struct ToolDispatcher {
    registry: Arc<EndpointRegistry>,
    logger: SharedLogger,
}

impl ToolDispatcher {
    pub fn new(registry: Arc<EndpointRegistry>, logger: SharedLogger) -> Self {
        Self { registry, logger }
    }

    /// Execute one tool call.
    ///
    /// `credentials` is the full per-server credential map from the request;
    /// only the slice for `server` is injected. Always returns a value:
    /// unknown servers and failed calls produce an error string the model
    /// can read.
    pub async fn execute(
        &self,
        server: &str,
        credentials: &Value,
        tool: &str,
        mut arguments: Value,
    ) -> Value {
        let Some(endpoint) = self.registry.get(server) else {
            self.logger
                .error(&format!("[dispatch] unknown server: {}", server));
            return Value::String(format!("Error: unknown tool server '{}'", server));
        };

        let bundle = credentials.get(server).cloned().unwrap_or(Value::Null);
        shape_credentials(server, &mut arguments, &bundle);

        self.logger
            .debug(&format!("[dispatch] {} -> {}", server, tool));

        match endpoint.call_tool(tool, arguments).await {
            Ok(result) => result,
            Err(err) => {
                self.logger
                    .error(&format!("[dispatch] {} {} failed: {}", server, tool, err));
                Value::String(format!("Error executing tool '{}': {}", tool, err))
            }
        }
    }
}
