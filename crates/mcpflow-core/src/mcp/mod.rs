//! MCP (Model Context Protocol) integration
//!
//! Production [`crate::endpoint::ToolEndpoint`] implementation plus the
//! startup helper that connects every configured server into an
//! [`EndpointRegistry`].

mod client;

pub use client::McpClient;

use std::sync::Arc;

use crate::config::{ServerEntry, ServerTransport};
use crate::endpoint::EndpointRegistry;
use crate::logging::SharedLogger;

/// Connect all configured tool-provider servers.
///
/// A server that fails to connect is logged and skipped; the rest of the
/// registry still comes up.
pub async fn connect_all(entries: &[ServerEntry], logger: SharedLogger) -> EndpointRegistry {
    let mut registry = EndpointRegistry::new();

    for entry in entries {
        let connected = match &entry.transport {
            ServerTransport::Http { url } => McpClient::connect_http(url, logger.clone()).await,
            #[cfg(unix)]
            ServerTransport::Unix { socket_path } => {
                McpClient::connect_unix(socket_path, logger.clone()).await
            }
            #[cfg(not(unix))]
            ServerTransport::Unix { .. } => {
                logger.error(&format!(
                    "[mcp] {}: Unix socket transport unavailable on this platform",
                    entry.server_name
                ));
                continue;
            }
        };

        match connected {
            Ok(client) => {
                logger.info(&format!("[mcp] {} connected", entry.server_name));
                registry = registry.with_endpoint(entry.server_name.clone(), Arc::new(client));
            }
            Err(err) => {
                logger.error(&format!(
                    "[mcp] {} connection error: {}",
                    entry.server_name, err
                ));
            }
        }
    }

    registry
}
