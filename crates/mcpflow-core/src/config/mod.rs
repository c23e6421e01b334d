//! Engine configuration
//!
//! Loadable from a JSON file or built in code; every field has a default so
//! an empty config object is valid.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Errors that can occur while loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

fn default_max_rounds() -> u32 {
    8
}

/// Engine-wide settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Upper bound on tool rounds per request. A model that keeps asking
    /// for tools past this terminates the request with a round-limit error
    /// instead of looping forever.
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,

    /// Per-call transport timeout for LLM backend requests, in seconds.
    /// `None` leaves the HTTP client default in place. The conversation as
    /// a whole is never timed out.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// Tool-provider servers to connect at startup
    #[serde(default)]
    pub servers: Vec<ServerEntry>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_rounds: default_max_rounds(),
            request_timeout_secs: None,
            servers: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Set the round limit
    pub fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = max_rounds;
        self
    }
}

/// One tool-provider server to connect to at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerEntry {
    /// Registry key, e.g. "SLACK"
    pub server_name: String,
    /// How to reach the server
    pub transport: ServerTransport,
}

/// Transport used to reach a tool-provider server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerTransport {
    /// MCP streamable HTTP
    Http { url: String },
    /// MCP over a Unix domain socket
    Unix { socket_path: PathBuf },
}
