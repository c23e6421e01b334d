//! LLM provider adapters
//!
//! One adapter per backend family, all behind the [`Provider`] trait:
//! translate the canonical [`crate::types::ChatRequest`] into the backend's
//! wire format, perform the call, and normalize the response into the
//! canonical [`crate::types::LlmResponse`]. The conversation loop is
//! written once against the trait and instantiated per backend.

mod azure;
mod error;
mod gemini;
mod mock;
mod openai;
mod traits;

pub use error::{ProviderError, ProviderResult};
pub use traits::{Provider, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};

pub use azure::AzureOpenAiProvider;
pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;

// Mock provider for testing
pub use mock::MockProvider;
