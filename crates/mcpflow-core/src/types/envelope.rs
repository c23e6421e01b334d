//! Result envelope returned from every engine invocation

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::response::{LlmResponse, OutputType};
use super::tool::ExecutedToolCall;

/// Running totals and outputs accumulated across all rounds of one request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub total_llm_calls: u64,
    pub total_tokens: u64,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    /// Last raw backend payload
    #[serde(default)]
    pub final_llm_response: Value,
    /// History of raw backend payloads, in call order
    #[serde(default)]
    pub llm_responses_arr: Vec<Value>,
    /// Ordered text outputs
    #[serde(default)]
    pub messages: Vec<String>,
    pub output_type: OutputType,
    #[serde(default)]
    pub executed_tool_calls: Vec<ExecutedToolCall>,
}

impl ExecutionResult {
    /// Fold one successful adapter response into the running totals.
    ///
    /// Counters only ever grow; failed calls are never absorbed, so a
    /// request that dies on its first call reports zero calls.
    pub fn absorb(&mut self, response: &LlmResponse) {
        self.total_llm_calls += 1;
        self.total_tokens += response.usage.total;
        self.total_input_tokens += response.usage.input;
        self.total_output_tokens += response.usage.output;
        self.final_llm_response = response.raw.clone();
        self.llm_responses_arr.push(response.raw.clone());
    }
}

/// The outer `{Data, Error, Status}` envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultEnvelope {
    #[serde(rename = "Data")]
    pub data: Option<ExecutionResult>,
    #[serde(rename = "Error")]
    pub error: Option<Value>,
    #[serde(rename = "Status")]
    pub status: bool,
}

impl ResultEnvelope {
    /// Successful completion
    pub fn success(data: ExecutionResult) -> Self {
        Self {
            data: Some(data),
            error: None,
            status: true,
        }
    }

    /// Failure carrying whatever totals were accumulated before the error
    pub fn failure(data: Option<ExecutionResult>, error: Value) -> Self {
        Self {
            data,
            error: Some(error),
            status: false,
        }
    }
}
