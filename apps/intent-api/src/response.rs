//! Request and response bodies of `POST /v1/intents/execute`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use tally_core::{Entities, ExecutionContext};

/// Incoming intent. `intent` stays a string so unknown names reach the
/// router instead of failing deserialization.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecuteRequest {
    pub intent: String,
    #[serde(default)]
    pub entities: Entities,
    pub context: ExecutionContext,
}

/// Envelope returned for every request, success or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    pub execution_time_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecuteResponse {
    pub fn success(message: impl Into<String>, data: Option<Value>) -> Self {
        ExecuteResponse {
            success: true,
            message: message.into(),
            data,
            execution_time_ms: 0,
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>, code: impl Into<String>) -> Self {
        ExecuteResponse {
            success: false,
            message: message.into(),
            data: None,
            execution_time_ms: 0,
            error: Some(code.into()),
        }
    }

    pub fn with_elapsed_ms(mut self, elapsed_ms: u64) -> Self {
        self.execution_time_ms = elapsed_ms;
        self
    }
}
