//! Response envelopes.

use serde::Serialize;
use serde_json::Value;

use super::executor::{ServiceError, ToolExecution};

/// `{success, message, data?}` envelope wrapped around every service answer.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Response {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Response {
    pub fn success(message: impl Into<String>, data: impl Serialize) -> Self {
        let data = match serde_json::to_value(data) {
            Ok(value) => value,
            Err(e) => return Self::error(format!("Failed to serialize response: {e}")),
        };
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }

    pub fn from_execution(result: Result<ToolExecution, ServiceError>) -> Self {
        match result {
            Ok(execution) => Self::success("Tool executed successfully", execution),
            Err(e) => Self::error(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
    pub status: String,
}
