//! Handler signatures, evaluation outcomes and error definitions.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::context::ExecutionContext;
use crate::tree::token::DispatchKey;

/// Result returned by every leaf handler.
pub type HandlerResult = Result<Value, HandlerError>;

/// Handler receiving the whole execution context.
pub type ContextFn = Arc<dyn Fn(&ExecutionContext) -> HandlerResult + Send + Sync>;

/// Handler receiving only the raw request fields.
pub type DataFn = Arc<dyn Fn(&Map<String, Value>) -> HandlerResult + Send + Sync>;

/// The callable stored on a leaf node.
#[derive(Clone)]
pub enum Handler {
    Context(ContextFn),
    Data(DataFn),
}

impl Handler {
    /// Label used by the tree renderer and in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Handler::Context(_) => "ContextHandler",
            Handler::Data(_) => "DataHandler",
        }
    }

    pub(crate) fn invoke(&self, ctx: &ExecutionContext) -> HandlerResult {
        match self {
            Handler::Context(f) => f(ctx),
            Handler::Data(f) => f(ctx.data()),
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}

/// Errors raised by leaf handlers.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// A request field was missing or had the wrong shape.
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// The handler ran but could not produce a result.
    #[error("Handler failed: {0}")]
    Failed(String),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HandlerError {
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Result of walking the tree for one request.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A leaf was reached and its handler returned this value.
    Matched(Value),
    /// No child accepted the request at some node.
    NoBranch(NoBranch),
}

impl Outcome {
    pub fn is_matched(&self) -> bool {
        matches!(self, Outcome::Matched(_))
    }

    /// Convert into a plain `Result`, treating a missing branch as the error.
    pub fn into_result(self) -> Result<Value, NoBranch> {
        match self {
            Outcome::Matched(value) => Ok(value),
            Outcome::NoBranch(diagnostic) => Err(diagnostic),
        }
    }
}

/// Diagnostic describing the node at which evaluation stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoBranch {
    /// Discriminator field of the failing node.
    pub field: String,
    /// Canonical token that was looked up.
    pub token: DispatchKey,
    /// Literal keys accepted at the node, in registration order.
    pub supported: Vec<String>,
    /// Optional field names accepted at the node, in registration order.
    pub optional: Vec<String>,
}

impl NoBranch {
    /// All acceptable values, literal keys first, optional keys marked.
    pub fn supported_values(&self) -> Vec<String> {
        self.supported
            .iter()
            .cloned()
            .chain(self.optional.iter().map(|key| format!("{} (optional)", key)))
            .collect()
    }
}

impl fmt::Display for NoBranch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values = self.supported_values();
        let list = if values.is_empty() {
            "none".to_string()
        } else {
            values.join(", ")
        };
        write!(
            f,
            "Invalid value '{}' for key '{}'. Supported values: [{}]",
            self.token, self.field, list
        )
    }
}

impl std::error::Error for NoBranch {}
