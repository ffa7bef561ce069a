//! Shared utilities for integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dispatch_tree::{ExecutionContext, HandlerError};
use serde_json::{json, Map, Value};

/// Build a field map from a JSON object literal.
#[allow(dead_code)]
pub fn data(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

/// Build a context from a JSON object literal.
#[allow(dead_code)]
pub fn context(value: Value) -> ExecutionContext {
    ExecutionContext::new(data(value))
}

/// A handler that returns its label.
#[allow(dead_code)]
pub fn labeled(
    label: &'static str,
) -> impl Fn(&ExecutionContext) -> Result<Value, HandlerError> + Send + Sync + 'static {
    move |_| Ok(json!(label))
}

/// A handler that returns its label and bumps a shared counter.
#[allow(dead_code)]
pub fn counted(
    label: &'static str,
    calls: &Arc<AtomicUsize>,
) -> impl Fn(&ExecutionContext) -> Result<Value, HandlerError> + Send + Sync + 'static {
    let calls = Arc::clone(calls);
    move |_| {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(json!(label))
    }
}
