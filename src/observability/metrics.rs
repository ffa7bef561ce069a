//! Metrics collection.
//!
//! # Metrics
//! - `dispatch_evaluations_total` (counter): tree evaluations by tool and outcome
//! - `dispatch_execution_duration_seconds` (histogram): end-to-end tool latency
//! - `dispatch_async_completions_total` (counter): asynchronous completions by result
//!
//! # Design Decisions
//! - Uses the `metrics` facade; without an installed recorder every call is a no-op
//! - Labels for tool and outcome only, to keep cardinality bounded

use std::time::Instant;

pub const OUTCOME_MATCHED: &str = "matched";
pub const OUTCOME_NO_BRANCH: &str = "no_branch";
pub const OUTCOME_HANDLER_ERROR: &str = "handler_error";

/// Record one tree evaluation.
pub fn record_evaluation(tool: &str, outcome: &'static str) {
    metrics::counter!(
        "dispatch_evaluations_total",
        "tool" => tool.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Record an asynchronous completion wait (`completed`, `timeout`, `abandoned`).
pub fn record_async_completion(tool: &str, result: &'static str) {
    metrics::counter!(
        "dispatch_async_completions_total",
        "tool" => tool.to_string(),
        "result" => result
    )
    .increment(1);
}

/// Record end-to-end execution latency.
pub fn record_execution(tool: &str, start: Instant) {
    metrics::histogram!(
        "dispatch_execution_duration_seconds",
        "tool" => tool.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}
