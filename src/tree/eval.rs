//! Tree evaluation.
//!
//! # Selection Order (per internal node)
//! 1. Canonical token of the discriminator field, looked up directly
//!    (skipped when the field is absent, `null` or `""`)
//! 2. First optional field, in registration order, that is present
//! 3. The wildcard child
//! 4. Otherwise stop with [`Outcome::NoBranch`]
//!
//! # Design Decisions
//! - No state is written to the tree; the diagnostic travels in the result
//! - The evaluator never blocks; suspension only happens inside handlers
//! - Exactly one handler runs per call

use serde_json::{Map, Value};

use crate::context::ExecutionContext;
use crate::tree::node::DispatchNode;
use crate::tree::token::{is_present, DispatchKey};
use crate::tree::types::{HandlerError, NoBranch, Outcome};

/// Walk `root` for the request carried by `ctx` and run the selected leaf.
pub fn evaluate(root: &DispatchNode, ctx: &ExecutionContext) -> Result<Outcome, HandlerError> {
    let mut current = root;
    let mut depth = 0usize;

    let handler = loop {
        if let Some(handler) = current.handler() {
            break handler;
        }
        match select_child(current, ctx.data()) {
            Ok((key, next)) => {
                tracing::debug!(
                    context_id = %ctx.id(),
                    field = %current.field(),
                    key = %key,
                    depth,
                    "Descending"
                );
                current = next;
                depth += 1;
            }
            Err(diagnostic) => {
                tracing::warn!(
                    context_id = %ctx.id(),
                    field = %diagnostic.field,
                    token = %diagnostic.token,
                    depth,
                    "No branch matched"
                );
                return Ok(Outcome::NoBranch(diagnostic));
            }
        }
    };

    tracing::debug!(
        context_id = %ctx.id(),
        handler = handler.kind(),
        depth,
        "Invoking leaf handler"
    );
    handler.invoke(ctx).map(Outcome::Matched)
}

fn select_child<'a>(
    node: &'a DispatchNode,
    data: &Map<String, Value>,
) -> Result<(DispatchKey, &'a DispatchNode), NoBranch> {
    let raw = if node.field().is_empty() {
        None
    } else {
        data.get(node.field())
    };
    let token = DispatchKey::canonicalize(raw);

    // An explicit "*" is looked up like any other key; only a missing
    // token skips straight to the optional scan.
    if is_present(raw) {
        if let Some(child) = node.child(&token) {
            return Ok((token, child));
        }
    }

    for name in node.optional_fields() {
        if !is_present(data.get(name)) {
            continue;
        }
        let key = DispatchKey::from(name.as_str());
        if let Some(child) = node.child(&key) {
            return Ok((key, child));
        }
    }

    if let Some(child) = node.child(&DispatchKey::Wildcard) {
        return Ok((DispatchKey::Wildcard, child));
    }

    Err(diagnose(node, token))
}

fn diagnose(node: &DispatchNode, token: DispatchKey) -> NoBranch {
    let supported = node
        .children()
        .filter(|(key, _)| !key.is_wildcard() && !node.is_optional(key))
        .map(|(key, _)| key.to_string())
        .collect();

    NoBranch {
        field: node.field().to_string(),
        token,
        supported,
        optional: node.optional_fields().to_vec(),
    }
}

impl DispatchNode {
    /// Evaluate this node as the root of a tree.
    pub fn evaluate(&self, ctx: &ExecutionContext) -> Result<Outcome, HandlerError> {
        evaluate(self, ctx)
    }
}
