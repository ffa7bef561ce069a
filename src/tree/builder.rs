//! Fluent construction of dispatch trees.
//!
//! ```
//! use dispatch_tree::tree::TreeBuilder;
//! use serde_json::json;
//!
//! let tree = TreeBuilder::new()
//!     .field("type")
//!     .leaf("a", |_ctx| Ok(json!("A")))
//!     .leaf_data("b", |_data| Ok(json!("B")))
//!     .optional("verbose", |_ctx| Ok(json!("V")))
//!     .default_leaf(|_ctx| Ok(json!("D")))
//!     .build();
//!
//! assert_eq!(tree.leaf_count(), 4);
//! ```
//!
//! The builder performs no validation. Registering the same key twice
//! replaces the earlier child; setting a handler on a node that also has
//! children makes the handler win at evaluation time.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::context::ExecutionContext;
use crate::tree::node::DispatchNode;
use crate::tree::token::DispatchKey;
use crate::tree::types::{Handler, HandlerResult};

/// Builder for a single node and, through nested builders, its subtree.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    root: DispatchNode,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the field this node discriminates on.
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.root.set_field(name.into());
        self
    }

    /// Register a context-handler leaf under `key`.
    pub fn leaf<K, F>(self, key: K, handler: F) -> Self
    where
        K: Into<DispatchKey>,
        F: Fn(&ExecutionContext) -> HandlerResult + Send + Sync + 'static,
    {
        self.attach(key.into(), leaf_node(Handler::Context(Arc::new(handler))))
    }

    /// Register a data-handler leaf under `key`.
    pub fn leaf_data<K, F>(self, key: K, handler: F) -> Self
    where
        K: Into<DispatchKey>,
        F: Fn(&Map<String, Value>) -> HandlerResult + Send + Sync + 'static,
    {
        self.attach(key.into(), leaf_node(Handler::Data(Arc::new(handler))))
    }

    pub fn default_leaf<F>(self, handler: F) -> Self
    where
        F: Fn(&ExecutionContext) -> HandlerResult + Send + Sync + 'static,
    {
        self.leaf(DispatchKey::Wildcard, handler)
    }

    pub fn default_leaf_data<F>(self, handler: F) -> Self
    where
        F: Fn(&Map<String, Value>) -> HandlerResult + Send + Sync + 'static,
    {
        self.leaf_data(DispatchKey::Wildcard, handler)
    }

    /// Register a leaf selected by the presence of field `name`.
    pub fn optional<F>(mut self, name: &str, handler: F) -> Self
    where
        F: Fn(&ExecutionContext) -> HandlerResult + Send + Sync + 'static,
    {
        self.root.mark_optional(name);
        self.leaf(name, handler)
    }

    pub fn optional_data<F>(mut self, name: &str, handler: F) -> Self
    where
        F: Fn(&Map<String, Value>) -> HandlerResult + Send + Sync + 'static,
    {
        self.root.mark_optional(name);
        self.leaf_data(name, handler)
    }

    /// Nest a subtree under `key`.
    pub fn branch<K: Into<DispatchKey>>(self, key: K, builder: TreeBuilder) -> Self {
        self.attach(key.into(), builder.build())
    }

    pub fn default_branch(self, builder: TreeBuilder) -> Self {
        self.branch(DispatchKey::Wildcard, builder)
    }

    /// Make this node itself a leaf.
    pub fn handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&ExecutionContext) -> HandlerResult + Send + Sync + 'static,
    {
        self.root.set_handler(Handler::Context(Arc::new(handler)));
        self
    }

    pub fn handler_data<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Map<String, Value>) -> HandlerResult + Send + Sync + 'static,
    {
        self.root.set_handler(Handler::Data(Arc::new(handler)));
        self
    }

    pub fn build(self) -> DispatchNode {
        self.root
    }

    fn attach(mut self, key: DispatchKey, node: DispatchNode) -> Self {
        self.root.insert_child(key, node);
        self
    }
}

fn leaf_node(handler: Handler) -> DispatchNode {
    let mut node = DispatchNode::new();
    node.set_handler(handler);
    node
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builds_leaves_and_kinds() {
        let tree = TreeBuilder::new()
            .field("type")
            .leaf("a", |_| Ok(json!("A")))
            .leaf_data("b", |_| Ok(json!("B")))
            .default_leaf_data(|_| Ok(json!("D")))
            .build();

        assert_eq!(tree.field(), "type");
        assert!(!tree.is_leaf());
        assert_eq!(tree.child(&"a".into()).unwrap().handler().unwrap().kind(), "ContextHandler");
        assert_eq!(tree.child(&"b".into()).unwrap().handler().unwrap().kind(), "DataHandler");
        assert!(tree.child(&DispatchKey::Wildcard).unwrap().is_leaf());
    }

    #[test]
    fn test_star_literal_is_default() {
        let tree = TreeBuilder::new()
            .field("type")
            .leaf("*", |_| Ok(json!("D")))
            .build();
        assert!(tree.child(&DispatchKey::Wildcard).is_some());
    }

    #[test]
    fn test_non_string_keys() {
        let tree = TreeBuilder::new()
            .field("count")
            .leaf(2, |_| Ok(json!("two")))
            .leaf(true, |_| Ok(json!("yes")))
            .leaf(4.0, |_| Ok(json!("four")))
            .build();

        assert!(tree.child(&DispatchKey::Int(2)).is_some());
        assert!(tree.child(&DispatchKey::Bool(true)).is_some());
        assert!(tree.child(&DispatchKey::Int(4)).is_some());
    }

    #[test]
    fn test_optional_registers_child_and_order() {
        let tree = TreeBuilder::new()
            .field("mode")
            .optional("verbose", |_| Ok(json!("V")))
            .optional_data("quiet", |_| Ok(json!("Q")))
            .build();

        assert_eq!(tree.optional_fields(), &["verbose".to_string(), "quiet".to_string()]);
        assert!(tree.child(&"verbose".into()).is_some());
        assert!(tree.child(&"quiet".into()).is_some());
    }

    #[test]
    fn test_nested_branches() {
        let tree = TreeBuilder::new()
            .field("kind")
            .branch(
                "shape",
                TreeBuilder::new()
                    .field("shape")
                    .leaf("circle", |_| Ok(json!("circle")))
                    .default_branch(
                        TreeBuilder::new()
                            .field("sides")
                            .leaf(3, |_| Ok(json!("triangle"))),
                    ),
            )
            .build();

        let shape = tree.child(&"shape".into()).unwrap();
        assert_eq!(shape.field(), "shape");
        let polygon = shape.child(&DispatchKey::Wildcard).unwrap();
        assert_eq!(polygon.field(), "sides");
        assert_eq!(tree.depth(), 3);
    }

    #[test]
    fn test_handler_on_internal_node_is_kept() {
        let tree = TreeBuilder::new()
            .field("type")
            .leaf("a", |_| Ok(json!("A")))
            .handler(|_| Ok(json!("root")))
            .build();

        assert!(tree.is_leaf());
        assert_eq!(tree.children().count(), 1);
    }
}
