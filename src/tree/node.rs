//! Dispatch tree nodes.
//!
//! # Responsibilities
//! - Hold children in registration order with O(1) key lookup
//! - Hold the ordered list of optional pass-through fields
//! - Hold the leaf handler
//!
//! # Design Decisions
//! - Nodes are only mutated by the builder; after `build()` they are read-only
//! - A node with a handler is a leaf even if it also has children

use std::collections::HashMap;

use crate::tree::token::DispatchKey;
use crate::tree::types::Handler;

/// A node of the dispatch tree.
#[derive(Debug, Clone, Default)]
pub struct DispatchNode {
    field: String,
    children: Vec<(DispatchKey, DispatchNode)>,
    index: HashMap<DispatchKey, usize>,
    optional: Vec<String>,
    handler: Option<Handler>,
}

impl DispatchNode {
    /// Create an empty node.
    pub fn new() -> Self {
        Self::default()
    }

    /// Name of the field this node discriminates on.
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn handler(&self) -> Option<&Handler> {
        self.handler.as_ref()
    }

    pub fn is_leaf(&self) -> bool {
        self.handler.is_some()
    }

    /// Look up a child by canonical key.
    pub fn child(&self, key: &DispatchKey) -> Option<&DispatchNode> {
        self.index.get(key).map(|&i| &self.children[i].1)
    }

    /// Children in registration order.
    pub fn children(&self) -> impl Iterator<Item = (&DispatchKey, &DispatchNode)> {
        self.children.iter().map(|(key, node)| (key, node))
    }

    /// Optional field names in registration order.
    pub fn optional_fields(&self) -> &[String] {
        &self.optional
    }

    pub fn is_optional(&self, key: &DispatchKey) -> bool {
        match key {
            DispatchKey::Str(name) => self.optional.iter().any(|o| o == name),
            _ => false,
        }
    }

    /// Number of edges on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        if self.is_leaf() {
            return 0;
        }
        self.children
            .iter()
            .map(|(_, child)| child.depth() + 1)
            .max()
            .unwrap_or(0)
    }

    /// Number of leaves reachable from this node.
    pub fn leaf_count(&self) -> usize {
        if self.is_leaf() {
            return 1;
        }
        self.children.iter().map(|(_, child)| child.leaf_count()).sum()
    }

    pub(crate) fn set_field(&mut self, field: String) {
        self.field = field;
    }

    pub(crate) fn set_handler(&mut self, handler: Handler) {
        self.handler = Some(handler);
    }

    /// Insert a child, replacing any existing child under the same key in place.
    pub(crate) fn insert_child(&mut self, key: DispatchKey, node: DispatchNode) {
        match self.index.get(&key) {
            Some(&i) => self.children[i].1 = node,
            None => {
                self.index.insert(key.clone(), self.children.len());
                self.children.push((key, node));
            }
        }
    }

    pub(crate) fn mark_optional(&mut self, name: &str) {
        if !self.optional.iter().any(|o| o == name) {
            self.optional.push(name.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use serde_json::Value;

    fn leaf() -> DispatchNode {
        let mut node = DispatchNode::new();
        node.set_handler(Handler::Data(Arc::new(|_| Ok(Value::Null))));
        node
    }

    #[test]
    fn test_insert_keeps_registration_order() {
        let mut node = DispatchNode::new();
        node.insert_child("b".into(), leaf());
        node.insert_child("a".into(), leaf());
        node.insert_child(DispatchKey::Wildcard, leaf());

        let keys: Vec<String> = node.children().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, vec!["b", "a", "*"]);
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut node = DispatchNode::new();
        node.insert_child("a".into(), DispatchNode::new());
        node.insert_child("b".into(), leaf());
        node.insert_child("a".into(), leaf());

        assert_eq!(node.children().count(), 2);
        assert!(node.child(&"a".into()).unwrap().is_leaf());
        let keys: Vec<String> = node.children().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_optional_marked_once() {
        let mut node = DispatchNode::new();
        node.mark_optional("verbose");
        node.mark_optional("debug");
        node.mark_optional("verbose");
        assert_eq!(node.optional_fields(), &["verbose".to_string(), "debug".to_string()]);
        assert!(node.is_optional(&"debug".into()));
        assert!(!node.is_optional(&DispatchKey::Wildcard));
    }

    #[test]
    fn test_depth_and_leaf_count() {
        let mut inner = DispatchNode::new();
        inner.insert_child("x".into(), leaf());
        inner.insert_child("y".into(), leaf());

        let mut root = DispatchNode::new();
        root.insert_child("deep".into(), inner);
        root.insert_child("shallow".into(), leaf());

        assert_eq!(root.depth(), 2);
        assert_eq!(root.leaf_count(), 3);
        assert_eq!(leaf().depth(), 0);
    }
}
