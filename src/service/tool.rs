//! Tools and the tool registry.
//!
//! # Responsibilities
//! - Define the `Tool` trait executed by the service
//! - Adapt a dispatch tree into a `Tool`
//! - Derive a JSON input schema from a tree's discriminator fields
//! - Store tools by name for concurrent lookup

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::context::ExecutionContext;
use crate::tree::{evaluate, DispatchKey, DispatchNode, HandlerError, Outcome};

/// A named operation that can be run with a set of parameters.
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema describing accepted parameters.
    fn input_schema(&self) -> Value;

    fn execute(&self, ctx: &ExecutionContext) -> Result<Outcome, HandlerError>;

    /// The dispatch tree behind this tool, if it has one.
    fn tree(&self) -> Option<&DispatchNode> {
        None
    }
}

/// Serializable summary of a registered tool.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// A tool whose behaviour is a dispatch tree.
#[derive(Debug)]
pub struct DispatchTool {
    name: String,
    description: String,
    schema: Option<Value>,
    tree: Arc<DispatchNode>,
}

impl DispatchTool {
    pub fn new(name: impl Into<String>, description: impl Into<String>, tree: DispatchNode) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            schema: None,
            tree: Arc::new(tree),
        }
    }

    /// Override the schema derived from the tree.
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.schema = Some(schema);
        self
    }
}

impl Tool for DispatchTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn input_schema(&self) -> Value {
        self.schema
            .clone()
            .unwrap_or_else(|| schema_from_tree(&self.tree))
    }

    fn execute(&self, ctx: &ExecutionContext) -> Result<Outcome, HandlerError> {
        evaluate(&self.tree, ctx)
    }

    fn tree(&self) -> Option<&DispatchNode> {
        Some(&self.tree)
    }
}

/// Build an object schema listing every field the tree inspects.
///
/// Discriminator fields get an `enum` of their literal keys (omitted when a
/// node accepts any value through a wildcard); optional fields are listed
/// without constraints. Nothing is `required`, since every field may fall
/// through to a default branch.
pub fn schema_from_tree(tree: &DispatchNode) -> Value {
    let mut fields: BTreeMap<String, FieldShape> = BTreeMap::new();
    collect_fields(tree, &mut fields);

    let properties: Map<String, Value> = fields
        .into_iter()
        .map(|(name, shape)| (name, shape.into_schema()))
        .collect();

    json!({
        "type": "object",
        "properties": properties,
    })
}

#[derive(Default)]
struct FieldShape {
    values: Vec<Value>,
    open: bool,
    optional: bool,
}

impl FieldShape {
    fn into_schema(self) -> Value {
        let mut schema = Map::new();
        if self.optional && self.values.is_empty() {
            schema.insert("description".into(), json!("Optional branch selector"));
        } else {
            schema.insert("description".into(), json!("Dispatch discriminator"));
        }
        if !self.open && !self.values.is_empty() {
            schema.insert("enum".into(), Value::Array(self.values));
        }
        Value::Object(schema)
    }
}

fn collect_fields(node: &DispatchNode, fields: &mut BTreeMap<String, FieldShape>) {
    if node.is_leaf() {
        return;
    }

    if !node.field().is_empty() {
        let shape = fields.entry(node.field().to_string()).or_default();
        for (key, _) in node.children() {
            if node.is_optional(key) {
                continue;
            }
            match key_to_value(key) {
                Some(value) if !shape.values.contains(&value) => shape.values.push(value),
                Some(_) => {}
                None => shape.open = true,
            }
        }
    }

    for name in node.optional_fields() {
        fields.entry(name.clone()).or_default().optional = true;
    }

    for (_, child) in node.children() {
        collect_fields(child, fields);
    }
}

fn key_to_value(key: &DispatchKey) -> Option<Value> {
    match key {
        DispatchKey::Wildcard | DispatchKey::Composite(_) => None,
        DispatchKey::Int(i) => Some(json!(i)),
        DispatchKey::Float(bits) => Some(json!(f64::from_bits(*bits))),
        DispatchKey::Bool(b) => Some(json!(b)),
        DispatchKey::Str(s) => Some(json!(s)),
    }
}

/// Concurrent registry of tools keyed by name.
#[derive(Default)]
pub struct ToolRegistry {
    tools: DashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, returning the one it replaced.
    pub fn register<T: Tool + 'static>(&self, tool: T) -> Option<Arc<dyn Tool>> {
        let name = tool.name().to_string();
        if let Some(tree) = tool.tree() {
            tracing::info!(
                tool = %name,
                depth = tree.depth(),
                leaves = tree.leaf_count(),
                "Registered dispatch tool"
            );
        } else {
            tracing::info!(tool = %name, "Registered tool");
        }
        self.tools.insert(name, Arc::new(tool))
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// All tools, sorted by name.
    pub fn list(&self) -> Vec<Arc<dyn Tool>> {
        let mut tools: Vec<Arc<dyn Tool>> =
            self.tools.iter().map(|entry| Arc::clone(entry.value())).collect();
        tools.sort_by(|a, b| a.name().cmp(b.name()));
        tools
    }

    pub fn infos(&self) -> Vec<ToolInfo> {
        self.list()
            .iter()
            .map(|tool| ToolInfo {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                input_schema: tool.input_schema(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
