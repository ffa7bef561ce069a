//! Prompt templates with `{{key}}` placeholders.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PromptError {
    #[error("prompt '{0}' not found")]
    NotFound(String),

    #[error("prompt '{prompt}' requires argument '{key}'")]
    MissingArgument { prompt: String, key: String },
}

/// One argument a prompt accepts.
#[derive(Debug, Clone, Serialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PromptKey {
    pub key: String,
    pub description: String,
    pub required: bool,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
}

impl PromptKey {
    /// A string-typed key.
    pub fn new(key: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            description: description.into(),
            kind: "string".to_string(),
            ..Self::default()
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_enum<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enum_values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_examples<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.examples = values.into_iter().map(Into::into).collect();
        self
    }
}

pub trait Prompt: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn keys(&self) -> &[PromptKey];

    /// Template text containing `{{key}}` placeholders.
    fn text(&self) -> &str;
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PromptInfo {
    pub name: String,
    pub description: String,
    pub keys: Vec<PromptKey>,
}

#[derive(Debug, Clone)]
pub struct StaticPrompt {
    name: String,
    description: String,
    keys: Vec<PromptKey>,
    text: String,
}

impl StaticPrompt {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            keys: Vec::new(),
            text: text.into(),
        }
    }

    pub fn key(mut self, key: PromptKey) -> Self {
        self.keys.push(key);
        self
    }
}

impl Prompt for StaticPrompt {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn keys(&self) -> &[PromptKey] {
        &self.keys
    }

    fn text(&self) -> &str {
        &self.text
    }
}

#[derive(Default)]
pub struct PromptRegistry {
    prompts: DashMap<String, Arc<dyn Prompt>>,
}

impl PromptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<P: Prompt + 'static>(&self, prompt: P) -> Option<Arc<dyn Prompt>> {
        let name = prompt.name().to_string();
        tracing::info!(prompt = %name, keys = prompt.keys().len(), "Registered prompt");
        self.prompts.insert(name, Arc::new(prompt))
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Prompt>> {
        self.prompts.get(name).map(|entry| Arc::clone(entry.value()))
    }

    pub fn list(&self) -> Vec<Arc<dyn Prompt>> {
        let mut prompts: Vec<Arc<dyn Prompt>> = self
            .prompts
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        prompts.sort_by(|a, b| a.name().cmp(b.name()));
        prompts
    }

    pub fn infos(&self) -> Vec<PromptInfo> {
        self.list()
            .iter()
            .map(|prompt| PromptInfo {
                name: prompt.name().to_string(),
                description: prompt.description().to_string(),
                keys: prompt.keys().to_vec(),
            })
            .collect()
    }

    /// Fill a prompt's placeholders from `args`.
    ///
    /// Declared keys missing from `args` take their default; a required key
    /// with neither is an error. Extra arguments are substituted too.
    pub fn render(&self, name: &str, args: &Map<String, Value>) -> Result<String, PromptError> {
        let prompt = self
            .get(name)
            .ok_or_else(|| PromptError::NotFound(name.to_string()))?;

        let mut values: HashMap<&str, &Value> = HashMap::new();
        for key in prompt.keys() {
            match &key.default {
                Some(default) => {
                    values.insert(key.key.as_str(), default);
                }
                None if key.required && !args.contains_key(&key.key) => {
                    return Err(PromptError::MissingArgument {
                        prompt: name.to_string(),
                        key: key.key.clone(),
                    })
                }
                None => {}
            }
        }
        for (key, value) in args {
            values.insert(key.as_str(), value);
        }

        Ok(fill_placeholders(prompt.text(), &values))
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }
}

/// Replace each `{{key}}` in one pass over `template`; substituted text is
/// never scanned again. Unknown placeholders are left as written.
fn fill_placeholders(template: &str, values: &HashMap<&str, &Value>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        let Some(close) = after.find("}}") else {
            out.push_str(&rest[open..]);
            return out;
        };
        match values.get(&after[..close]) {
            Some(Value::String(s)) => out.push_str(s),
            Some(other) => out.push_str(&other.to_string()),
            None => out.push_str(&rest[open..open + 2 + close + 2]),
        }
        rest = &after[close + 2..];
    }
    out.push_str(rest);
    out
}
