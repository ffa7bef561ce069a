//! Static resources exposed alongside tools.

use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;

pub trait Resource: Send + Sync {
    fn url(&self) -> &str;

    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn mime_type(&self) -> &str;

    /// Resource body.
    fn contents(&self) -> String;
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceInfo {
    pub url: String,
    pub name: String,
    pub description: String,
    pub mime_type: String,
}

/// A single resource together with its body.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceContents {
    pub url: String,
    pub name: String,
    pub description: String,
    pub mime_type: String,
    pub contents: String,
}

impl ResourceContents {
    pub fn read(resource: &dyn Resource) -> Self {
        Self {
            url: resource.url().to_string(),
            name: resource.name().to_string(),
            description: resource.description().to_string(),
            mime_type: resource.mime_type().to_string(),
            contents: resource.contents(),
        }
    }
}

/// A resource whose contents are fixed at construction.
#[derive(Debug, Clone)]
pub struct StaticResource {
    url: String,
    name: String,
    description: String,
    mime_type: String,
    contents: String,
}

impl StaticResource {
    pub fn new(
        url: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        contents: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            name: name.into(),
            description: description.into(),
            mime_type: "text/plain".to_string(),
            contents: contents.into(),
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }
}

impl Resource for StaticResource {
    fn url(&self) -> &str {
        &self.url
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    fn contents(&self) -> String {
        self.contents.clone()
    }
}

/// Resources keyed by URL.
#[derive(Default)]
pub struct ResourceRegistry {
    resources: DashMap<String, Arc<dyn Resource>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<R: Resource + 'static>(&self, resource: R) -> Option<Arc<dyn Resource>> {
        let url = resource.url().to_string();
        tracing::info!(url = %url, "Registered resource");
        self.resources.insert(url, Arc::new(resource))
    }

    pub fn get(&self, url: &str) -> Option<Arc<dyn Resource>> {
        self.resources.get(url).map(|entry| Arc::clone(entry.value()))
    }

    pub fn list(&self) -> Vec<Arc<dyn Resource>> {
        let mut resources: Vec<Arc<dyn Resource>> = self
            .resources
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        resources.sort_by(|a, b| a.url().cmp(b.url()));
        resources
    }

    pub fn infos(&self) -> Vec<ResourceInfo> {
        self.list()
            .iter()
            .map(|resource| ResourceInfo {
                url: resource.url().to_string(),
                name: resource.name().to_string(),
                description: resource.description().to_string(),
                mime_type: resource.mime_type().to_string(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
