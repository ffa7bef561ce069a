//! Tool execution.
//!
//! # Data Flow
//! ```text
//! execute_tool(name, params)
//!     → ToolRegistry lookup
//!     → ExecutionContext::new(params)
//!     → Tool::execute (tree evaluation, synchronous)
//!     → if the handler went asynchronous: await WaitHandle under the
//!       configured deadline
//!     → ToolExecution
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::Instrument;
use uuid::Uuid;

use super::prompt::{PromptError, PromptRegistry};
use super::resource::{Resource, ResourceContents, ResourceRegistry};
use super::response::ServerInfo;
use super::tool::{Tool, ToolRegistry};
use crate::config::ServiceConfig;
use crate::context::{ContextError, ExecutionContext};
use crate::observability::metrics;
use crate::tree::{HandlerError, NoBranch, Outcome};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("tool '{0}' not found")]
    ToolNotFound(String),

    #[error("resource '{0}' not found")]
    ResourceNotFound(String),

    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error(transparent)]
    NoBranch(#[from] NoBranch),

    #[error("tool '{tool}' failed: {source}")]
    Handler {
        tool: String,
        #[source]
        source: HandlerError,
    },

    #[error("tool '{tool}' did not complete within {timeout_ms}ms")]
    AsyncTimeout { tool: String, timeout_ms: u64 },

    #[error(transparent)]
    Context(#[from] ContextError),
}

/// Result of one successful tool run.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ToolExecution {
    pub tool: String,
    pub context_id: Uuid,
    pub result: Value,
    /// Whether the result arrived through asynchronous completion.
    pub asynchronous: bool,
    pub duration_ms: u64,
}

/// Registries plus the configuration that governs execution.
pub struct Service {
    config: ServiceConfig,
    tools: ToolRegistry,
    resources: ResourceRegistry,
    prompts: PromptRegistry,
}

impl Service {
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            config,
            tools: ToolRegistry::new(),
            resources: ResourceRegistry::new(),
            prompts: PromptRegistry::new(),
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn resources(&self) -> &ResourceRegistry {
        &self.resources
    }

    pub fn prompts(&self) -> &PromptRegistry {
        &self.prompts
    }

    pub fn server_info(&self) -> ServerInfo {
        ServerInfo {
            name: self.config.server.name.clone(),
            version: self.config.server.version.clone(),
            status: "running".to_string(),
        }
    }

    /// Run a tool against `params`.
    ///
    /// A handler that takes a completer (directly or through
    /// `trigger_async`) is awaited for at most
    /// `execution.async_timeout_ms`.
    pub async fn execute_tool(
        &self,
        name: &str,
        params: Map<String, Value>,
    ) -> Result<ToolExecution, ServiceError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ServiceError::ToolNotFound(name.to_string()))?;

        let ctx = ExecutionContext::new(params);
        let span = tracing::info_span!("execute_tool", tool = %name, context_id = %ctx.id());

        self.run(tool, ctx).instrument(span).await
    }

    async fn run(
        &self,
        tool: Arc<dyn Tool>,
        ctx: ExecutionContext,
    ) -> Result<ToolExecution, ServiceError> {
        let start = Instant::now();
        let name = tool.name().to_string();

        let outcome = match tool.execute(&ctx) {
            Ok(outcome) => outcome,
            Err(source) => {
                metrics::record_evaluation(&name, metrics::OUTCOME_HANDLER_ERROR);
                tracing::warn!(error = %source, "Handler failed");
                return Err(ServiceError::Handler { tool: name, source });
            }
        };

        let value = match outcome {
            Outcome::Matched(value) => value,
            Outcome::NoBranch(diagnostic) => {
                metrics::record_evaluation(&name, metrics::OUTCOME_NO_BRANCH);
                return Err(diagnostic.into());
            }
        };
        metrics::record_evaluation(&name, metrics::OUTCOME_MATCHED);

        let asynchronous = ctx.is_async_pending();
        let result = if asynchronous {
            self.await_completion(&name, &ctx).await?
        } else {
            value
        };

        metrics::record_execution(&name, start);
        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        tracing::info!(duration_ms, asynchronous, "Tool executed");

        Ok(ToolExecution {
            tool: name,
            context_id: ctx.id(),
            result,
            asynchronous,
            duration_ms,
        })
    }

    async fn await_completion(
        &self,
        name: &str,
        ctx: &ExecutionContext,
    ) -> Result<Value, ServiceError> {
        let handle = ctx.wait_handle().ok_or(ContextError::HandleTaken)?;
        let timeout_ms = self.config.execution.async_timeout_ms;

        tracing::debug!(timeout_ms, "Awaiting asynchronous completion");
        match tokio::time::timeout(Duration::from_millis(timeout_ms), handle).await {
            Ok(Ok(value)) => {
                metrics::record_async_completion(name, "completed");
                Ok(value)
            }
            Ok(Err(e)) => {
                metrics::record_async_completion(name, "abandoned");
                Err(e.into())
            }
            Err(_) => {
                metrics::record_async_completion(name, "timeout");
                tracing::warn!(timeout_ms, "Asynchronous completion timed out");
                Err(ServiceError::AsyncTimeout {
                    tool: name.to_string(),
                    timeout_ms,
                })
            }
        }
    }

    /// Render a prompt with `args`.
    pub fn execute_prompt(&self, name: &str, args: &Map<String, Value>) -> Result<String, ServiceError> {
        Ok(self.prompts.render(name, args)?)
    }

    pub fn resource(&self, url: &str) -> Result<Arc<dyn Resource>, ServiceError> {
        self.resources
            .get(url)
            .ok_or_else(|| ServiceError::ResourceNotFound(url.to_string()))
    }

    /// Metadata and body of the resource at `url`.
    pub fn read_resource(&self, url: &str) -> Result<ResourceContents, ServiceError> {
        let resource = self.resource(url)?;
        tracing::debug!(url = %url, "Reading resource");
        Ok(ResourceContents::read(resource.as_ref()))
    }
}
