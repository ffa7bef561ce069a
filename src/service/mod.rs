//! Service layer around dispatch trees.
//!
//! # Data Flow
//! ```text
//! caller (CLI, embedding application)
//!     → Service::execute_tool / execute_prompt / resource
//!     → registries (tool.rs, prompt.rs, resource.rs)
//!     → executor.rs (context, evaluation, async wait)
//!     → response.rs envelope
//! ```
//!
//! # Design Decisions
//! - Registries are concurrent maps; listings are sorted by key
//! - Transport is left to the embedding application

pub mod executor;
pub mod prompt;
pub mod resource;
pub mod response;
pub mod tool;

pub use executor::{Service, ServiceError, ToolExecution};
pub use prompt::{Prompt, PromptError, PromptInfo, PromptKey, PromptRegistry, StaticPrompt};
pub use resource::{Resource, ResourceContents, ResourceInfo, ResourceRegistry, StaticResource};
pub use response::{Response, ServerInfo};
pub use tool::{schema_from_tree, DispatchTool, Tool, ToolInfo, ToolRegistry};
