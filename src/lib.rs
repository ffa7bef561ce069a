//! Dispatch Tree Library
//!
//! Routes a request, given as a map of named fields, through a tree of
//! discriminator nodes to exactly one handler.
//!
//! # Architecture Overview
//!
//! ```text
//!     request fields ──▶ context ──▶ tree::evaluate ──▶ leaf handler ──▶ value
//!                          │              │                  │
//!                          │              └─ NoBranch        └─ complete later
//!                          │                 diagnostic         (one-shot)
//!                          ▼
//!                       service (tools, prompts, resources, async deadline)
//! ```

pub mod catalog;
pub mod config;
pub mod context;
pub mod observability;
pub mod service;
pub mod tree;

pub use config::ServiceConfig;
pub use context::ExecutionContext;
pub use service::Service;
pub use tree::{evaluate, DispatchKey, DispatchNode, HandlerError, NoBranch, Outcome, TreeBuilder};
