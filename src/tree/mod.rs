//! Dispatch tree subsystem.
//!
//! # Data Flow
//! ```text
//! Tree Construction (at startup):
//!     builder.rs (fluent API)
//!     → node.rs (ordered children, optional fields, handler)
//!     → Freeze as immutable DispatchNode, shared via Arc
//!
//! Incoming Request (field map in an ExecutionContext)
//!     → eval.rs (walk from root)
//!     → token.rs (canonicalize discriminator values)
//!     → Return: Matched(value) or NoBranch(diagnostic)
//! ```
//!
//! # Design Decisions
//! - Trees are immutable after build (thread-safe without locks)
//! - Deterministic: optional branches are scanned in registration order
//! - Explicit NoBranch rather than an ambiguous empty result
//! - render.rs is a debugging aid only

pub mod builder;
pub mod eval;
pub mod node;
pub mod render;
pub mod token;
pub mod types;

pub use builder::TreeBuilder;
pub use eval::evaluate;
pub use node::DispatchNode;
pub use token::{DispatchKey, WILDCARD};
pub use types::{Handler, HandlerError, HandlerResult, NoBranch, Outcome};
