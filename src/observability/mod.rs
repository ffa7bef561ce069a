//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, context id on every line)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stderr (human-readable or JSON)
//!     → any `metrics` recorder the embedding application installs
//! ```
//!
//! # Design Decisions
//! - Structured logging for machine parsing
//! - Context id flows through evaluation and completion logs
//! - Metrics are cheap (no-op without a recorder)

pub mod logging;
pub mod metrics;
