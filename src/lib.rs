//! chainrunner - dependency-ordered tool chain execution
//!
//! Runs a chain of named tools through role services, one at a time, in an
//! order that honours declared dependencies.
//!
//! # Architecture
//!
//! - **tools**: catalog, registry and the `ToolInvoker` seam
//! - **planning**: dependency graph, wave layering, typed resolution
//! - **chain**: executor, aggregation, bounded execution history
//! - **telemetry**: event collection and `tracing` setup
//! - **cli**: arguments and TOML configuration

pub mod errors;
pub mod tools;
pub mod planning;
pub mod chain;
pub mod telemetry;
pub mod cli;

// Re-export commonly used types
pub use errors::{ChainError, Result};
pub use chain::{ChainConfig, ExecutionOutcome, ExecutionRecord, ToolChainExecutor};
pub use tools::{ToolCatalog, ToolInvoker, ToolResult};
