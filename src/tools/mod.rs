//! Tool definitions and the invocation seam
//!
//! - Result/context types shared with invokers
//! - Injected catalog (roles, critical tools, dependencies)
//! - Registry of tool definitions
//! - `ToolInvoker` trait plus a simulated invoker

pub mod types;
pub mod catalog;
pub mod registry;
pub mod invoker;

// Re-export commonly used types
pub use types::{ExecutionContext, ToolDefinition, ToolName, ToolResult, ToolSpec, ToolStats};
pub use catalog::{DependencyMap, ToolCatalog};
pub use registry::ToolRegistry;
pub use invoker::{SimulatedInvoker, ToolInvoker};
