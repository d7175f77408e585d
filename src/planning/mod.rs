//! Dependency planning for tool chains
//!
//! - Arena dependency graph with cycle detection
//! - Breadth-first wave layering
//! - Typed resolution with best-effort or strict policy

pub mod graph;
pub mod resolver;

pub use graph::{DependencyGraph, Layering, NodeIndex, ToolNode};
pub use resolver::{DependencyResolver, Resolution, ResolutionPolicy};
