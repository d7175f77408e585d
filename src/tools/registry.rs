//! Tool registry
//!
//! Maintains the definitions of tools known to a chain executor. Registration
//! is informational: chains may still name tools that were never registered.

use crate::tools::types::ToolDefinition;
use std::collections::HashMap;

/// Tool registry
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    /// Map of tool name to definition
    tools: HashMap<String, ToolDefinition>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a tool definition
    ///
    /// Returns `true` if the name was not registered before.
    pub fn register_tool(&mut self, name: impl Into<String>, definition: ToolDefinition) -> bool {
        self.tools.insert(name.into(), definition).is_none()
    }

    /// Get tool definition by name
    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.get(name)
    }

    /// Check if tool exists
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Get all tool names, sorted
    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Get all tool definitions
    pub fn definitions(&self) -> Vec<&ToolDefinition> {
        self.tools.values().collect()
    }

    /// Get total number of tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
