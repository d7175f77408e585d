//! Error types for chainrunner
//!
//! Only critical tool failures and strict-mode resolution failures cross the
//! executor boundary as errors. Everything else is folded into result data.

use thiserror::Error;

/// Main error type for tool chain execution
#[derive(Error, Debug)]
pub enum ChainError {
    /// Strict resolution found a dependency cycle
    #[error("Circular dependency between tools: {}", involved.join(" -> "))]
    DependencyCycle { involved: Vec<String> },

    /// Strict resolution found dependencies that are not part of the chain
    #[error("Unresolvable dependencies for {tools:?}: missing {missing:?}")]
    MissingDependency {
        tools: Vec<String>,
        missing: Vec<String>,
    },

    /// The invoker has no connection to the role responsible for a tool
    #[error("No connection to role {role} for tool {tool}")]
    NoRoleConnection { tool: String, role: String },

    /// A tool invocation did not finish in time
    #[error("Tool {tool} timed out after {duration_ms}ms")]
    ToolTimeout { tool: String, duration_ms: u64 },

    /// A tool reported or raised a failure
    #[error("Tool {tool} failed: {reason}")]
    ToolFailed { tool: String, reason: String },

    /// A critical tool failed and the chain was aborted
    #[error("Critical tool {tool} failed, chain {execution_id} aborted: {reason}")]
    CriticalToolFailed {
        tool: String,
        execution_id: String,
        reason: String,
    },

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic errors with context
    #[error("Chain error: {0}")]
    Generic(String),
}

impl ChainError {
    /// Whether this error aborted a whole chain
    pub fn is_abort(&self) -> bool {
        matches!(
            self,
            ChainError::CriticalToolFailed { .. }
                | ChainError::DependencyCycle { .. }
                | ChainError::MissingDependency { .. }
        )
    }
}

/// Result type alias for chain operations
pub type Result<T> = std::result::Result<T, ChainError>;

/// Convert anyhow errors to ChainError
impl From<anyhow::Error> for ChainError {
    fn from(err: anyhow::Error) -> Self {
        ChainError::Generic(err.to_string())
    }
}
