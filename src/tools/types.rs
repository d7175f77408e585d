//! Tool execution types and structures
//!
//! Core types passed between the chain executor and tool invokers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Opaque tool identifier, e.g. `store_document`
pub type ToolName = String;

/// Key/value parameters shared by every tool in one chain invocation
pub type ExecutionContext = Map<String, Value>;

/// Result of one tool invocation
///
/// A JSON object carrying at least a boolean `success` key and either a
/// payload or an `error` description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolResult(Map<String, Value>);

impl ToolResult {
    /// Create successful result with no payload
    pub fn success() -> Self {
        let mut map = Map::new();
        map.insert("success".to_string(), Value::Bool(true));
        Self(map)
    }

    /// Create failed result
    pub fn failure(error: impl Into<String>) -> Self {
        let mut map = Map::new();
        map.insert("success".to_string(), Value::Bool(false));
        map.insert("error".to_string(), Value::String(error.into()));
        map.insert("status".to_string(), Value::String("failed".to_string()));
        Self(map)
    }

    /// Wrap an arbitrary JSON object. A missing `success` key reads as failure.
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Wrap a JSON value; non-objects are stored under `output`
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            other => {
                let mut result = Self::success();
                result.0.insert("output".to_string(), other);
                result
            }
        }
    }

    /// Builder-style payload field
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Whether the tool reported success
    pub fn is_success(&self) -> bool {
        self.0.get("success").and_then(Value::as_bool).unwrap_or(false)
    }

    /// Error description, if any
    pub fn error(&self) -> Option<&str> {
        self.0.get("error").and_then(Value::as_str)
    }

    /// Read a payload field
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Borrow the underlying object
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Convert into a JSON value
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// Static description of a registered tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name
    pub name: String,

    /// Tool description
    #[serde(default)]
    pub description: String,

    /// Parameter schema (JSON Schema)
    #[serde(default)]
    pub parameters: Value,
}

impl ToolDefinition {
    /// Create new tool definition
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// A chain entry as accepted by `compose_tools`: a bare name or an object with `name`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolSpec {
    Name(String),
    Detailed { name: String },
}

impl ToolSpec {
    pub fn name(&self) -> &str {
        match self {
            ToolSpec::Name(name) => name,
            ToolSpec::Detailed { name } => name,
        }
    }
}

/// Per-tool execution statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolStats {
    /// Total executions
    pub total_executions: u64,

    /// Successful executions
    pub successful_executions: u64,

    /// Failed executions
    pub failed_executions: u64,

    /// Total execution time (ms)
    pub total_duration_ms: u64,
}

impl ToolStats {
    /// Record successful execution
    pub fn record_success(&mut self, duration_ms: u64) {
        self.total_executions += 1;
        self.successful_executions += 1;
        self.total_duration_ms += duration_ms;
    }

    /// Record failed execution
    pub fn record_failure(&mut self, duration_ms: u64) {
        self.total_executions += 1;
        self.failed_executions += 1;
        self.total_duration_ms += duration_ms;
    }

    /// Calculate average duration
    pub fn average_duration_ms(&self) -> f64 {
        if self.total_executions == 0 {
            0.0
        } else {
            self.total_duration_ms as f64 / self.total_executions as f64
        }
    }

    /// Calculate success rate
    pub fn success_rate(&self) -> f64 {
        if self.total_executions == 0 {
            0.0
        } else {
            self.successful_executions as f64 / self.total_executions as f64
        }
    }
}
