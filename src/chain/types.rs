//! Records and outcomes of tool chain execution

use crate::tools::types::{ToolName, ToolResult};
use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// Per-tool results in first-execution order
///
/// Keyed by tool name: a duplicate tool overwrites its earlier result in place.
/// A failure followed by a successful rerun leaves only the success here; the
/// failure is kept in `ExecutionRecord::errors`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolResults {
    entries: Vec<(ToolName, ToolResult)>,
}

impl ToolResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the result for `tool`
    pub fn insert(&mut self, tool: impl Into<ToolName>, result: ToolResult) {
        let tool = tool.into();
        match self.entries.iter_mut().find(|(name, _)| *name == tool) {
            Some(entry) => entry.1 = result,
            None => self.entries.push((tool, result)),
        }
    }

    pub fn get(&self, tool: &str) -> Option<&ToolResult> {
        self.entries
            .iter()
            .find(|(name, _)| name == tool)
            .map(|(_, result)| result)
    }

    pub fn contains(&self, tool: &str) -> bool {
        self.get(tool).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ToolName, &ToolResult)> {
        self.entries.iter().map(|(name, result)| (name, result))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// JSON object of tool name -> result, used for `previous_results`
    pub fn to_value(&self) -> Value {
        let map: Map<String, Value> = self
            .entries
            .iter()
            .map(|(name, result)| (name.clone(), result.clone().into_value()))
            .collect();
        Value::Object(map)
    }
}

impl Serialize for ToolResults {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, result) in &self.entries {
            map.serialize_entry(name, result)?;
        }
        map.end()
    }
}

/// Summary over all per-tool results
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChainSummary {
    /// Number of distinct tools with a result
    pub total_tools: usize,

    /// Tools whose result reports success
    pub successful_tools: usize,

    /// Tools whose result reports failure, in execution order
    pub failed_tools: Vec<ToolName>,

    /// `quality_score` reported by the data-quality tool
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_quality: Option<f64>,

    /// `health_status` reported by the health monitor
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_health: Option<String>,

    /// `workflow_id` reported by workflow creation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_created: Option<Value>,
}

/// Aggregated chain results
#[derive(Debug, Clone, Serialize)]
pub struct AggregatedResults {
    /// No stored result reports failure and aggregation completed
    ///
    /// Covers the final result of each tool only. `ExecutionOutcome::success`
    /// also counts failures overwritten by a rerun.
    pub success: bool,

    /// Raw per-tool results
    pub tool_results: ToolResults,

    /// Counts and extracted summaries
    pub summary: ChainSummary,

    /// Set when summarizing failed; `summary` then only carries counts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// When aggregation ran
    pub timestamp: DateTime<Utc>,
}

impl AggregatedResults {
    /// Degraded aggregation: raw results preserved, error reported
    pub fn degraded(tool_results: ToolResults, summary: ChainSummary, error: impl Into<String>) -> Self {
        Self {
            success: false,
            tool_results,
            summary,
            error: Some(error.into()),
            timestamp: Utc::now(),
        }
    }
}

/// Audit entry for one chain execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    /// Execution identifier (`exec_<uuid>`)
    pub execution_id: String,

    /// Agent or caller that requested the run
    pub requester_id: String,

    /// Tenant the run was made for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,

    pub start_time: DateTime<Utc>,

    pub end_time: Option<DateTime<Utc>>,

    /// Tools that ran successfully, in execution order
    pub tools_executed: Vec<ToolName>,

    /// Error messages collected during the run
    pub errors: Vec<String>,

    /// True iff `errors` is empty
    pub success: bool,

    /// Length of the resolved execution order
    pub total_tools: usize,

    /// Number of tools that ran successfully
    pub successful_tools: usize,
}

impl ExecutionRecord {
    /// Start a new record
    pub fn start(requester_id: impl Into<String>, tenant_id: Option<String>) -> Self {
        Self {
            execution_id: format!("exec_{}", uuid::Uuid::new_v4().simple()),
            requester_id: requester_id.into(),
            tenant_id,
            start_time: Utc::now(),
            end_time: None,
            tools_executed: Vec::new(),
            errors: Vec::new(),
            success: true,
            total_tools: 0,
            successful_tools: 0,
        }
    }

    /// Record a successfully executed tool
    pub fn record_executed(&mut self, tool: &str) {
        self.tools_executed.push(tool.to_string());
        self.successful_tools = self.tools_executed.len();
    }

    /// Record an error
    pub fn record_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
        self.success = false;
    }

    /// Close the record
    pub fn finish(&mut self) {
        self.end_time = Some(Utc::now());
        self.success = self.errors.is_empty();
        self.successful_tools = self.tools_executed.len();
    }

    /// Wall-clock duration, once finished
    pub fn duration_ms(&self) -> Option<i64> {
        self.end_time
            .map(|end| (end - self.start_time).num_milliseconds())
    }
}

/// Result of `execute_tool_chain`
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionOutcome {
    /// True iff no errors were recorded
    pub success: bool,

    pub results: AggregatedResults,

    pub execution_record: ExecutionRecord,

    /// Same as `execution_record.execution_id`
    pub execution_id: String,
}

/// Tenant on whose behalf chains run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantContext {
    pub tenant_id: String,

    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl TenantContext {
    pub fn new(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            attributes: Map::new(),
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::String(self.tenant_id.clone()))
    }
}

/// Executor health snapshot
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: String,
    pub tool_registry_size: usize,
    pub execution_history_entries: usize,
    pub history_capacity: usize,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_results_overwrite_in_place() {
        let mut results = ToolResults::new();
        results.insert("a", ToolResult::success());
        results.insert("b", ToolResult::success());
        results.insert("a", ToolResult::failure("second run"));

        assert_eq!(results.len(), 2);
        let names: Vec<&ToolName> = results.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(!results.get("a").unwrap().is_success());
    }

    #[test]
    fn test_tool_results_serialize_as_object() {
        let mut results = ToolResults::new();
        results.insert("create_workflow", ToolResult::success().with("workflow_id", "wf_1"));

        let value = serde_json::to_value(&results).unwrap();
        assert_eq!(value, json!({"create_workflow": {"success": true, "workflow_id": "wf_1"}}));
        assert_eq!(results.to_value(), value);
    }

    #[test]
    fn test_record_lifecycle() {
        let mut record = ExecutionRecord::start("agent-7", None);
        assert!(record.execution_id.starts_with("exec_"));

        record.record_executed("store_document");
        record.record_error("Tool send_message execution failed: down");
        record.finish();

        assert!(!record.success);
        assert_eq!(record.successful_tools, 1);
        assert!(record.end_time.is_some());
        assert!(record.duration_ms().unwrap() >= 0);
    }

    #[test]
    fn test_record_ids_are_unique() {
        let a = ExecutionRecord::start("x", None);
        let b = ExecutionRecord::start("x", None);
        assert_ne!(a.execution_id, b.execution_id);
    }

    #[test]
    fn test_tenant_context_flattens_attributes() {
        let mut tenant = TenantContext::new("t-1");
        tenant.attributes.insert("region".to_string(), json!("eu"));
        assert_eq!(tenant.to_value(), json!({"tenant_id": "t-1", "region": "eu"}));
    }
}
