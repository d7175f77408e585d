//! Result aggregation
//!
//! Counts successes and failures over the per-tool result map and pulls a few
//! well-known fields out of specific tools. Aggregation never fails: a
//! malformed enrichment field degrades the aggregate instead.

use crate::chain::types::{AggregatedResults, ChainSummary, ToolResults};
use crate::errors::{ChainError, Result};
use chrono::Utc;
use serde_json::Value;

/// Tool reporting `quality_score`
pub const QUALITY_TOOL: &str = "assess_data_quality";

/// Tool reporting `health_status`
pub const HEALTH_TOOL: &str = "monitor_health";

/// Tool reporting `workflow_id`
pub const WORKFLOW_TOOL: &str = "create_workflow";

/// Aggregate per-tool results into an outcome summary
pub fn aggregate(results: &ToolResults) -> AggregatedResults {
    let counts = count(results);

    match enrich(counts.clone(), results) {
        Ok(summary) => AggregatedResults {
            success: summary.failed_tools.is_empty(),
            tool_results: results.clone(),
            summary,
            error: None,
            timestamp: Utc::now(),
        },
        Err(e) => {
            tracing::error!(error = %e, "failed to aggregate results");
            AggregatedResults::degraded(results.clone(), counts, e.to_string())
        }
    }
}

fn count(results: &ToolResults) -> ChainSummary {
    let failed_tools: Vec<String> = results
        .iter()
        .filter(|(_, result)| !result.is_success())
        .map(|(name, _)| name.clone())
        .collect();

    ChainSummary {
        total_tools: results.len(),
        successful_tools: results.len() - failed_tools.len(),
        failed_tools,
        ..ChainSummary::default()
    }
}

fn enrich(mut summary: ChainSummary, results: &ToolResults) -> Result<ChainSummary> {
    if let Some(quality) = results.get(QUALITY_TOOL) {
        summary.data_quality = Some(match quality.get("quality_score") {
            None | Some(Value::Null) => 0.0,
            Some(value) => value.as_f64().ok_or_else(|| {
                ChainError::Generic(format!("{} returned non-numeric quality_score: {}", QUALITY_TOOL, value))
            })?,
        });
    }

    if let Some(health) = results.get(HEALTH_TOOL) {
        summary.system_health = Some(
            health
                .get("health_status")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string(),
        );
    }

    if let Some(workflow) = results.get(WORKFLOW_TOOL) {
        summary.workflow_created = workflow.get("workflow_id").cloned();
    }

    Ok(summary)
}
