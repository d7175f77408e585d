//! Tool catalog: which role runs a tool and how failures are treated
//!
//! The catalog is plain configuration handed to the executor at construction
//! time. `ToolCatalog::smart_city()` is the stock catalog.

use crate::tools::types::ToolName;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Role used when a tool has no entry in the role table
pub const DEFAULT_ROLE: &str = "conductor";

/// Number of items passed to the data-quality tool as `data_sample`
pub const DEFAULT_DATA_SAMPLE_SIZE: usize = 100;

/// Mapping from tool name to tools that must run before it
pub type DependencyMap = HashMap<ToolName, Vec<ToolName>>;

/// Injected tool catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolCatalog {
    /// Tool name -> responsible role
    pub roles: HashMap<ToolName, String>,

    /// Role for tools missing from `roles`
    pub default_role: String,

    /// Tools whose failure aborts the chain
    pub critical_tools: HashSet<ToolName>,

    /// Tools that receive `previous_results`
    pub consumer_tools: HashSet<ToolName>,

    /// Tool that receives `data_sample`
    pub data_quality_tool: Option<ToolName>,

    /// Size of `data_sample`
    pub data_sample_size: usize,

    /// Declared dependencies
    pub dependencies: DependencyMap,
}

impl Default for ToolCatalog {
    fn default() -> Self {
        Self {
            roles: HashMap::new(),
            default_role: DEFAULT_ROLE.to_string(),
            critical_tools: HashSet::new(),
            consumer_tools: HashSet::new(),
            data_quality_tool: None,
            data_sample_size: DEFAULT_DATA_SAMPLE_SIZE,
            dependencies: DependencyMap::new(),
        }
    }
}

impl ToolCatalog {
    /// Stock catalog for the Smart City roles
    pub fn smart_city() -> Self {
        let roles = [
            ("store_document", "librarian"),
            ("retrieve_document", "librarian"),
            ("search_documents", "librarian"),
            ("assess_data_quality", "data_steward"),
            ("manage_data_lifecycle", "data_steward"),
            ("create_workflow", "conductor"),
            ("execute_workflow", "conductor"),
            ("send_message", "post_office"),
            ("format_outputs", "post_office"),
            ("authenticate_user", "security_guard"),
            ("authorize_action", "security_guard"),
            ("monitor_health", "nurse"),
            ("collect_telemetry", "nurse"),
            ("enforce_policies", "city_manager"),
            ("manage_governance", "city_manager"),
            ("manage_sessions", "traffic_cop"),
            ("coordinate_requests", "traffic_cop"),
        ]
        .into_iter()
        .map(|(tool, role)| (tool.to_string(), role.to_string()))
        .collect();

        Self {
            roles,
            critical_tools: to_set(&["authenticate_user", "authorize_action", "enforce_policies"]),
            consumer_tools: to_set(&["format_outputs", "send_message"]),
            data_quality_tool: Some("assess_data_quality".to_string()),
            ..Self::default()
        }
    }

    /// Role responsible for a tool
    pub fn role_for(&self, tool: &str) -> &str {
        self.roles
            .get(tool)
            .map(String::as_str)
            .unwrap_or(&self.default_role)
    }

    /// Whether a failure of this tool aborts the chain
    pub fn is_critical(&self, tool: &str) -> bool {
        self.critical_tools.contains(tool)
    }

    /// Whether this tool receives `previous_results`
    pub fn is_consumer(&self, tool: &str) -> bool {
        self.consumer_tools.contains(tool)
    }

    /// Whether this tool receives `data_sample`
    pub fn is_data_quality(&self, tool: &str) -> bool {
        self.data_quality_tool.as_deref() == Some(tool)
    }

    /// Declare dependencies for a tool
    pub fn with_dependency(mut self, tool: &str, depends_on: &[&str]) -> Self {
        self.dependencies.insert(
            tool.to_string(),
            depends_on.iter().map(|d| d.to_string()).collect(),
        );
        self
    }

    /// Mark a tool as critical
    pub fn with_critical(mut self, tool: &str) -> Self {
        self.critical_tools.insert(tool.to_string());
        self
    }
}

fn to_set(names: &[&str]) -> HashSet<ToolName> {
    names.iter().map(|n| n.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smart_city_roles() {
        let catalog = ToolCatalog::smart_city();
        assert_eq!(catalog.role_for("store_document"), "librarian");
        assert_eq!(catalog.role_for("authenticate_user"), "security_guard");
        assert_eq!(catalog.role_for("coordinate_requests"), "traffic_cop");
    }

    #[test]
    fn test_unknown_tool_uses_default_role() {
        let catalog = ToolCatalog::smart_city();
        assert_eq!(catalog.role_for("make_coffee"), DEFAULT_ROLE);

        let custom = ToolCatalog {
            default_role: "nurse".to_string(),
            ..ToolCatalog::default()
        };
        assert_eq!(custom.role_for("make_coffee"), "nurse");
    }

    #[test]
    fn test_critical_and_consumer_sets() {
        let catalog = ToolCatalog::smart_city();
        assert!(catalog.is_critical("enforce_policies"));
        assert!(!catalog.is_critical("store_document"));
        assert!(catalog.is_consumer("send_message"));
        assert!(!catalog.is_consumer("create_workflow"));
        assert!(catalog.is_data_quality("assess_data_quality"));
    }

    #[test]
    fn test_empty_catalog_has_no_policy() {
        let catalog = ToolCatalog::default();
        assert!(!catalog.is_critical("authenticate_user"));
        assert!(!catalog.is_data_quality("assess_data_quality"));
        assert_eq!(catalog.data_sample_size, DEFAULT_DATA_SAMPLE_SIZE);
    }

    #[test]
    fn test_builders() {
        let catalog = ToolCatalog::default()
            .with_dependency("send_message", &["create_workflow"])
            .with_critical("a");
        assert_eq!(catalog.dependencies["send_message"], vec!["create_workflow".to_string()]);
        assert!(catalog.is_critical("a"));
    }
}
