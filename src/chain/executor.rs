//! Tool chain executor
//!
//! Runs one chain as a single linear pass:
//! resolve -> execute each tool -> aggregate -> record -> return.
//!
//! Tools run one at a time in resolved order. A failing non-critical tool is
//! folded into the results and the loop continues; a failing critical tool
//! aborts the chain with `ChainError::CriticalToolFailed`.

use crate::chain::aggregate::aggregate;
use crate::chain::history::{ExecutionHistory, DEFAULT_HISTORY_CAPACITY, DEFAULT_HISTORY_LIMIT};
use crate::chain::types::{ExecutionOutcome, ExecutionRecord, HealthReport, TenantContext, ToolResults};
use crate::errors::{ChainError, Result};
use crate::planning::{DependencyResolver, ResolutionPolicy};
use crate::telemetry::{TelemetryCollector, TelemetryEvent};
use crate::tools::catalog::ToolCatalog;
use crate::tools::invoker::ToolInvoker;
use crate::tools::registry::ToolRegistry;
use crate::tools::types::{ExecutionContext, ToolDefinition, ToolName, ToolResult, ToolSpec};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Default per-tool timeout
pub const DEFAULT_TOOL_TIMEOUT_MS: u64 = 30_000;

/// Requester id used by `compose_tools`
pub const COMPOSE_REQUESTER: &str = "compose_tools_agent";

/// Executor behaviour configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Upper bound for one tool invocation
    pub tool_timeout_ms: u64,

    /// Execution records kept in memory
    pub history_capacity: usize,

    /// Policy for chains whose dependencies cannot be ordered
    pub resolution_policy: ResolutionPolicy,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            tool_timeout_ms: DEFAULT_TOOL_TIMEOUT_MS,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            resolution_policy: ResolutionPolicy::BestEffort,
        }
    }
}

impl ChainConfig {
    pub fn tool_timeout(&self) -> Duration {
        Duration::from_millis(self.tool_timeout_ms)
    }
}

/// Failure of one tool, with whatever result the tool itself reported
struct ToolFailure {
    error: ChainError,
    reported: Option<ToolResult>,
}

impl From<ChainError> for ToolFailure {
    fn from(error: ChainError) -> Self {
        Self {
            error,
            reported: None,
        }
    }
}

/// Sequences and executes tool chains
pub struct ToolChainExecutor {
    catalog: ToolCatalog,
    resolver: DependencyResolver,
    config: ChainConfig,
    registry: RwLock<ToolRegistry>,
    history: ExecutionHistory,
    tenant: RwLock<Option<TenantContext>>,
    telemetry: TelemetryCollector,
}

impl ToolChainExecutor {
    /// Create executor from an injected catalog and configuration
    pub fn new(catalog: ToolCatalog, config: ChainConfig) -> Self {
        let resolver = DependencyResolver::new(catalog.dependencies.clone(), config.resolution_policy);
        Self {
            history: ExecutionHistory::new(config.history_capacity),
            catalog,
            resolver,
            config,
            registry: RwLock::new(ToolRegistry::new()),
            tenant: RwLock::new(None),
            telemetry: TelemetryCollector::new(),
        }
    }

    /// Executor over the stock Smart City catalog
    pub fn smart_city() -> Self {
        Self::new(ToolCatalog::smart_city(), ChainConfig::default())
    }

    /// Share a telemetry collector with other components
    pub fn with_telemetry(mut self, telemetry: TelemetryCollector) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Declare (or replace) the dependencies of a tool
    pub fn add_dependency(&mut self, tool: impl Into<ToolName>, depends_on: Vec<ToolName>) {
        self.resolver.add_dependency(tool, depends_on);
    }

    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    pub fn resolver(&self) -> &DependencyResolver {
        &self.resolver
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn telemetry(&self) -> &TelemetryCollector {
        &self.telemetry
    }

    /// Set (or clear) the tenant chains run for
    pub fn set_tenant_context(&self, tenant: Option<TenantContext>) {
        if let Some(t) = &tenant {
            info!(tenant_id = %t.tenant_id, "tenant context set");
        }
        *self.tenant.write().unwrap_or_else(PoisonError::into_inner) = tenant;
    }

    pub fn tenant_context(&self) -> Option<TenantContext> {
        self.tenant.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Register a tool definition; returns `true` for a new name
    pub fn register_tool(&self, name: impl Into<String>, definition: ToolDefinition) -> bool {
        let name = name.into();
        let fresh = self
            .registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .register_tool(name.clone(), definition);
        info!(tool = %name, "tool registered");
        fresh
    }

    /// Names of registered tools
    pub fn registered_tools(&self) -> Vec<String> {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .tool_names()
    }

    /// Execute a chain of tools
    ///
    /// `context` is copied; the caller's map is never modified.
    ///
    /// # Errors
    /// `CriticalToolFailed` when a critical tool fails, `DependencyCycle` or
    /// `MissingDependency` when the chain cannot be ordered under the strict
    /// policy. The execution record is kept in history in both cases.
    pub async fn execute_tool_chain(
        &self,
        tool_chain: &[ToolName],
        context: &ExecutionContext,
        invoker: &dyn ToolInvoker,
        requester_id: &str,
    ) -> Result<ExecutionOutcome> {
        let started = Instant::now();
        let tenant = self.tenant_context();
        let mut record = ExecutionRecord::start(requester_id, tenant.as_ref().map(|t| t.tenant_id.clone()));
        let execution_id = record.execution_id.clone();

        info!(%execution_id, requester_id, tools = tool_chain.len(), "starting tool chain execution");
        self.telemetry.record(TelemetryEvent::ChainStarted {
            execution_id: execution_id.clone(),
            tool_count: tool_chain.len(),
            timestamp: Instant::now(),
        });

        let order = match self.resolve_order(tool_chain, &execution_id) {
            Ok(order) => order,
            Err(e) => {
                record.record_error(e.to_string());
                self.abort(record, None);
                return Err(e);
            }
        };
        record.total_tools = order.len();

        let mut working = context.clone();
        if let Some(t) = &tenant {
            working
                .entry("tenant_context".to_string())
                .or_insert_with(|| t.to_value());
        }

        let mut results = ToolResults::new();
        for tool in &order {
            match self.execute_single_tool(tool, &working, &results, invoker).await {
                Ok(result) => {
                    results.insert(tool.clone(), result);
                    record.record_executed(tool);
                }
                Err(failure) => {
                    let reason = match &failure.error {
                        ChainError::ToolFailed { reason, .. } => reason.clone(),
                        other => other.to_string(),
                    };
                    let message = format!("Tool {} execution failed: {}", tool, reason);
                    error!(%execution_id, tool = %tool, error = %reason, "tool execution failed");
                    record.record_error(message);

                    if self.catalog.is_critical(tool) {
                        self.abort(record, Some(tool));
                        return Err(ChainError::CriticalToolFailed {
                            tool: tool.clone(),
                            execution_id,
                            reason,
                        });
                    }

                    let result = failure
                        .reported
                        .unwrap_or_else(|| ToolResult::failure(reason));
                    results.insert(tool.clone(), result);
                }
            }
        }

        let aggregated = aggregate(&results);
        if let Some(e) = &aggregated.error {
            record.record_error(format!("Failed to aggregate results: {}", e));
        }
        record.finish();
        self.history.push(record.clone());

        let duration_ms = started.elapsed().as_millis() as u64;
        self.telemetry.record(TelemetryEvent::ChainCompleted {
            execution_id: execution_id.clone(),
            success: record.success,
            duration_ms,
            timestamp: Instant::now(),
        });
        info!(
            %execution_id,
            success = record.success,
            executed = record.tools_executed.len(),
            errors = record.errors.len(),
            duration_ms,
            "tool chain execution completed"
        );

        Ok(ExecutionOutcome {
            success: record.success,
            results: aggregated,
            execution_record: record,
            execution_id,
        })
    }

    /// Execute a chain given as names or `{name}` objects on behalf of a tenant
    pub async fn compose_tools(
        &self,
        tool_chain: &[ToolSpec],
        tenant: Option<&TenantContext>,
        invoker: &dyn ToolInvoker,
    ) -> Result<ExecutionOutcome> {
        let names: Vec<ToolName> = tool_chain.iter().map(|spec| spec.name().to_string()).collect();

        let mut context = ExecutionContext::new();
        context.insert(
            "tenant_context".to_string(),
            tenant.map(TenantContext::to_value).unwrap_or(Value::Null),
        );

        self.execute_tool_chain(&names, &context, invoker, COMPOSE_REQUESTER)
            .await
    }

    /// Most recent `limit` execution records, oldest first
    pub fn get_execution_history(&self, limit: Option<usize>) -> Vec<ExecutionRecord> {
        self.history.recent(limit.unwrap_or(DEFAULT_HISTORY_LIMIT))
    }

    /// Look up one execution record
    pub fn find_execution(&self, execution_id: &str) -> Option<ExecutionRecord> {
        self.history.find(execution_id)
    }

    /// Health snapshot
    pub fn health_check(&self) -> HealthReport {
        HealthReport {
            status: "healthy".to_string(),
            tool_registry_size: self
                .registry
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .len(),
            execution_history_entries: self.history.len(),
            history_capacity: self.history.capacity(),
            timestamp: Utc::now(),
        }
    }

    /// Build the parameters for one tool
    ///
    /// Starts from the shared context. Consumer tools also get
    /// `previous_results`; the data-quality tool gets `data_sample` cut from
    /// `data`.
    pub fn prepare_parameters(
        &self,
        tool: &str,
        context: &ExecutionContext,
        previous_results: &ToolResults,
    ) -> ExecutionContext {
        let mut parameters = context.clone();

        if self.catalog.is_consumer(tool) && !previous_results.is_empty() {
            parameters.insert("previous_results".to_string(), previous_results.to_value());
        }

        if self.catalog.is_data_quality(tool) {
            if let Some(data_sample) = context
                .get("data")
                .and_then(|data| sample(data, self.catalog.data_sample_size))
            {
                parameters.insert("data_sample".to_string(), data_sample);
            }
        }

        parameters
    }

    fn resolve_order(&self, tool_chain: &[ToolName], execution_id: &str) -> Result<Vec<ToolName>> {
        let resolution = self.resolver.execution_order(tool_chain)?;
        if !resolution.is_ordered() {
            self.telemetry.record(TelemetryEvent::ResolutionDegraded {
                execution_id: execution_id.to_string(),
                stalled: resolution.stalled().to_vec(),
                timestamp: Instant::now(),
            });
        }
        Ok(resolution.into_order())
    }

    async fn execute_single_tool(
        &self,
        tool: &str,
        context: &ExecutionContext,
        previous_results: &ToolResults,
        invoker: &dyn ToolInvoker,
    ) -> std::result::Result<ToolResult, ToolFailure> {
        let role = self.catalog.role_for(tool).to_string();
        if !invoker.supports_role(&role) {
            return Err(ChainError::NoRoleConnection {
                tool: tool.to_string(),
                role,
            }
            .into());
        }

        let parameters = self.prepare_parameters(tool, context, previous_results);

        self.telemetry.record(TelemetryEvent::ToolStarted {
            tool: tool.to_string(),
            role: role.clone(),
            timestamp: Instant::now(),
        });
        let started = Instant::now();

        let outcome = match tokio::time::timeout(
            self.config.tool_timeout(),
            invoker.invoke(tool, &role, parameters),
        )
        .await
        {
            Ok(Ok(result)) if result.is_success() => Ok(result),
            Ok(Ok(result)) => Err(ToolFailure {
                error: ChainError::ToolFailed {
                    tool: tool.to_string(),
                    reason: result.error().unwrap_or("tool reported failure").to_string(),
                },
                reported: Some(result),
            }),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(ChainError::ToolTimeout {
                tool: tool.to_string(),
                duration_ms: self.config.tool_timeout_ms,
            }
            .into()),
        };

        self.telemetry.record(TelemetryEvent::ToolCompleted {
            tool: tool.to_string(),
            duration_ms: started.elapsed().as_millis() as u64,
            success: outcome.is_ok(),
            timestamp: Instant::now(),
        });
        if outcome.is_ok() {
            info!(tool, role = %role, "tool executed successfully");
        }

        outcome
    }

    fn abort(&self, mut record: ExecutionRecord, tool: Option<&str>) {
        record.finish();
        if let Some(tool) = tool {
            self.telemetry.record(TelemetryEvent::ChainAborted {
                execution_id: record.execution_id.clone(),
                tool: tool.to_string(),
                timestamp: Instant::now(),
            });
        }
        warn!(execution_id = %record.execution_id, errors = ?record.errors, "tool chain aborted");
        self.history.push(record);
    }
}

/// First `n` items of an array, characters of a string or entries of an object
///
/// Scalars have no sample.
fn sample(data: &Value, n: usize) -> Option<Value> {
    match data {
        Value::Array(items) => Some(Value::Array(items.iter().take(n).cloned().collect())),
        Value::String(text) => Some(Value::String(text.chars().take(n).collect())),
        Value::Object(entries) => Some(Value::Object(
            entries
                .iter()
                .take(n)
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )),
        _ => None,
    }
}
