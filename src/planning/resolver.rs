//! Execution order resolution with an explicit policy for infeasible chains

use crate::errors::{ChainError, Result};
use crate::planning::graph::DependencyGraph;
use crate::tools::catalog::DependencyMap;
use crate::tools::types::ToolName;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// What to do when a chain cannot be fully ordered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionPolicy {
    /// Warn and run the stalled tools after the ordered ones, in chain order
    #[default]
    BestEffort,
    /// Refuse to run the chain
    Strict,
}

/// Outcome of resolving one chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Every dependency is satisfied by the order
    Ordered(Vec<ToolName>),

    /// Tools depend on each other in a loop
    CycleDetected {
        involved: Vec<ToolName>,
        stalled: Vec<ToolName>,
        best_effort: Vec<ToolName>,
    },

    /// Tools depend on tools that are not in the chain
    Unresolvable {
        missing: Vec<ToolName>,
        stalled: Vec<ToolName>,
        best_effort: Vec<ToolName>,
    },
}

impl Resolution {
    /// The order to run in: exact when resolved, best-effort otherwise
    pub fn order(&self) -> &[ToolName] {
        match self {
            Resolution::Ordered(order) => order,
            Resolution::CycleDetected { best_effort, .. } => best_effort,
            Resolution::Unresolvable { best_effort, .. } => best_effort,
        }
    }

    /// Consume into the order to run in
    pub fn into_order(self) -> Vec<ToolName> {
        match self {
            Resolution::Ordered(order) => order,
            Resolution::CycleDetected { best_effort, .. } => best_effort,
            Resolution::Unresolvable { best_effort, .. } => best_effort,
        }
    }

    /// Whether every dependency could be honoured
    pub fn is_ordered(&self) -> bool {
        matches!(self, Resolution::Ordered(_))
    }

    /// Tools that could not be ordered
    pub fn stalled(&self) -> &[ToolName] {
        match self {
            Resolution::Ordered(_) => &[],
            Resolution::CycleDetected { stalled, .. } => stalled,
            Resolution::Unresolvable { stalled, .. } => stalled,
        }
    }

    /// Error describing why the chain could not be ordered
    pub fn into_error(self) -> ChainError {
        match self {
            Resolution::CycleDetected { involved, .. } => ChainError::DependencyCycle { involved },
            Resolution::Unresolvable { missing, stalled, .. } => ChainError::MissingDependency {
                tools: stalled,
                missing,
            },
            Resolution::Ordered(order) => {
                ChainError::Generic(format!("chain resolved: {:?}", order))
            }
        }
    }
}

/// Dependency resolver
#[derive(Debug, Clone, Default)]
pub struct DependencyResolver {
    dependencies: DependencyMap,
    policy: ResolutionPolicy,
}

impl DependencyResolver {
    /// Create resolver over the given dependency map
    pub fn new(dependencies: DependencyMap, policy: ResolutionPolicy) -> Self {
        Self {
            dependencies,
            policy,
        }
    }

    /// Declare (or replace) the dependencies of one tool
    pub fn add_dependency(&mut self, tool: impl Into<ToolName>, depends_on: Vec<ToolName>) {
        self.dependencies.insert(tool.into(), depends_on);
    }

    /// Declared dependencies of a tool
    pub fn dependencies_of(&self, tool: &str) -> &[ToolName] {
        self.dependencies.get(tool).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn policy(&self) -> ResolutionPolicy {
        self.policy
    }

    /// Resolve `chain` into a typed result without applying the policy
    pub fn resolve(&self, chain: &[ToolName]) -> Resolution {
        let graph = DependencyGraph::build(chain, &self.dependencies);
        let layering = graph.waves();

        let mut order: Vec<ToolName> = layering
            .waves
            .iter()
            .flat_map(|wave| graph.names(wave))
            .collect();

        let stalled = graph.names(&layering.stalled);
        order.extend(stalled.iter().cloned());
        if !is_permutation(&order, chain) {
            warn!(?chain, "dependency resolution lost tools, falling back to chain order");
            order = chain.to_vec();
        }

        if layering.is_complete() {
            return Resolution::Ordered(order);
        }

        match graph.detect_cycle() {
            Some(involved) => Resolution::CycleDetected {
                involved,
                stalled,
                best_effort: order,
            },
            None => Resolution::Unresolvable {
                missing: graph.missing_dependencies(),
                stalled,
                best_effort: order,
            },
        }
    }

    /// Waves of mutually independent tools; stalled tools form a final wave
    pub fn waves(&self, chain: &[ToolName]) -> Vec<Vec<ToolName>> {
        let graph = DependencyGraph::build(chain, &self.dependencies);
        let layering = graph.waves();
        let mut waves: Vec<Vec<ToolName>> =
            layering.waves.iter().map(|wave| graph.names(wave)).collect();
        if !layering.stalled.is_empty() {
            waves.push(graph.names(&layering.stalled));
        }
        waves
    }

    /// Resolve and apply the policy
    ///
    /// Under `BestEffort` an infeasible chain logs a warning and is returned
    /// as is, so the caller can run its best-effort order. Under `Strict` it
    /// is an error.
    pub fn execution_order(&self, chain: &[ToolName]) -> Result<Resolution> {
        let resolution = self.resolve(chain);
        if resolution.is_ordered() {
            return Ok(resolution);
        }

        match self.policy {
            ResolutionPolicy::BestEffort => {
                let stalled = resolution.stalled();
                if let Resolution::CycleDetected { involved, .. } = &resolution {
                    warn!(?involved, ?stalled, "circular tool dependency, running remaining tools in chain order");
                } else {
                    warn!(?stalled, "could not resolve dependencies, running remaining tools in chain order");
                }
                Ok(resolution)
            }
            ResolutionPolicy::Strict => Err(resolution.into_error()),
        }
    }
}

/// Same multiset of names
fn is_permutation(order: &[ToolName], chain: &[ToolName]) -> bool {
    if order.len() != chain.len() {
        return false;
    }
    let mut counts: HashMap<&str, isize> = HashMap::new();
    for name in chain {
        *counts.entry(name.as_str()).or_default() += 1;
    }
    for name in order {
        *counts.entry(name.as_str()).or_default() -= 1;
    }
    counts.values().all(|&c| c == 0)
}
