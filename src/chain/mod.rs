//! Tool chain execution
//!
//! - Result, record and outcome types
//! - Aggregation into a chain summary
//! - Bounded execution history
//! - `ToolChainExecutor`, the sequencing driver

pub mod types;
pub mod aggregate;
pub mod history;
pub mod executor;

pub use types::{
    AggregatedResults, ChainSummary, ExecutionOutcome, ExecutionRecord, HealthReport,
    TenantContext, ToolResults,
};
pub use aggregate::aggregate;
pub use history::{ExecutionHistory, DEFAULT_HISTORY_CAPACITY, DEFAULT_HISTORY_LIMIT};
pub use executor::{ChainConfig, ToolChainExecutor, COMPOSE_REQUESTER, DEFAULT_TOOL_TIMEOUT_MS};
