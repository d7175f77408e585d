//! Telemetry system for chainrunner
//!
//! Event collection and running statistics for chain executions, plus the
//! `tracing` subscriber setup used by the binary.

use crate::tools::types::ToolStats;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

/// Events retained by a collector
pub const MAX_TELEMETRY_EVENTS: usize = 10_000;

/// Telemetry event types
#[derive(Debug, Clone)]
pub enum TelemetryEvent {
    // Chain events
    ChainStarted {
        execution_id: String,
        tool_count: usize,
        timestamp: Instant,
    },
    ResolutionDegraded {
        execution_id: String,
        stalled: Vec<String>,
        timestamp: Instant,
    },
    ChainCompleted {
        execution_id: String,
        success: bool,
        duration_ms: u64,
        timestamp: Instant,
    },
    ChainAborted {
        execution_id: String,
        tool: String,
        timestamp: Instant,
    },

    // Tool events
    ToolStarted {
        tool: String,
        role: String,
        timestamp: Instant,
    },
    ToolCompleted {
        tool: String,
        duration_ms: u64,
        success: bool,
        timestamp: Instant,
    },
}

/// Telemetry statistics
#[derive(Debug, Clone, Default)]
pub struct TelemetryStats {
    pub chains_started: usize,
    pub chains_completed: usize,
    pub chains_succeeded: usize,
    pub chains_aborted: usize,
    pub degraded_resolutions: usize,
    pub tools_executed: usize,
    pub tools_succeeded: usize,
    pub tools_failed: usize,
}

#[derive(Debug, Default)]
struct Inner {
    events: VecDeque<TelemetryEvent>,
    stats: TelemetryStats,
    per_tool: HashMap<String, ToolStats>,
}

/// Telemetry collector
#[derive(Clone)]
pub struct TelemetryCollector {
    inner: Arc<Mutex<Inner>>,
    start_time: Instant,
}

impl TelemetryCollector {
    /// Create a new telemetry collector
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            start_time: Instant::now(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record an event
    pub fn record(&self, event: TelemetryEvent) {
        let mut guard = self.lock();
        let inner = &mut *guard;
        match &event {
            TelemetryEvent::ChainStarted { .. } => {
                inner.stats.chains_started += 1;
            }
            TelemetryEvent::ResolutionDegraded { .. } => {
                inner.stats.degraded_resolutions += 1;
            }
            TelemetryEvent::ChainCompleted { success, .. } => {
                inner.stats.chains_completed += 1;
                if *success {
                    inner.stats.chains_succeeded += 1;
                }
            }
            TelemetryEvent::ChainAborted { .. } => {
                inner.stats.chains_aborted += 1;
            }
            TelemetryEvent::ToolStarted { .. } => {
                inner.stats.tools_executed += 1;
            }
            TelemetryEvent::ToolCompleted {
                tool,
                duration_ms,
                success,
                ..
            } => {
                let per_tool = inner.per_tool.entry(tool.clone()).or_default();
                if *success {
                    per_tool.record_success(*duration_ms);
                    inner.stats.tools_succeeded += 1;
                } else {
                    per_tool.record_failure(*duration_ms);
                    inner.stats.tools_failed += 1;
                }
            }
        }

        if inner.events.len() >= MAX_TELEMETRY_EVENTS {
            inner.events.pop_front();
        }
        inner.events.push_back(event);
    }

    /// Get current statistics
    pub fn get_stats(&self) -> TelemetryStats {
        self.lock().stats.clone()
    }

    /// Statistics for one tool
    pub fn tool_stats(&self, tool: &str) -> Option<ToolStats> {
        self.lock().per_tool.get(tool).cloned()
    }

    /// Get elapsed time since start
    pub fn elapsed(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }

    /// Get event count
    pub fn event_count(&self) -> usize {
        self.lock().events.len()
    }

    /// Get recent events (last n)
    pub fn recent_events(&self, n: usize) -> Vec<TelemetryEvent> {
        let inner = self.lock();
        let start = inner.events.len().saturating_sub(n);
        inner.events.iter().skip(start).cloned().collect()
    }

    /// Calculate tool success rate
    pub fn tool_success_rate(&self) -> f64 {
        let inner = self.lock();
        let total = inner.stats.tools_succeeded + inner.stats.tools_failed;
        if total == 0 {
            1.0
        } else {
            inner.stats.tools_succeeded as f64 / total as f64
        }
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Simple telemetry display
pub struct TelemetryDisplay {
    collector: TelemetryCollector,
    verbosity: crate::cli::Verbosity,
}

impl TelemetryDisplay {
    /// Create a new display
    pub fn new(collector: TelemetryCollector, verbosity: crate::cli::Verbosity) -> Self {
        Self {
            collector,
            verbosity,
        }
    }

    /// Display summary statistics
    pub fn display_summary(&self) {
        if !self.verbosity.show_progress() {
            return;
        }
        let stats = self.collector.get_stats();
        let elapsed = self.collector.elapsed();

        println!("\n📊 Run Summary");
        println!("─────────────────────────────────────");
        println!("Duration:          {:?}", elapsed);
        println!("Chains completed:  {}", stats.chains_completed);
        println!("Chains aborted:    {}", stats.chains_aborted);
        println!("Tools executed:    {}", stats.tools_executed);
        println!("Success rate:      {:.1}%", self.collector.tool_success_rate() * 100.0);
        println!("Degraded orders:   {}", stats.degraded_resolutions);
        println!();
    }

    /// Check if should show detailed output
    pub fn should_show_details(&self) -> bool {
        self.verbosity.show_events()
    }
}

/// Install the global `tracing` subscriber
///
/// `RUST_LOG` takes precedence over `level`.
pub fn init_logging(level: &str) -> anyhow::Result<()> {
    use anyhow::Context;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed(tool: &str, success: bool) -> TelemetryEvent {
        TelemetryEvent::ToolCompleted {
            tool: tool.to_string(),
            duration_ms: 100,
            success,
            timestamp: Instant::now(),
        }
    }

    #[test]
    fn test_collector_creation() {
        let collector = TelemetryCollector::new();
        assert_eq!(collector.event_count(), 0);
        let stats = collector.get_stats();
        assert_eq!(stats.tools_executed, 0);
    }

    #[test]
    fn test_record_tool_events() {
        let collector = TelemetryCollector::new();

        collector.record(TelemetryEvent::ToolStarted {
            tool: "store_document".to_string(),
            role: "librarian".to_string(),
            timestamp: Instant::now(),
        });
        collector.record(completed("store_document", true));

        let stats = collector.get_stats();
        assert_eq!(stats.tools_executed, 1);
        assert_eq!(stats.tools_succeeded, 1);
        assert_eq!(stats.tools_failed, 0);
        assert_eq!(collector.tool_stats("store_document").unwrap().successful_executions, 1);
    }

    #[test]
    fn test_tool_success_rate() {
        let collector = TelemetryCollector::new();
        assert_eq!(collector.tool_success_rate(), 1.0);

        collector.record(completed("a", true));
        collector.record(completed("b", true));
        collector.record(completed("c", false));

        let rate = collector.tool_success_rate();
        assert!((rate - 0.666).abs() < 0.01);
    }

    #[test]
    fn test_chain_events() {
        let collector = TelemetryCollector::new();
        collector.record(TelemetryEvent::ChainStarted {
            execution_id: "exec_1".to_string(),
            tool_count: 2,
            timestamp: Instant::now(),
        });
        collector.record(TelemetryEvent::ResolutionDegraded {
            execution_id: "exec_1".to_string(),
            stalled: vec!["a".to_string()],
            timestamp: Instant::now(),
        });
        collector.record(TelemetryEvent::ChainAborted {
            execution_id: "exec_1".to_string(),
            tool: "authenticate_user".to_string(),
            timestamp: Instant::now(),
        });

        let stats = collector.get_stats();
        assert_eq!(stats.chains_started, 1);
        assert_eq!(stats.degraded_resolutions, 1);
        assert_eq!(stats.chains_aborted, 1);
        assert_eq!(stats.chains_completed, 0);
    }

    #[test]
    fn test_recent_events() {
        let collector = TelemetryCollector::new();
        for i in 0..10 {
            collector.record(completed(&format!("tool{}", i), true));
        }

        let recent = collector.recent_events(3);
        assert_eq!(recent.len(), 3);
        match &recent[2] {
            TelemetryEvent::ToolCompleted { tool, .. } => assert_eq!(tool, "tool9"),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_elapsed_time() {
        let collector = TelemetryCollector::new();
        assert!(collector.elapsed().as_millis() < 100);
    }
}
