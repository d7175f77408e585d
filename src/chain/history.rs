//! Bounded execution history
//!
//! Fixed-capacity ring buffer of execution records. The oldest record is
//! evicted when a push would exceed capacity. Safe to share between chains
//! running concurrently on one executor.

use crate::chain::types::ExecutionRecord;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Records retained by default
pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;

/// Records returned by `recent` when the caller gives no limit
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Ring buffer of execution records
#[derive(Debug)]
pub struct ExecutionHistory {
    records: Mutex<VecDeque<ExecutionRecord>>,
    capacity: usize,
}

impl ExecutionHistory {
    /// Create history holding at most `capacity` records (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: Mutex::new(VecDeque::with_capacity(capacity.min(DEFAULT_HISTORY_CAPACITY))),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<ExecutionRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a record, returning the evicted one if the buffer was full
    pub fn push(&self, record: ExecutionRecord) -> Option<ExecutionRecord> {
        let mut records = self.lock();
        let evicted = if records.len() >= self.capacity {
            records.pop_front()
        } else {
            None
        };
        records.push_back(record);
        evicted
    }

    /// Most recent `limit` records, oldest first
    pub fn recent(&self, limit: usize) -> Vec<ExecutionRecord> {
        let records = self.lock();
        let start = records.len().saturating_sub(limit);
        records.iter().skip(start).cloned().collect()
    }

    /// Look up a record by execution id
    pub fn find(&self, execution_id: &str) -> Option<ExecutionRecord> {
        self.lock()
            .iter()
            .find(|record| record.execution_id == execution_id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every record
    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl Default for ExecutionHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(requester: &str) -> ExecutionRecord {
        ExecutionRecord::start(requester, None)
    }

    #[test]
    fn test_recent_returns_newest_last() {
        let history = ExecutionHistory::new(10);
        for i in 0..5 {
            history.push(record(&format!("r{}", i)));
        }

        let recent = history.recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].requester_id, "r3");
        assert_eq!(recent[1].requester_id, "r4");
    }

    #[test]
    fn test_limit_larger_than_history() {
        let history = ExecutionHistory::new(10);
        history.push(record("only"));
        assert_eq!(history.recent(DEFAULT_HISTORY_LIMIT).len(), 1);
        assert!(history.recent(0).is_empty());
    }

    #[test]
    fn test_oldest_evicted_at_capacity() {
        let history = ExecutionHistory::new(3);
        for i in 0..3 {
            assert!(history.push(record(&format!("r{}", i))).is_none());
        }

        let evicted = history.push(record("r3")).unwrap();
        assert_eq!(evicted.requester_id, "r0");
        assert_eq!(history.len(), 3);
        assert_eq!(history.recent(10)[0].requester_id, "r1");
    }

    #[test]
    fn test_zero_capacity_keeps_one() {
        let history = ExecutionHistory::new(0);
        history.push(record("a"));
        history.push(record("b"));
        assert_eq!(history.capacity(), 1);
        assert_eq!(history.recent(5)[0].requester_id, "b");
    }

    #[test]
    fn test_find_and_clear() {
        let history = ExecutionHistory::default();
        let rec = record("x");
        let id = rec.execution_id.clone();
        history.push(rec);

        assert_eq!(history.find(&id).unwrap().requester_id, "x");
        history.clear();
        assert!(history.is_empty());
        assert!(history.find(&id).is_none());
    }

    #[test]
    fn test_concurrent_pushes() {
        let history = std::sync::Arc::new(ExecutionHistory::new(50));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let history = history.clone();
                std::thread::spawn(move || {
                    for i in 0..20 {
                        history.push(record(&format!("{}-{}", t, i)));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(history.len(), 50);
    }
}
