//! Bounded execution history for diagnostics.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of records retained by default.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Terminal state of one execution request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    Completed,
    Cancelled,
    Failed,
}

/// One executed (or attempted) command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub id: String,
    pub status: ExecutionStatus,
    pub at: DateTime<Utc>,
}

/// Ring of recent execution records, oldest dropped first.
#[derive(Debug, Clone)]
pub struct ExecutionHistory {
    entries: VecDeque<ExecutionRecord>,
    limit: usize,
}

impl Default for ExecutionHistory {
    fn default() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }
}

impl ExecutionHistory {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(limit.min(64)),
            limit,
        }
    }

    /// Appends a record, evicting the oldest entry at capacity.
    pub fn record(&mut self, id: &str, status: ExecutionStatus) {
        if self.entries.len() == self.limit {
            self.entries.pop_front();
        }
        self.entries.push_back(ExecutionRecord {
            id: id.to_string(),
            status,
            at: Utc::now(),
        });
    }

    /// Records in chronological order.
    pub fn iter(&self) -> impl Iterator<Item = &ExecutionRecord> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_evicts_oldest_at_capacity() {
        let mut history = ExecutionHistory::with_limit(2);
        history.record("test.a", ExecutionStatus::Completed);
        history.record("test.b", ExecutionStatus::Cancelled);
        history.record("test.c", ExecutionStatus::Failed);

        let ids: Vec<&str> = history.iter().map(|record| record.id.as_str()).collect();
        assert_eq!(ids, vec!["test.b", "test.c"]);
    }
}
