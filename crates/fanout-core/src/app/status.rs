//! Status - バッチ実行結果のレポート

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{BatchId, ItemFailure, WorkResult, WorkerId, WorkerState};
use crate::observability::BatchCounts;

/// What one worker did during a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerReport {
    pub worker: WorkerId,
    /// Items claimed and published (successes and failures).
    pub processed: usize,
    pub final_state: WorkerState,
}

/// Everything a finished batch produced.
///
/// `results` is in arrival order, not submission order.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub batch_id: BatchId,
    pub worker_count: usize,
    pub submitted: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub results: Vec<WorkResult>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<ItemFailure>,
    pub workers: Vec<WorkerReport>,
}

impl BatchReport {
    pub fn counts(&self) -> BatchCounts {
        BatchCounts {
            submitted: self.submitted,
            succeeded: self.results.len(),
            failed: self.failures.len(),
        }
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    /// Result values in arrival order.
    pub fn values(&self) -> Vec<i64> {
        self.results.iter().map(|r| r.value).collect()
    }

    /// Results sorted by submission sequence.
    pub fn into_ordered_results(mut self) -> Vec<WorkResult> {
        self.results.sort_by_key(|r| r.seq);
        self.results
    }
}
