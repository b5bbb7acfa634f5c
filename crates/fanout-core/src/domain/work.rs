//! Work model: what goes into the pool and what comes out.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::FanoutError;
use super::ids::WorkerId;

/// A unit of work submitted by the producer.
///
/// Opaque integer. Moved into the pool on submission and then into whichever
/// worker claims it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkItem(i64);

impl WorkItem {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(self) -> i64 {
        self.0
    }
}

impl From<i64> for WorkItem {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<i32> for WorkItem {
    fn from(value: i32) -> Self {
        Self(value.into())
    }
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The output produced by processing one `WorkItem`.
///
/// `value` is the computed result. The other fields are provenance:
/// `seq` is the item's position in the submitted batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkResult {
    pub seq: u64,
    pub item: WorkItem,
    pub value: i64,
    pub worker: WorkerId,
}

/// An item whose processing failed under `FailurePolicy::SkipAndReport`.
#[derive(Debug, Clone, Serialize)]
pub struct ItemFailure {
    pub seq: u64,
    pub item: WorkItem,
    pub worker: WorkerId,
    /// Number of attempts made (> 1 only when retries happened).
    pub attempts: u32,
    pub code: u16,
    pub message: String,
}

impl ItemFailure {
    pub fn new(seq: u64, item: WorkItem, worker: WorkerId, attempts: u32, error: &FanoutError) -> Self {
        Self {
            seq,
            item,
            worker,
            attempts,
            code: error.code(),
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn work_item_is_transparent_in_json() {
        let item = WorkItem::new(42);
        assert_eq!(serde_json::to_string(&item).unwrap(), "42");
        let back: WorkItem = serde_json::from_str("-7").unwrap();
        assert_eq!(back, WorkItem::from(-7));
    }

    #[test]
    fn item_failure_captures_error_code() {
        let err = FanoutError::NegativeValue { value: -5 };
        let failure = ItemFailure::new(3, WorkItem::new(-5), WorkerId::new(2), 1, &err);
        assert_eq!(failure.code, 400);
        assert_eq!(failure.seq, 3);
        assert!(failure.message.contains("negative value not allowed"));
    }
}
