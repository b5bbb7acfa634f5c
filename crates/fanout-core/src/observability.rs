use serde::{Deserialize, Serialize};

/// Per-batch outcome counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchCounts {
    pub submitted: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchCounts {
    /// Every submitted item is accounted for exactly once.
    pub fn is_complete(&self) -> bool {
        self.succeeded + self.failed == self.submitted
    }
}
