//! Worker state machine.

use serde::{Deserialize, Serialize};

/// Per-worker state.
///
/// State transitions:
/// - Idle -> Claimed -> Processing -> Publishing -> Idle
/// - Idle -> Done (input queue closed and drained, or batch aborted)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkerState {
    /// Waiting for the next item.
    Idle,

    /// Took an item off the input queue.
    Claimed,

    /// Running the processor (including retries).
    Processing,

    /// Pushing the result or failure to the output queue.
    Publishing,

    /// Exited.
    Done,
}

impl WorkerState {
    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(self, WorkerState::Done)
    }

    pub fn can_transition_to(self, next: WorkerState) -> bool {
        use WorkerState::*;
        matches!(
            (self, next),
            (Idle, Claimed)
                | (Claimed, Processing)
                | (Processing, Publishing)
                | (Publishing, Idle)
                | (Idle, Done)
        )
    }
}
