use serde::{Deserialize, Serialize};

/// Number of tracked tasks per state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCounts {
    pub queued: usize,
    pub running: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl TaskCounts {
    pub fn total(&self) -> usize {
        self.queued + self.running + self.succeeded + self.failed
    }

    /// Tasks that have not reached a terminal state yet.
    pub fn in_flight(&self) -> usize {
        self.queued + self.running
    }
}
