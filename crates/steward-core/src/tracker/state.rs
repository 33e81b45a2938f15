//! Task state machine for the tracker.

use serde::{Deserialize, Serialize};

/// Lifecycle of a long-running task.
///
/// State transitions:
/// - Queued -> Running -> Succeeded
/// - Queued -> Running -> Failed
///
/// Terminal states accept no further transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Created by dispatch, not yet picked up by its tokio task.
    Queued,

    /// Handler is executing.
    Running,

    /// Handler returned a value.
    Succeeded,

    /// Handler returned an error or panicked.
    Failed,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Succeeded | TaskState::Failed)
    }

    pub fn can_transition_to(self, next: TaskState) -> bool {
        matches!(
            (self, next),
            (TaskState::Queued, TaskState::Running)
                | (TaskState::Running, TaskState::Succeeded)
                | (TaskState::Running, TaskState::Failed)
        )
    }
}
