//! Task Tracker: lifecycle state of long-running tasks, keyed by task id.

mod memory;
mod record;
mod state;

pub use memory::InMemoryTaskTracker;
pub use record::{TaskFailure, TaskRecord, TaskView, Transition};
pub use state::TaskState;

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{MessageName, TaskId};
use crate::observability::TaskCounts;

/// A transition the tracker refused to apply.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("task {0} is not tracked")]
    NotFound(TaskId),

    #[error("task {id} cannot move from {from:?} to {to:?}")]
    Illegal {
        id: TaskId,
        from: TaskState,
        to: TaskState,
    },
}

/// Tracker port.
///
/// Design intent:
/// - Readers (`get_state`, `counts`) never wait on a running handler; the
///   handler only holds the tracker while a transition is applied.
/// - The dispatcher's spawned task is the only writer for its task id.
#[async_trait]
pub trait TaskTracker: Send + Sync {
    /// Register a new `Queued` task for `message`.
    async fn create(&self, message: &MessageName) -> TaskId;

    /// Snapshot of a task, `None` if the id was never dispatched.
    async fn get_state(&self, id: TaskId) -> Option<TaskRecord>;

    /// Apply a state change. Illegal changes are logged and rejected.
    async fn transition(&self, id: TaskId, transition: Transition) -> Result<(), TransitionError>;

    /// Wait until the task is terminal or `timeout` passes.
    async fn wait_terminal(&self, id: TaskId, timeout: Duration) -> Option<TaskRecord>;

    async fn counts(&self) -> TaskCounts;
}
