//! In-memory tracker implementation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Notify, RwLock};
use tracing::{debug, warn};

use super::{TaskRecord, TaskState, TaskTracker, Transition, TransitionError};
use crate::domain::{MessageName, TaskId};
use crate::observability::TaskCounts;
use crate::ports::{Clock, IdGenerator};

/// In-memory tracker.
///
/// Records stay until the process exits; retention is somebody else's job.
pub struct InMemoryTaskTracker {
    records: RwLock<HashMap<TaskId, TaskRecord>>,
    notify: Notify,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl InMemoryTaskTracker {
    pub fn new(ids: Arc<dyn IdGenerator>, clock: Arc<dyn Clock>) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            notify: Notify::new(),
            ids,
            clock,
        }
    }
}

#[async_trait]
impl TaskTracker for InMemoryTaskTracker {
    async fn create(&self, message: &MessageName) -> TaskId {
        let id = self.ids.generate_task_id();
        let record = TaskRecord::new(id, message.clone(), self.clock.now());
        self.records.write().await.insert(id, record);
        debug!(task_id = %id, message = %message, "task queued");
        id
    }

    async fn get_state(&self, id: TaskId) -> Option<TaskRecord> {
        self.records.read().await.get(&id).cloned()
    }

    async fn transition(&self, id: TaskId, transition: Transition) -> Result<(), TransitionError> {
        let result = {
            let mut records = self.records.write().await;
            let Some(record) = records.get_mut(&id) else {
                warn!(task_id = %id, "transition for untracked task");
                return Err(TransitionError::NotFound(id));
            };
            let from = record.state;
            record
                .apply(transition, self.clock.now())
                .map(|()| record.state)
                .map_err(|rejected| TransitionError::Illegal {
                    id,
                    from,
                    to: rejected.target(),
                })
        }; // lock released before waking waiters

        match result {
            Ok(state) => {
                debug!(task_id = %id, ?state, "task transitioned");
                if state.is_terminal() {
                    self.notify.notify_waiters();
                }
                Ok(())
            }
            Err(err) => {
                warn!(task_id = %id, error = %err, "rejected task transition");
                Err(err)
            }
        }
    }

    async fn wait_terminal(&self, id: TaskId, timeout: Duration) -> Option<TaskRecord> {
        let wait = async {
            loop {
                // register interest before looking, so a transition in between is not missed
                let notified = self.notify.notified();
                tokio::pin!(notified);
                notified.as_mut().enable();

                match self.get_state(id).await {
                    None => return None,
                    Some(record) if record.state.is_terminal() => return Some(record),
                    Some(_) => notified.await,
                }
            }
        };
        tokio::time::timeout(timeout, wait).await.ok().flatten()
    }

    async fn counts(&self) -> TaskCounts {
        let records = self.records.read().await;
        let mut counts = TaskCounts::default();
        for record in records.values() {
            match record.state {
                TaskState::Queued => counts.queued += 1,
                TaskState::Running => counts.running += 1,
                TaskState::Succeeded => counts.succeeded += 1,
                TaskState::Failed => counts.failed += 1,
            }
        }
        counts
    }
}
