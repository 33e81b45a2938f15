//! `get_task [task_id]` - status query for a long-running task.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::{AgentError, ExecutionClass, TaskId};
use crate::tracker::TaskTracker;
use crate::typed::{Handler, Message};

#[derive(Debug, Deserialize)]
pub struct GetTask {
    pub task_id: String,
}

impl Message for GetTask {
    const NAME: &'static str = "get_task";
    const CLASS: ExecutionClass = ExecutionClass::Sync;
}

pub struct GetTaskHandler {
    tracker: Arc<dyn TaskTracker>,
}

impl GetTaskHandler {
    pub fn new(tracker: Arc<dyn TaskTracker>) -> Self {
        Self { tracker }
    }
}

#[async_trait]
impl Handler<GetTask> for GetTaskHandler {
    async fn handle(&self, message: GetTask) -> Result<serde_json::Value, AgentError> {
        let not_found = || AgentError::TaskNotFound {
            id: message.task_id.clone(),
        };
        // an id we could never have issued is just another unknown task
        let id: TaskId = message.task_id.parse().map_err(|_| not_found())?;
        let record = self.tracker.get_state(id).await.ok_or_else(not_found)?;
        record.outcome()
    }
}
