//! Task record: lifecycle state + outcome of one long-running message.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::TaskState;
use crate::domain::{AgentError, ErrorKind, MessageName, TaskId};

/// Structured failure detail kept on a `Failed` task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFailure {
    pub message: String,
    pub kind: ErrorKind,
}

impl From<&AgentError> for TaskFailure {
    fn from(err: &AgentError) -> Self {
        Self {
            message: err.to_string(),
            kind: err.kind(),
        }
    }
}

impl From<TaskFailure> for AgentError {
    fn from(failure: TaskFailure) -> Self {
        AgentError::TaskFailed {
            message: failure.message,
            kind: failure.kind,
        }
    }
}

/// A state change requested of the tracker.
#[derive(Debug, Clone)]
pub enum Transition {
    Start,
    Succeed(serde_json::Value),
    Fail(TaskFailure),
}

impl Transition {
    pub fn target(&self) -> TaskState {
        match self {
            Transition::Start => TaskState::Running,
            Transition::Succeed(_) => TaskState::Succeeded,
            Transition::Fail(_) => TaskState::Failed,
        }
    }
}

/// Single source of truth for a task.
///
/// Only `apply` mutates state, and only along `TaskState::can_transition_to`.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskRecord {
    pub id: TaskId,
    pub message: MessageName,
    pub state: TaskState,
    pub value: Option<serde_json::Value>,
    pub failure: Option<TaskFailure>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl TaskRecord {
    pub fn new(id: TaskId, message: MessageName, now: DateTime<Utc>) -> Self {
        Self {
            id,
            message,
            state: TaskState::Queued,
            value: None,
            failure: None,
            created_at: now,
            started_at: None,
            finished_at: None,
        }
    }

    /// Apply `transition`, or hand it back if it would break monotonicity.
    pub fn apply(&mut self, transition: Transition, now: DateTime<Utc>) -> Result<(), Transition> {
        if !self.state.can_transition_to(transition.target()) {
            return Err(transition);
        }
        self.state = transition.target();
        match transition {
            Transition::Start => self.started_at = Some(now),
            Transition::Succeed(value) => {
                self.value = Some(value);
                self.finished_at = Some(now);
            }
            Transition::Fail(failure) => {
                self.failure = Some(failure);
                self.finished_at = Some(now);
            }
        }
        Ok(())
    }

    pub fn view(&self) -> TaskView {
        TaskView {
            agent_task_id: self.id,
            state: self.state,
        }
    }

    /// What a status query answers with.
    ///
    /// Unfinished tasks show their view, succeeded ones their value, failed
    /// ones re-raise the recorded failure.
    pub fn outcome(&self) -> Result<serde_json::Value, AgentError> {
        match (self.state, &self.value, &self.failure) {
            (TaskState::Succeeded, Some(value), _) => Ok(value.clone()),
            (TaskState::Succeeded, None, _) => Ok(serde_json::json!({})),
            (TaskState::Failed, _, Some(failure)) => Err(failure.clone().into()),
            (TaskState::Failed, _, None) => Err(AgentError::TaskFailed {
                message: format!("task {} failed", self.id),
                kind: ErrorKind::Infrastructure,
            }),
            (TaskState::Queued | TaskState::Running, _, _) => {
                Ok(serde_json::json!(self.view()))
            }
        }
    }
}

/// What a status query shows for an unfinished task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskView {
    pub agent_task_id: TaskId,
    pub state: TaskState,
}
