//! Dispatcher - resolve a command name and run it by its execution class.
//!
//! - Sync: awaited on the caller's task, result returned directly
//! - LongRunning: a `Queued` task is created, the handler is spawned, and the
//!   task id is returned immediately

use std::sync::Arc;

use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::domain::{AgentError, Envelope, ErrorKind, ExecutionClass, MessageName, TaskId};
use crate::tracker::{TaskFailure, TaskTracker, Transition};
use crate::typed::{DynHandler, MessageRegistry};

/// What a dispatch hands back to its caller.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    Value(serde_json::Value),
    Task(TaskId),
}

#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<MessageRegistry>,
    tracker: Arc<dyn TaskTracker>,
}

impl Dispatcher {
    pub fn new(registry: MessageRegistry, tracker: Arc<dyn TaskTracker>) -> Self {
        Self {
            registry: Arc::new(registry),
            tracker,
        }
    }

    pub fn tracker(&self) -> &Arc<dyn TaskTracker> {
        &self.tracker
    }

    pub fn registered_names(&self) -> Vec<String> {
        self.registry.registered_names()
    }

    pub async fn dispatch(
        &self,
        name: &str,
        arguments: Vec<serde_json::Value>,
    ) -> Result<DispatchOutcome, AgentError> {
        let handler = self
            .registry
            .get(name)
            .ok_or_else(|| AgentError::UnknownMessage {
                name: name.to_string(),
            })?;

        match handler.class() {
            ExecutionClass::Sync => {
                debug!(message = name, "running sync message");
                handler
                    .handle_dyn(arguments)
                    .await
                    .map(DispatchOutcome::Value)
            }
            ExecutionClass::LongRunning => {
                let message = MessageName::new(handler.name());
                let id = self.tracker.create(&message).await;
                let span = info_span!("task", task_id = %id, message = %message);
                tokio::spawn(
                    run_task(id, handler, arguments, Arc::clone(&self.tracker)).instrument(span),
                );
                Ok(DispatchOutcome::Task(id))
            }
        }
    }

    pub async fn dispatch_envelope(
        &self,
        envelope: Envelope,
    ) -> Result<DispatchOutcome, AgentError> {
        let (name, arguments) = envelope.into_parts();
        self.dispatch(name.as_str(), arguments).await
    }
}

/// Drive one long-running task to a terminal state.
///
/// The handler runs in its own spawned task so a panic lands here as a
/// `JoinError` and the task still ends `Failed`.
async fn run_task(
    id: TaskId,
    handler: Arc<dyn DynHandler>,
    arguments: Vec<serde_json::Value>,
    tracker: Arc<dyn TaskTracker>,
) {
    if let Err(e) = tracker.transition(id, Transition::Start).await {
        warn!(error = %e, "task could not be started");
        return;
    }
    info!("task started");

    let joined = tokio::spawn(async move { handler.handle_dyn(arguments).await }.in_current_span())
        .await;

    let transition = match joined {
        Ok(Ok(value)) => {
            info!("task succeeded");
            Transition::Succeed(value)
        }
        Ok(Err(err)) => {
            warn!(error = %err, kind = ?err.kind(), "task failed");
            Transition::Fail(TaskFailure::from(&err))
        }
        Err(join_error) => {
            error!(error = %join_error, "task handler aborted");
            Transition::Fail(TaskFailure {
                message: format!("handler aborted: {join_error}"),
                kind: ErrorKind::Infrastructure,
            })
        }
    };

    if let Err(e) = tracker.transition(id, transition).await {
        warn!(error = %e, "task outcome was not recorded");
    }
}
