use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of an agent command (`migrate_disk`, `get_task`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageName(String);

impl MessageName {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// How the dispatcher runs a handler, fixed when the handler is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionClass {
    /// Runs inline; the caller gets the handler's result.
    Sync,
    /// Runs as its own tokio task; the caller gets a task id.
    LongRunning,
}

/// Command name + ordered argument list, as delivered by the transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    name: MessageName,
    #[serde(default)]
    arguments: Vec<serde_json::Value>,
}

impl Envelope {
    pub fn new(name: MessageName, arguments: Vec<serde_json::Value>) -> Self {
        Self { name, arguments }
    }

    pub fn name(&self) -> &MessageName {
        &self.name
    }

    pub fn arguments(&self) -> &[serde_json::Value] {
        &self.arguments
    }

    pub fn into_parts(self) -> (MessageName, Vec<serde_json::Value>) {
        (self.name, self.arguments)
    }
}
