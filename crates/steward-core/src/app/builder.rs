//! AgentBuilder - registration and wiring at startup.

use std::sync::Arc;

use crate::app::Dispatcher;
use crate::tracker::TaskTracker;
use crate::typed::{Handler, Message, MessageRegistry, RegistryError};

/// Builds a `Dispatcher`.
///
/// # Example
/// ```ignore
/// let dispatcher = AgentBuilder::new(tracker)
///     .register::<Ping, _>(PingHandler)?
///     .expect_messages(&["ping"])
///     .build()?;
/// ```
///
/// # Fail-fast
/// - `register()` rejects a command name that is already taken
/// - `build()` checks that every name given to `expect_messages()` is registered
pub struct AgentBuilder {
    registry: MessageRegistry,
    tracker: Arc<dyn TaskTracker>,
    expected_messages: Option<Vec<String>>,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing messages: {0:?}. These messages were expected but not registered.")]
    MissingMessages(Vec<String>),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl AgentBuilder {
    pub fn new(tracker: Arc<dyn TaskTracker>) -> Self {
        Self {
            registry: MessageRegistry::new(),
            tracker,
            expected_messages: None,
        }
    }

    pub fn register<M: Message, H: Handler<M> + 'static>(
        mut self,
        handler: H,
    ) -> Result<Self, RegistryError> {
        self.registry.register::<M, H>(handler)?;
        Ok(self)
    }

    pub fn expect_messages(mut self, names: &[&str]) -> Self {
        self.expected_messages = Some(names.iter().map(|n| n.to_string()).collect());
        self
    }

    pub fn build(self) -> Result<Dispatcher, BuildError> {
        if let Some(expected) = &self.expected_messages {
            let registered = self.registry.registered_names();
            let missing: Vec<String> = expected
                .iter()
                .filter(|name| !registered.contains(name))
                .cloned()
                .collect();
            if !missing.is_empty() {
                return Err(BuildError::MissingMessages(missing));
            }
        }
        Ok(Dispatcher::new(self.registry, self.tracker))
    }
}
