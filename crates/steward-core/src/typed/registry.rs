//! MessageRegistry - command name to handler descriptor.
//!
//! Built once at startup (mutable), then shared read-only behind an `Arc`, so
//! dispatch never takes a lock to resolve a name.

use std::collections::HashMap;
use std::sync::Arc;

use super::handler::{DynHandler, Handler, TypedHandler};
use super::message::Message;

/// MessageRegistry stores type-erased handlers by command name.
///
/// # Example
/// ```ignore
/// let mut registry = MessageRegistry::new();
/// registry.register::<MigrateDisk, _>(MigrateDiskHandler::new(&context))?;
/// let handler = registry.get("migrate_disk");
/// ```
#[derive(Default)]
pub struct MessageRegistry {
    handlers: HashMap<&'static str, Arc<dyn DynHandler>>,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Handler for message '{0}' is already registered")]
    AlreadyRegistered(String),
}

impl MessageRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn register<M: Message, H: Handler<M> + 'static>(
        &mut self,
        handler: H,
    ) -> Result<(), RegistryError> {
        if self.handlers.contains_key(M::NAME) {
            return Err(RegistryError::AlreadyRegistered(M::NAME.to_string()));
        }
        self.handlers
            .insert(M::NAME, Arc::new(TypedHandler::<M, H>::new(handler)));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn DynHandler>> {
        self.handlers.get(name).cloned()
    }

    pub fn registered_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().map(|n| n.to_string()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
