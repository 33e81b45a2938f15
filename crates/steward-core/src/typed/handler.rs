//! Handler trait - executes one typed message.
//!
//! - `Handler<M>` is what actions implement: typed in, JSON value out.
//! - `DynHandler` is the object-safe form the registry stores.
//! - `TypedHandler<M, H>` erases `M` by decoding the argument array first.

use std::marker::PhantomData;

use async_trait::async_trait;

use super::message::Message;
use crate::domain::{AgentError, ExecutionClass};

#[async_trait]
pub trait Handler<M: Message>: Send + Sync {
    async fn handle(&self, message: M) -> Result<serde_json::Value, AgentError>;
}

#[async_trait]
pub trait DynHandler: Send + Sync {
    async fn handle_dyn(&self, arguments: Vec<serde_json::Value>)
    -> Result<serde_json::Value, AgentError>;

    fn name(&self) -> &'static str;

    fn class(&self) -> ExecutionClass;
}

pub struct TypedHandler<M: Message, H: Handler<M>> {
    handler: H,
    _marker: PhantomData<fn() -> M>,
}

impl<M: Message, H: Handler<M>> TypedHandler<M, H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            _marker: PhantomData,
        }
    }
}

/// Decode an ordered argument list into `M`.
pub fn decode_arguments<M: Message>(arguments: Vec<serde_json::Value>) -> Result<M, AgentError> {
    serde_json::from_value(serde_json::Value::Array(arguments)).map_err(|e| {
        AgentError::InvalidArguments {
            message: M::NAME.to_string(),
            cause: e.to_string(),
        }
    })
}

#[async_trait]
impl<M: Message, H: Handler<M>> DynHandler for TypedHandler<M, H> {
    async fn handle_dyn(
        &self,
        arguments: Vec<serde_json::Value>,
    ) -> Result<serde_json::Value, AgentError> {
        let message = decode_arguments::<M>(arguments)?;
        self.handler.handle(message).await
    }

    fn name(&self) -> &'static str {
        M::NAME
    }

    fn class(&self) -> ExecutionClass {
        M::CLASS
    }
}
