use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::{AgentError, ExecutionClass};
use crate::typed::{Handler, Message};

#[derive(Debug, Deserialize)]
pub struct Ping {}

impl Message for Ping {
    const NAME: &'static str = "ping";
    const CLASS: ExecutionClass = ExecutionClass::Sync;
}

pub struct PingHandler;

#[async_trait]
impl Handler<Ping> for PingHandler {
    async fn handle(&self, _message: Ping) -> Result<serde_json::Value, AgentError> {
        Ok(serde_json::json!("pong"))
    }
}
