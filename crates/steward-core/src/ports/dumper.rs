//! DatabaseDumper port - produces the director database dump for backups.

use std::path::Path;

use async_trait::async_trait;

use crate::domain::AgentError;

#[async_trait]
pub trait DatabaseDumper: Send + Sync {
    /// Write a complete dump to `destination`. A failed or empty dump is an
    /// error, never a truncated file reported as success.
    async fn dump(&self, destination: &Path) -> Result<(), AgentError>;
}
