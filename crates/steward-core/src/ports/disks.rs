//! DiskLocator port - resolves a disk cid to the device the agent can mount.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::AgentError;

/// An attached storage device, known to the agent by its cid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disk {
    pub cid: String,
    pub partition_path: String,
}

#[async_trait]
pub trait DiskLocator: Send + Sync {
    /// Fails with `AgentError::DiskNotFound` for an unknown cid.
    async fn find_disk_by_cid(&self, cid: &str) -> Result<Disk, AgentError>;
}
