//! Infrastructure port - what the snapshot job needs from the cloud layer.

use async_trait::async_trait;

use crate::domain::{AgentError, ManagedInstance, SnapshotId, SnapshotManifest};

#[async_trait]
pub trait Infrastructure: Send + Sync {
    /// Every instance the director currently manages.
    async fn managed_instances(&self) -> Result<Vec<ManagedInstance>, AgentError>;

    /// Snapshot `disk_cid` and persist `manifest` alongside it.
    async fn snapshot_disk(
        &self,
        disk_cid: &str,
        manifest: &SnapshotManifest,
    ) -> Result<SnapshotId, AgentError>;
}
