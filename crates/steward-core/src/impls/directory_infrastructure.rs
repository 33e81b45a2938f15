//! DirectoryInfrastructure - a file-backed cloud layer.
//!
//! The instance inventory comes from configuration and a "snapshot" is the
//! manifest file itself, written to `<snapshot_dir>/<snapshot-id>`. This is
//! what a director without a real IaaS (dev boxes, integration sandboxes)
//! runs against.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::domain::{AgentError, ManagedInstance, SnapshotId, SnapshotManifest};
use crate::ports::{IdGenerator, Infrastructure};

pub struct DirectoryInfrastructure {
    snapshot_dir: PathBuf,
    instances: Vec<ManagedInstance>,
    ids: Arc<dyn IdGenerator>,
}

impl DirectoryInfrastructure {
    pub fn new(
        snapshot_dir: impl Into<PathBuf>,
        instances: Vec<ManagedInstance>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            snapshot_dir: snapshot_dir.into(),
            instances,
            ids,
        }
    }
}

#[async_trait]
impl Infrastructure for DirectoryInfrastructure {
    async fn managed_instances(&self) -> Result<Vec<ManagedInstance>, AgentError> {
        Ok(self.instances.clone())
    }

    async fn snapshot_disk(
        &self,
        disk_cid: &str,
        manifest: &SnapshotManifest,
    ) -> Result<SnapshotId, AgentError> {
        tokio::fs::create_dir_all(&self.snapshot_dir)
            .await
            .map_err(|e| {
                AgentError::io(
                    format!("create snapshot dir {}", self.snapshot_dir.display()),
                    e,
                )
            })?;

        let id = self.ids.generate_snapshot_id();
        let path = self.snapshot_dir.join(id.to_string());
        let body = serde_json::to_vec_pretty(manifest).map_err(|e| AgentError::Snapshot {
            cause: format!("encode manifest: {e}"),
        })?;
        tokio::fs::write(&path, body)
            .await
            .map_err(|e| AgentError::io(format!("write snapshot {}", path.display()), e))?;

        info!(snapshot_id = %id, disk_cid, "disk snapshot recorded");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{SystemClock, UlidGenerator};

    #[tokio::test]
    async fn writes_manifest_named_after_snapshot_id() {
        let dir = tempfile::tempdir().unwrap();
        let infra = DirectoryInfrastructure::new(
            dir.path().join("snapshots"),
            Vec::new(),
            Arc::new(UlidGenerator::new(SystemClock)),
        );
        let manifest = SnapshotManifest {
            deployment: "simple".to_string(),
            job: "foobar".to_string(),
            index: 2,
            director_name: "Test Director".to_string(),
            director_uuid: "deadbeef".to_string(),
            agent_id: "agent-2".to_string(),
            instance_id: "i-2".to_string(),
        };

        let id = infra.snapshot_disk("vol-2", &manifest).await.unwrap();

        let written = std::fs::read(dir.path().join("snapshots").join(id.to_string())).unwrap();
        let back: SnapshotManifest = serde_json::from_slice(&written).unwrap();
        assert_eq!(back, manifest);
    }
}
