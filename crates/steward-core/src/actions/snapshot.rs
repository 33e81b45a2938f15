//! `snapshot_deployments` - snapshot every managed persistent disk.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::app::AgentContext;
use crate::domain::{AgentError, ExecutionClass, SnapshotManifest};
use crate::typed::{Handler, Message};

#[derive(Debug, Deserialize)]
pub struct SnapshotDeployments {}

impl Message for SnapshotDeployments {
    const NAME: &'static str = "snapshot_deployments";
    const CLASS: ExecutionClass = ExecutionClass::LongRunning;
}

pub struct SnapshotDeploymentsHandler {
    context: Arc<AgentContext>,
}

impl SnapshotDeploymentsHandler {
    pub fn new(context: Arc<AgentContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl Handler<SnapshotDeployments> for SnapshotDeploymentsHandler {
    /// Tries every instance before reporting; one bad disk does not stop the rest.
    async fn handle(&self, _message: SnapshotDeployments) -> Result<serde_json::Value, AgentError> {
        let infrastructure = &self.context.infrastructure;
        let director = &self.context.director;

        let mut taken = Vec::new();
        let mut attempted = 0usize;
        let mut failed = 0usize;

        for instance in infrastructure.managed_instances().await? {
            let Some(disk_cid) = instance.persistent_disk_cid.as_deref() else {
                debug!(
                    deployment = %instance.deployment,
                    job = %instance.job,
                    index = instance.index,
                    "no persistent disk, skipping"
                );
                continue;
            };
            attempted += 1;

            let manifest = SnapshotManifest::for_instance(&instance, &director.name, &director.uuid);
            match infrastructure.snapshot_disk(disk_cid, &manifest).await {
                Ok(id) => taken.push(id.to_string()),
                Err(err) => {
                    failed += 1;
                    error!(
                        deployment = %instance.deployment,
                        job = %instance.job,
                        index = instance.index,
                        disk_cid,
                        error = %err,
                        "disk snapshot failed"
                    );
                }
            }
        }

        if failed > 0 {
            return Err(AgentError::Snapshot {
                cause: format!("{failed} of {attempted} disk snapshots failed"),
            });
        }
        info!(snapshots = taken.len(), "deployment snapshots taken");
        Ok(serde_json::json!({ "snapshots": taken }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::context::fixture::{self, instance};
    use crate::domain::{ManagedInstance, SnapshotId};
    use crate::ports::Infrastructure;

    #[tokio::test]
    async fn writes_one_seven_key_manifest_per_persistent_disk() {
        let root = tempfile::tempdir().unwrap();
        let fx = fixture::context(root.path());
        let handler = SnapshotDeploymentsHandler::new(Arc::new(fx.context));

        let value = handler.handle(SnapshotDeployments {}).await.unwrap();

        assert_eq!(value["snapshots"].as_array().unwrap().len(), 2);
        let written: Vec<_> = std::fs::read_dir(root.path().join("snapshots"))
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(written.len(), 2);

        let keys = [
            "deployment",
            "job",
            "index",
            "director_name",
            "director_uuid",
            "agent_id",
            "instance_id",
        ];
        for path in written {
            let json: serde_json::Value =
                serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
            let object = json.as_object().unwrap();
            assert_eq!(object.len(), keys.len());
            for key in keys {
                assert!(object.contains_key(key), "missing {key}");
            }
            assert_eq!(object["director_name"], "Test Director");
            assert_eq!(object["director_uuid"], "deadbeef");
        }
    }

    /// Refuses to snapshot one particular disk.
    struct FlakyInfrastructure {
        instances: Vec<ManagedInstance>,
        bad_cid: &'static str,
        inner: Arc<dyn Infrastructure>,
    }

    #[async_trait]
    impl Infrastructure for FlakyInfrastructure {
        async fn managed_instances(&self) -> Result<Vec<ManagedInstance>, AgentError> {
            Ok(self.instances.clone())
        }

        async fn snapshot_disk(
            &self,
            disk_cid: &str,
            manifest: &SnapshotManifest,
        ) -> Result<SnapshotId, AgentError> {
            if disk_cid == self.bad_cid {
                return Err(AgentError::Snapshot {
                    cause: format!("volume {disk_cid} is busy"),
                });
            }
            self.inner.snapshot_disk(disk_cid, manifest).await
        }
    }

    #[tokio::test]
    async fn failures_are_reported_after_trying_every_instance() {
        let root = tempfile::tempdir().unwrap();
        let fx = fixture::context(root.path());
        let context = AgentContext {
            infrastructure: Arc::new(FlakyInfrastructure {
                instances: vec![
                    instance(0, Some("vol-0")),
                    instance(1, Some("vol-1")),
                    instance(2, Some("vol-2")),
                ],
                bad_cid: "vol-0",
                inner: fx.context.infrastructure.clone(),
            }),
            ..fx.context
        };
        let handler = SnapshotDeploymentsHandler::new(Arc::new(context));

        let err = handler.handle(SnapshotDeployments {}).await.unwrap_err();

        assert_eq!(err.to_string(), "snapshot failed: 1 of 3 disk snapshots failed");
        let written = std::fs::read_dir(root.path().join("snapshots")).unwrap().count();
        assert_eq!(written, 2);
    }
}
