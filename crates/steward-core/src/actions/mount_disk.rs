//! `mount_disk [cid]` - attach a persistent disk.
//!
//! The first disk goes to the store path. A second disk, attached while the
//! first is still in use, goes to the migration target so `migrate_disk` can
//! copy into it.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use crate::app::AgentContext;
use crate::domain::{AgentError, ExecutionClass};
use crate::ports::MountOptions;
use crate::typed::{Handler, Message};

#[derive(Debug, Deserialize)]
pub struct MountDisk {
    pub cid: String,
}

impl Message for MountDisk {
    const NAME: &'static str = "mount_disk";
    const CLASS: ExecutionClass = ExecutionClass::LongRunning;
}

pub struct MountDiskHandler {
    context: Arc<AgentContext>,
}

impl MountDiskHandler {
    pub fn new(context: Arc<AgentContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl Handler<MountDisk> for MountDiskHandler {
    async fn handle(&self, message: MountDisk) -> Result<serde_json::Value, AgentError> {
        let disk = self.context.disks.find_disk_by_cid(&message.cid).await?;
        let guard = self.context.mount_guard();

        let store = &self.context.store_path;
        let target = &self.context.migration_target_path;
        let mountpoint = if !guard.is_mountpoint(store).await {
            store
        } else if !guard.is_mountpoint(target).await {
            target
        } else {
            return Err(AgentError::MountFailure {
                device: disk.partition_path,
                mountpoint: target.clone(),
                exit_status: None,
            });
        };

        info!(cid = %message.cid, mountpoint = %mountpoint.display(), "mounting persistent disk");
        guard
            .mount(&disk.partition_path, mountpoint, MountOptions::read_write())
            .await?;
        Ok(serde_json::json!({}))
    }
}
