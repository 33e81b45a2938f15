//! SystemMounter - mount(8)/umount(8) on the host.

use std::os::unix::fs::MetadataExt;
use std::path::Path;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::domain::AgentError;
use crate::ports::{MountOptions, Mounter};

/// Shells out to the host's mount tools and inspects device numbers for
/// mountpoint checks.
#[derive(Debug, Clone, Default)]
pub struct SystemMounter;

impl SystemMounter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Mounter for SystemMounter {
    async fn is_mountpoint(&self, path: &Path) -> bool {
        let Ok(meta) = tokio::fs::symlink_metadata(path).await else {
            return false;
        };
        if !meta.is_dir() {
            return false;
        }
        let Ok(parent) = tokio::fs::metadata(path.join("..")).await else {
            return false;
        };
        // a different device than the parent, or the filesystem root itself
        meta.dev() != parent.dev() || meta.ino() == parent.ino()
    }

    async fn mount(
        &self,
        device: &str,
        path: &Path,
        options: MountOptions,
    ) -> Result<(), AgentError> {
        debug!(device, mountpoint = %path.display(), ?options, "mount");
        let status = Command::new("mount")
            .args(options.to_args())
            .arg(device)
            .arg(path)
            .status()
            .await;

        match status {
            Ok(status) if status.success() => Ok(()),
            Ok(status) => Err(AgentError::MountFailure {
                device: device.to_string(),
                mountpoint: path.to_path_buf(),
                exit_status: status.code(),
            }),
            Err(e) => {
                warn!(error = %e, "could not run mount");
                Err(AgentError::MountFailure {
                    device: device.to_string(),
                    mountpoint: path.to_path_buf(),
                    exit_status: None,
                })
            }
        }
    }

    async fn unmount(&self, path: &Path) -> Result<(), AgentError> {
        debug!(mountpoint = %path.display(), "umount");
        let status = Command::new("umount").arg(path).status().await;

        match status {
            Ok(status) if status.success() => Ok(()),
            Ok(status) => Err(AgentError::UnmountFailure {
                mountpoint: path.to_path_buf(),
                exit_status: status.code(),
            }),
            Err(e) => {
                warn!(error = %e, "could not run umount");
                Err(AgentError::UnmountFailure {
                    mountpoint: path.to_path_buf(),
                    exit_status: None,
                })
            }
        }
    }
}
