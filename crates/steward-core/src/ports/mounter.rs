//! Mounter port - the host's mount facility.
//!
//! The Mount Guard (`app::mount_guard`) builds its idempotent primitives on
//! top of this trait; implementations only have to report faithfully.

use std::path::Path;

use async_trait::async_trait;

use crate::domain::AgentError;

/// Options passed to a mount call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MountOptions {
    pub read_only: bool,
}

impl MountOptions {
    pub fn read_only() -> Self {
        Self { read_only: true }
    }

    pub fn read_write() -> Self {
        Self { read_only: false }
    }

    /// Arguments for `mount(8)`.
    pub fn to_args(self) -> Vec<&'static str> {
        if self.read_only {
            vec!["-o", "ro"]
        } else {
            Vec::new()
        }
    }
}

#[async_trait]
pub trait Mounter: Send + Sync {
    /// Is `path` currently backed by its own device? Never fails; an
    /// unreadable path is not a mountpoint.
    async fn is_mountpoint(&self, path: &Path) -> bool;

    /// Mount `device` at `path`. Fails with `AgentError::MountFailure`.
    async fn mount(&self, device: &str, path: &Path, options: MountOptions)
    -> Result<(), AgentError>;

    /// Unmount whatever is at `path`. Fails with `AgentError::UnmountFailure`.
    async fn unmount(&self, path: &Path) -> Result<(), AgentError>;
}
