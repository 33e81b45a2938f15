//! MountGuard - idempotent mount primitives over a `Mounter`.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::AgentError;
use crate::ports::{MountOptions, Mounter};

#[derive(Clone)]
pub struct MountGuard {
    mounter: Arc<dyn Mounter>,
}

impl MountGuard {
    pub fn new(mounter: Arc<dyn Mounter>) -> Self {
        Self { mounter }
    }

    /// Pure inspection.
    pub async fn is_mountpoint(&self, path: &Path) -> bool {
        self.mounter.is_mountpoint(path).await
    }

    pub async fn mount(
        &self,
        device: &str,
        path: &Path,
        options: MountOptions,
    ) -> Result<(), AgentError> {
        info!(
            device,
            mountpoint = %path.display(),
            read_only = options.read_only,
            "mounting"
        );
        self.mounter.mount(device, path, options).await
    }

    /// Unmount `path` if something is mounted there.
    ///
    /// An already-unmounted path is a no-op, so this is safe to call any
    /// number of times. A mounted path that refuses to unmount still fails.
    pub async fn guard_unmount(&self, path: &Path) -> Result<(), AgentError> {
        if !self.mounter.is_mountpoint(path).await {
            debug!(mountpoint = %path.display(), "nothing mounted, skipping unmount");
            return Ok(());
        }
        info!(mountpoint = %path.display(), "unmounting");
        self.mounter.unmount(path).await
    }
}
