//! TableMounter - an in-process mount table.
//!
//! Used for dry runs (`agent.dry_run_mounts`) and as the mount layer in tests.
//! It models the one rule the real kernel table enforces for us: one device
//! per path.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::AgentError;
use crate::ports::{MountOptions, Mounter};

/// Exit status mount(8) uses for "mount failure".
const MOUNT_FAILURE_STATUS: i32 = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountedDevice {
    pub device: String,
    pub read_only: bool,
}

#[derive(Debug, Default)]
struct Table {
    mounts: HashMap<PathBuf, MountedDevice>,
    broken_devices: HashSet<String>,
    history: Vec<MountEvent>,
}

/// What happened to the table, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountEvent {
    Mounted {
        device: String,
        path: PathBuf,
        read_only: bool,
    },
    Unmounted {
        path: PathBuf,
    },
}

#[derive(Debug, Default)]
pub struct TableMounter {
    table: Mutex<Table>,
}

impl TableMounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate the table, as if `device` had been mounted before we started.
    pub fn with_mount(self, device: &str, path: impl Into<PathBuf>, read_only: bool) -> Self {
        self.lock().mounts.insert(
            path.into(),
            MountedDevice {
                device: device.to_string(),
                read_only,
            },
        );
        self
    }

    /// Every later mount of `device` fails like a corrupt filesystem would.
    pub fn break_device(&self, device: &str) {
        self.lock().broken_devices.insert(device.to_string());
    }

    pub fn mounted(&self, path: &Path) -> Option<MountedDevice> {
        self.lock().mounts.get(path).cloned()
    }

    /// Paths where `device` is currently mounted.
    pub fn mountpoints_of(&self, device: &str) -> Vec<PathBuf> {
        self.lock()
            .mounts
            .iter()
            .filter(|(_, m)| m.device == device)
            .map(|(p, _)| p.clone())
            .collect()
    }

    pub fn history(&self) -> Vec<MountEvent> {
        self.lock().history.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Table> {
        self.table.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Mounter for TableMounter {
    async fn is_mountpoint(&self, path: &Path) -> bool {
        self.lock().mounts.contains_key(path)
    }

    async fn mount(
        &self,
        device: &str,
        path: &Path,
        options: MountOptions,
    ) -> Result<(), AgentError> {
        let mut table = self.lock();
        if table.broken_devices.contains(device) || table.mounts.contains_key(path) {
            return Err(AgentError::MountFailure {
                device: device.to_string(),
                mountpoint: path.to_path_buf(),
                exit_status: Some(MOUNT_FAILURE_STATUS),
            });
        }
        table.mounts.insert(
            path.to_path_buf(),
            MountedDevice {
                device: device.to_string(),
                read_only: options.read_only,
            },
        );
        table.history.push(MountEvent::Mounted {
            device: device.to_string(),
            path: path.to_path_buf(),
            read_only: options.read_only,
        });
        Ok(())
    }

    async fn unmount(&self, path: &Path) -> Result<(), AgentError> {
        let mut table = self.lock();
        if table.mounts.remove(path).is_none() {
            // umount(8) reports "not mounted" as a failure
            return Err(AgentError::UnmountFailure {
                mountpoint: path.to_path_buf(),
                exit_status: Some(MOUNT_FAILURE_STATUS),
            });
        }
        table.history.push(MountEvent::Unmounted {
            path: path.to_path_buf(),
        });
        Ok(())
    }
}
