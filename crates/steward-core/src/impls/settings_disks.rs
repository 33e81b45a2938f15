//! SettingsDiskLocator - disk cids resolved from the agent's settings.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::AgentError;
use crate::ports::{Disk, DiskLocator};

/// cid -> partition path, as written into the agent settings by the director.
#[derive(Debug, Clone, Default)]
pub struct SettingsDiskLocator {
    disks: HashMap<String, String>,
}

impl SettingsDiskLocator {
    pub fn new(disks: HashMap<String, String>) -> Self {
        Self { disks }
    }

    pub fn with_disk(mut self, cid: &str, partition_path: &str) -> Self {
        self.disks.insert(cid.to_string(), partition_path.to_string());
        self
    }
}

#[async_trait]
impl DiskLocator for SettingsDiskLocator {
    async fn find_disk_by_cid(&self, cid: &str) -> Result<Disk, AgentError> {
        self.disks
            .get(cid)
            .map(|partition_path| Disk {
                cid: cid.to_string(),
                partition_path: partition_path.clone(),
            })
            .ok_or_else(|| AgentError::DiskNotFound {
                cid: cid.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolves_known_cid() {
        let locator = SettingsDiskLocator::default().with_disk("vol-1", "/dev/sdc1");
        let disk = locator.find_disk_by_cid("vol-1").await.unwrap();
        assert_eq!(disk.partition_path, "/dev/sdc1");
    }

    #[tokio::test]
    async fn unknown_cid_is_disk_not_found() {
        let locator = SettingsDiskLocator::default();
        let err = locator.find_disk_by_cid("vol-x").await.unwrap_err();
        assert!(matches!(err, AgentError::DiskNotFound { cid } if cid == "vol-x"));
    }
}
