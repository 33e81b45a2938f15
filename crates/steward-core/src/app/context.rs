//! AgentContext - the explicit configuration value every handler is built with.
//!
//! Constructed once at process start (`from_config`) and shared behind an
//! `Arc`. Nothing in the crate reads configuration any other way.

use std::path::PathBuf;
use std::sync::Arc;

use crate::app::MountGuard;
use crate::config::{BackupConfig, StewardConfig};
use crate::impls::{
    CommandDumper, CpCopier, DirectoryInfrastructure, SettingsDiskLocator, SystemMounter,
    TableMounter,
};
use crate::ports::{
    Clock, DatabaseDumper, DirCopier, DiskLocator, IdGenerator, Infrastructure, Mounter,
    SystemClock, UlidGenerator,
};
use crate::tracker::{InMemoryTaskTracker, TaskTracker};

/// Who the director is, as stamped into snapshot manifests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectorIdentity {
    pub name: String,
    pub uuid: String,
}

pub struct AgentContext {
    pub agent_id: String,
    /// Canonical store path.
    pub store_path: PathBuf,
    pub migration_target_path: PathBuf,
    pub director: DirectorIdentity,
    pub backup: BackupConfig,

    pub mounter: Arc<dyn Mounter>,
    pub disks: Arc<dyn DiskLocator>,
    pub copier: Arc<dyn DirCopier>,
    pub infrastructure: Arc<dyn Infrastructure>,
    pub dumper: Arc<dyn DatabaseDumper>,
    pub tracker: Arc<dyn TaskTracker>,
    pub clock: Arc<dyn Clock>,
}

impl AgentContext {
    /// Wire the production collaborators described by `config`.
    pub fn from_config(config: &StewardConfig) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let ids: Arc<dyn IdGenerator> = Arc::new(UlidGenerator::new(Arc::clone(&clock)));

        let mounter: Arc<dyn Mounter> = if config.agent.dry_run_mounts {
            Arc::new(TableMounter::new())
        } else {
            Arc::new(SystemMounter::new())
        };

        Self {
            agent_id: config.agent.agent_id.clone(),
            store_path: config.agent.store_path.clone(),
            migration_target_path: config.agent.migration_target_path.clone(),
            director: DirectorIdentity {
                name: config.director.name.clone(),
                uuid: config.director.uuid.clone(),
            },
            backup: config.backup.clone(),
            mounter,
            disks: Arc::new(SettingsDiskLocator::new(config.agent.disks.clone())),
            copier: Arc::new(CpCopier::new()),
            infrastructure: Arc::new(DirectoryInfrastructure::new(
                config.snapshot.snapshot_dir.clone(),
                config.snapshot.deployments.clone(),
                Arc::clone(&ids),
            )),
            dumper: Arc::new(CommandDumper::new(config.backup.database_dump_command.clone())),
            tracker: Arc::new(InMemoryTaskTracker::new(ids, Arc::clone(&clock))),
            clock,
        }
    }

    pub fn mount_guard(&self) -> MountGuard {
        MountGuard::new(Arc::clone(&self.mounter))
    }
}
