//! `migrate_disk [old_cid, new_cid]` - move persistent data to a new disk.
//!
//! Expects two earlier `mount_disk` calls: the old disk at the store path and
//! the new one at the migration target.
//!
//! ```text
//! Init -> UnmountOld -> MountOldReadOnly -> VerifyMountpoints
//!      -> CopyData | SkipCopy -> UnmountBoth -> MountNew -> Done
//! ```
//!
//! Any fatal step ends in `Failed`. Nothing is rolled back: a copy that dies
//! halfway leaves the target partially populated.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::app::{AgentContext, MountGuard};
use crate::domain::{AgentError, ExecutionClass};
use crate::ports::MountOptions;
use crate::typed::{Handler, Message};

#[derive(Debug, Deserialize)]
pub struct MigrateDisk {
    pub old_cid: String,
    pub new_cid: String,
}

impl Message for MigrateDisk {
    const NAME: &'static str = "migrate_disk";
    const CLASS: ExecutionClass = ExecutionClass::LongRunning;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationStep {
    Init,
    UnmountOld,
    MountOldReadOnly,
    VerifyMountpoints,
    CopyData,
    SkipCopy,
    UnmountBoth,
    MountNew,
    Done,
    Failed,
}

impl MigrationStep {
    pub fn is_terminal(self) -> bool {
        matches!(self, MigrationStep::Done | MigrationStep::Failed)
    }
}

/// One run of the migration state machine.
pub struct Migration<'a> {
    context: &'a AgentContext,
    guard: MountGuard,
    trail: Vec<MigrationStep>,
}

impl<'a> Migration<'a> {
    pub fn new(context: &'a AgentContext) -> Self {
        Self {
            context,
            guard: context.mount_guard(),
            trail: vec![MigrationStep::Init],
        }
    }

    pub fn step(&self) -> MigrationStep {
        self.trail.last().copied().unwrap_or(MigrationStep::Init)
    }

    /// Every step entered so far, in order.
    pub fn trail(&self) -> &[MigrationStep] {
        &self.trail
    }

    pub async fn run(&mut self, old_cid: &str, new_cid: &str) -> Result<(), AgentError> {
        info!(old_cid, new_cid, "migrating persistent disk");
        let result = self.advance(old_cid, new_cid).await;
        match &result {
            Ok(()) => self.enter(MigrationStep::Done),
            Err(err) => {
                warn!(step = ?self.step(), error = %err, "disk migration failed");
                self.enter(MigrationStep::Failed);
            }
        }
        result
    }

    async fn advance(&mut self, old_cid: &str, new_cid: &str) -> Result<(), AgentError> {
        let context = self.context;
        let store = context.store_path.as_path();
        let target = context.migration_target_path.as_path();

        self.enter(MigrationStep::UnmountOld);
        self.guard.guard_unmount(store).await?;

        self.enter(MigrationStep::MountOldReadOnly);
        self.mount_store(old_cid, MountOptions::read_only()).await?;

        self.enter(MigrationStep::VerifyMountpoints);
        let both_mounted =
            self.guard.is_mountpoint(store).await && self.guard.is_mountpoint(target).await;

        if both_mounted {
            self.enter(MigrationStep::CopyData);
            info!(
                source = %store.display(),
                destination = %target.display(),
                "copying data from old to new store disk"
            );
            context.copier.copy(store, target).await?;
        } else {
            self.enter(MigrationStep::SkipCopy);
            warn!(
                store = %store.display(),
                target = %target.display(),
                "store or migration target is not a mountpoint, skipping copy"
            );
        }

        self.enter(MigrationStep::UnmountBoth);
        self.guard.guard_unmount(store).await?;
        self.guard.guard_unmount(target).await?;

        self.enter(MigrationStep::MountNew);
        self.mount_store(new_cid, MountOptions::read_write()).await
    }

    async fn mount_store(&self, cid: &str, options: MountOptions) -> Result<(), AgentError> {
        let disk = self.context.disks.find_disk_by_cid(cid).await?;
        self.guard
            .mount(&disk.partition_path, &self.context.store_path, options)
            .await
    }

    fn enter(&mut self, step: MigrationStep) {
        debug!(step = ?step, "migration step");
        self.trail.push(step);
    }
}

pub struct MigrateDiskHandler {
    context: Arc<AgentContext>,
}

impl MigrateDiskHandler {
    pub fn new(context: Arc<AgentContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl Handler<MigrateDisk> for MigrateDiskHandler {
    async fn handle(&self, message: MigrateDisk) -> Result<serde_json::Value, AgentError> {
        Migration::new(&self.context)
            .run(&message.old_cid, &message.new_cid)
            .await?;
        Ok(serde_json::json!({}))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::actions;
    use crate::app::DispatchOutcome;
    use crate::app::context::fixture::{self, Fixture, NEW_CID, NEW_DEVICE, OLD_CID, OLD_DEVICE};
    use crate::impls::MountEvent;
    use crate::ports::{DirCopier, Mounter};
    use crate::tracker::TaskState;

    use super::MigrationStep::*;

    /// Relative path -> contents for every file under `root`.
    fn snapshot_tree(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
        fn walk(root: &Path, dir: &Path, out: &mut BTreeMap<PathBuf, Vec<u8>>) {
            for entry in std::fs::read_dir(dir).unwrap() {
                let path = entry.unwrap().path();
                if path.is_dir() {
                    walk(root, &path, out);
                } else {
                    let rel = path.strip_prefix(root).unwrap().to_path_buf();
                    out.insert(rel, std::fs::read(&path).unwrap());
                }
            }
        }
        let mut out = BTreeMap::new();
        walk(root, root, &mut out);
        out
    }

    fn seed_store(store: &Path) {
        std::fs::create_dir_all(store.join("postgres/base")).unwrap();
        std::fs::write(store.join("postgres/base/1"), b"rows").unwrap();
        std::fs::write(store.join(".hidden"), b"dotfile").unwrap();
        std::fs::write(store.join("director.yml"), b"name: test").unwrap();
    }

    /// Old disk at the store path, new disk at the migration target.
    async fn prepared() -> (tempfile::TempDir, Fixture) {
        let root = tempfile::tempdir().unwrap();
        let fx = fixture::context(root.path());
        fx.mounter
            .mount(OLD_DEVICE, &fx.context.store_path, MountOptions::read_write())
            .await
            .unwrap();
        fx.mounter
            .mount(
                NEW_DEVICE,
                &fx.context.migration_target_path,
                MountOptions::read_write(),
            )
            .await
            .unwrap();
        seed_store(&fx.context.store_path);
        (root, fx)
    }

    #[tokio::test]
    async fn end_to_end_dispatch_moves_data_to_new_disk() {
        let (_root, fx) = prepared().await;
        let mounter = fx.mounter.clone();
        let context = Arc::new(fx.context);
        let before = snapshot_tree(&context.store_path);
        let dispatcher = actions::build_dispatcher(&context).unwrap();

        let outcome = dispatcher
            .dispatch("migrate_disk", vec![json!(OLD_CID), json!(NEW_CID)])
            .await
            .unwrap();
        let DispatchOutcome::Task(id) = outcome else {
            panic!("migrate_disk must be long-running, got {outcome:?}");
        };
        let record = dispatcher
            .tracker()
            .wait_terminal(id, Duration::from_secs(10))
            .await
            .unwrap();

        assert_eq!(record.state, TaskState::Succeeded, "{:?}", record.failure);
        assert_eq!(record.value, Some(json!({})));

        let store = mounter.mounted(&context.store_path).unwrap();
        assert_eq!(store.device, NEW_DEVICE);
        assert!(!store.read_only);
        assert!(!mounter.is_mountpoint(&context.migration_target_path).await);
        assert!(mounter.mountpoints_of(OLD_DEVICE).is_empty());
        assert_eq!(snapshot_tree(&context.migration_target_path), before);
    }

    #[tokio::test]
    async fn steps_run_in_order_and_old_disk_is_read_only_during_copy() {
        let (_root, fx) = prepared().await;

        let mut migration = Migration::new(&fx.context);
        migration.run(OLD_CID, NEW_CID).await.unwrap();

        assert_eq!(
            migration.trail(),
            &[
                Init,
                UnmountOld,
                MountOldReadOnly,
                VerifyMountpoints,
                CopyData,
                UnmountBoth,
                MountNew,
                Done
            ]
        );
        assert!(fx.mounter.history().contains(&MountEvent::Mounted {
            device: OLD_DEVICE.to_string(),
            path: fx.context.store_path.clone(),
            read_only: true,
        }));
    }

    #[tokio::test]
    async fn missing_target_mount_skips_copy_without_error() {
        let root = tempfile::tempdir().unwrap();
        let fx = fixture::context(root.path());
        seed_store(&fx.context.store_path);

        let mut migration = Migration::new(&fx.context);
        migration.run(OLD_CID, NEW_CID).await.unwrap();

        assert!(migration.trail().contains(&SkipCopy));
        assert!(!migration.trail().contains(&CopyData));
        assert_eq!(migration.step(), Done);
        let store = fx.mounter.mounted(&fx.context.store_path).unwrap();
        assert_eq!(store.device, NEW_DEVICE);
        assert!(!store.read_only);
        assert!(snapshot_tree(&fx.context.migration_target_path).is_empty());
    }

    #[tokio::test]
    async fn old_disk_mount_failure_is_fatal() {
        let (_root, fx) = prepared().await;
        fx.mounter.break_device(OLD_DEVICE);

        let mut migration = Migration::new(&fx.context);
        let err = migration.run(OLD_CID, NEW_CID).await.unwrap_err();

        assert_eq!(
            err.to_string(),
            format!(
                "Failed to mount: {OLD_DEVICE} {} (exit code 32)",
                fx.context.store_path.display()
            )
        );
        assert_eq!(migration.trail(), &[Init, UnmountOld, MountOldReadOnly, Failed]);
        assert!(migration.step().is_terminal());
    }

    #[tokio::test]
    async fn new_disk_mount_failure_is_fatal() {
        let (_root, fx) = prepared().await;
        fx.mounter.break_device(NEW_DEVICE);

        let mut migration = Migration::new(&fx.context);
        let err = migration.run(OLD_CID, NEW_CID).await.unwrap_err();

        assert!(matches!(err, AgentError::MountFailure { ref device, .. } if device == NEW_DEVICE));
        assert_eq!(migration.trail()[migration.trail().len() - 2], MountNew);
        assert_eq!(migration.step(), Failed);
    }

    #[tokio::test]
    async fn unknown_cid_fails_the_run() {
        let (_root, fx) = prepared().await;

        let mut migration = Migration::new(&fx.context);
        let err = migration.run("vol-missing", NEW_CID).await.unwrap_err();

        assert!(matches!(err, AgentError::DiskNotFound { .. }));
        assert_eq!(migration.step(), Failed);
    }

    struct FullDisk;

    #[async_trait]
    impl DirCopier for FullDisk {
        async fn copy(&self, source: &Path, destination: &Path) -> Result<(), AgentError> {
            Err(AgentError::CopyFailure {
                source_dir: source.to_path_buf(),
                destination_dir: destination.to_path_buf(),
                cause: "No space left on device".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn copy_failure_is_fatal_and_not_rolled_back() {
        let (_root, fx) = prepared().await;
        let context = AgentContext {
            copier: Arc::new(FullDisk),
            ..fx.context
        };

        let mut migration = Migration::new(&context);
        let err = migration.run(OLD_CID, NEW_CID).await.unwrap_err();

        assert!(matches!(err, AgentError::CopyFailure { ref cause, .. } if cause.contains("No space")));
        assert_eq!(
            migration.trail(),
            &[Init, UnmountOld, MountOldReadOnly, VerifyMountpoints, CopyData, Failed]
        );
        // both disks are left where the failed copy found them
        assert_eq!(fx.mounter.mounted(&context.store_path).unwrap().device, OLD_DEVICE);
        assert_eq!(
            fx.mounter
                .mounted(&context.migration_target_path)
                .unwrap()
                .device,
            NEW_DEVICE
        );
    }

    #[tokio::test]
    async fn rerun_after_failed_copy_completes() {
        let (root, fx) = prepared().await;
        let failing = AgentContext {
            copier: Arc::new(FullDisk),
            mounter: fx.mounter.clone(),
            ..fixture::context(root.path()).context
        };
        assert!(Migration::new(&failing).run(OLD_CID, NEW_CID).await.is_err());

        // the old disk is still mounted read-only at the store path
        assert!(fx.mounter.mounted(&fx.context.store_path).unwrap().read_only);

        let mut second = Migration::new(&fx.context);
        second.run(OLD_CID, NEW_CID).await.unwrap();

        assert_eq!(second.trail()[4], CopyData);
        let store = fx.mounter.mounted(&fx.context.store_path).unwrap();
        assert_eq!(store.device, NEW_DEVICE);
        assert!(!store.read_only);
    }
}
