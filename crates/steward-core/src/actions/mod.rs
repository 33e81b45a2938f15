//! Actions - the agent commands and the director jobs they front.
//!
//! | message                | class       |
//! |------------------------|-------------|
//! | `ping`                 | Sync        |
//! | `get_task`             | Sync        |
//! | `backup`               | Sync        |
//! | `mount_disk`           | LongRunning |
//! | `migrate_disk`         | LongRunning |
//! | `snapshot_deployments` | LongRunning |
//! | `scheduled_backup`     | LongRunning |

pub mod backup;
pub mod get_task;
pub mod migrate_disk;
pub mod mount_disk;
pub mod ping;
pub mod snapshot;

use std::sync::Arc;

use crate::app::{AgentBuilder, AgentContext, BuildError, Dispatcher};
use crate::typed::{Message, RegistryError};

pub use self::backup::{Backup, BackupJob, ScheduledBackup};
pub use self::get_task::GetTask;
pub use self::migrate_disk::{MigrateDisk, Migration, MigrationStep};
pub use self::mount_disk::MountDisk;
pub use self::ping::Ping;
pub use self::snapshot::SnapshotDeployments;

/// Every message a fully wired agent answers.
pub const MESSAGES: &[&str] = &[
    Ping::NAME,
    GetTask::NAME,
    Backup::NAME,
    MountDisk::NAME,
    MigrateDisk::NAME,
    SnapshotDeployments::NAME,
    ScheduledBackup::NAME,
];

pub fn register_all(
    builder: AgentBuilder,
    context: &Arc<AgentContext>,
) -> Result<AgentBuilder, RegistryError> {
    builder
        .register::<Ping, _>(ping::PingHandler)?
        .register::<GetTask, _>(get_task::GetTaskHandler::new(Arc::clone(&context.tracker)))?
        .register::<Backup, _>(backup::BackupHandler::new(Arc::clone(context)))?
        .register::<MountDisk, _>(mount_disk::MountDiskHandler::new(Arc::clone(context)))?
        .register::<MigrateDisk, _>(migrate_disk::MigrateDiskHandler::new(Arc::clone(context)))?
        .register::<SnapshotDeployments, _>(snapshot::SnapshotDeploymentsHandler::new(
            Arc::clone(context),
        ))?
        .register::<ScheduledBackup, _>(backup::ScheduledBackupHandler::new(Arc::clone(context)))
}

/// A dispatcher answering every message in [`MESSAGES`].
pub fn build_dispatcher(context: &Arc<AgentContext>) -> Result<Dispatcher, BuildError> {
    let builder = AgentBuilder::new(Arc::clone(&context.tracker));
    register_all(builder, context)?
        .expect_messages(MESSAGES)
        .build()
}
