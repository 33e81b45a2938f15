//! Director backup: `backup [path]` (manual, sync) and `scheduled_backup`.
//!
//! The archive is a gzip'd tar with exactly four members:
//!
//! | member                 | contents                        |
//! |------------------------|---------------------------------|
//! | `logs.tgz`             | `backup.logs_dir`               |
//! | `task_logs.tgz`        | `backup.task_logs_dir`          |
//! | `<database_dump_name>` | output of the `DatabaseDumper`  |
//! | `blobs.tgz`            | `backup.blobstore_dir`          |
//!
//! Members are built in a staging directory and the archive in a temp file
//! beside the target; the temp file is renamed onto the target only once all
//! four members are in it. On failure both are dropped, so a target path
//! never holds a partial archive.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::app::{AgentContext, backup_confirmation};
use crate::archive::{self, BLOBS_MEMBER, LOGS_MEMBER, TASK_LOGS_MEMBER};
use crate::config::BackupConfig;
use crate::domain::{AgentError, ExecutionClass};
use crate::ports::DatabaseDumper;
use crate::typed::{Handler, Message};

/// Produces backup archives from the configured sources.
pub struct BackupJob<'a> {
    settings: &'a BackupConfig,
    dumper: &'a dyn DatabaseDumper,
}

impl<'a> BackupJob<'a> {
    pub fn new(settings: &'a BackupConfig, dumper: &'a dyn DatabaseDumper) -> Self {
        Self { settings, dumper }
    }

    pub fn member_names(&self) -> [String; 4] {
        [
            LOGS_MEMBER.to_string(),
            TASK_LOGS_MEMBER.to_string(),
            self.settings.database_dump_name.clone(),
            BLOBS_MEMBER.to_string(),
        ]
    }

    /// Write a complete archive to `target`.
    pub async fn create(&self, target: &Path) -> Result<(), AgentError> {
        self.settings
            .check_dump_name()
            .map_err(|cause| AgentError::Backup { cause })?;

        let parent = match target.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        tokio::fs::create_dir_all(&parent)
            .await
            .map_err(|e| AgentError::io(format!("create {}", parent.display()), e))?;

        let staging = tempfile::Builder::new()
            .prefix(".backup-staging-")
            .tempdir_in(&parent)
            .map_err(|e| AgentError::io("create backup staging dir", e))?;

        let [logs, task_logs, dump_name, blobs] = self.member_names();
        let mut members = Vec::with_capacity(4);
        for (name, source) in [
            (logs, &self.settings.logs_dir),
            (task_logs, &self.settings.task_logs_dir),
            (blobs, &self.settings.blobstore_dir),
        ] {
            let bundle = staging.path().join(&name);
            debug!(member = %name, source = %source.display(), "bundling directory");
            let source = source.clone();
            let destination = bundle.clone();
            blocking(format!("bundle {name}"), move || {
                archive::bundle_directory(&source, &destination)
            })
            .await?;
            members.push((name, bundle));
        }

        let dump = staging.path().join(&dump_name);
        self.dumper.dump(&dump).await?;
        members.insert(2, (dump_name, dump));

        let partial = tempfile::Builder::new()
            .prefix(".backup-")
            .suffix(".partial")
            .tempfile_in(&parent)
            .map_err(|e| AgentError::io("create backup temp file", e))?;
        let partial = blocking("pack backup archive", move || {
            archive::pack_members(partial, &members)
        })
        .await?;

        self.verify(&partial).await?;

        partial
            .persist(target)
            .map_err(|e| AgentError::io(format!("persist {}", target.display()), e.error))?;
        info!(path = %target.display(), "backup archive written");
        Ok(())
    }

    async fn verify(&self, partial: &NamedTempFile) -> Result<(), AgentError> {
        let path = partial.path().to_path_buf();
        let mut found = blocking("read back backup archive", move || {
            archive::member_names(&path)
        })
        .await?;
        let mut expected = self.member_names().to_vec();
        found.sort();
        expected.sort();
        expected.dedup();
        if found.windows(2).any(|pair| pair[0] == pair[1]) {
            return Err(AgentError::Backup {
                cause: format!("archive has duplicate members: {found:?}"),
            });
        }
        if found != expected {
            return Err(AgentError::Backup {
                cause: format!("archive members {found:?} do not match {expected:?}"),
            });
        }
        Ok(())
    }
}

async fn blocking<T, F>(what: impl Into<String>, f: F) -> Result<T, AgentError>
where
    T: Send + 'static,
    F: FnOnce() -> io::Result<T> + Send + 'static,
{
    let what = what.into();
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result.map_err(|e| AgentError::io(what, e)),
        Err(join_error) => Err(AgentError::Backup {
            cause: format!("{what}: {join_error}"),
        }),
    }
}

/// Manual backup into a caller-chosen path.
#[derive(Debug, Deserialize)]
pub struct Backup {
    pub path: PathBuf,
}

impl Message for Backup {
    const NAME: &'static str = "backup";
    const CLASS: ExecutionClass = ExecutionClass::Sync;
}

pub struct BackupHandler {
    context: Arc<AgentContext>,
}

impl BackupHandler {
    pub fn new(context: Arc<AgentContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl Handler<Backup> for BackupHandler {
    async fn handle(&self, message: Backup) -> Result<serde_json::Value, AgentError> {
        let settings = &self.context.backup;
        BackupJob::new(settings, self.context.dumper.as_ref())
            .create(&message.path)
            .await?;
        Ok(serde_json::json!(backup_confirmation(
            &settings.system_name,
            &message.path
        )))
    }
}

#[derive(Debug, Deserialize)]
pub struct ScheduledBackup {}

impl Message for ScheduledBackup {
    const NAME: &'static str = "scheduled_backup";
    const CLASS: ExecutionClass = ExecutionClass::LongRunning;
}

pub struct ScheduledBackupHandler {
    context: Arc<AgentContext>,
}

impl ScheduledBackupHandler {
    pub fn new(context: Arc<AgentContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl Handler<ScheduledBackup> for ScheduledBackupHandler {
    async fn handle(&self, _message: ScheduledBackup) -> Result<serde_json::Value, AgentError> {
        let settings = &self.context.backup;
        let stamp = self.context.clock.now().format("%Y%m%dT%H%M%S").to_string();
        let target = settings.destination_dir.join(format!("backup-{stamp}.tgz"));

        BackupJob::new(settings, self.context.dumper.as_ref())
            .create(&target)
            .await?;
        Ok(serde_json::json!({ "path": target }))
    }
}
