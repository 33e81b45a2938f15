//! TOML configuration for the agent and the director-side scheduler.
//!
//! # Example TOML
//!
//! ```toml
//! log_level = "info"
//!
//! [agent]
//! agent_id = "agent-0"
//! disks = { "vol-old" = "/dev/sdb1", "vol-new" = "/dev/sdc1" }
//!
//! [director]
//! name = "Test Director"
//! uuid = "deadbeef"
//!
//! [scheduler]
//! tick_ms = 1000
//!
//! [[scheduler.entries]]
//! name = "nightly-backup"
//! job = "backup"
//! every_secs = 86400
//!
//! [backup]
//! database_dump_command = ["pg_dump", "bosh"]
//! ```
//!
//! Every section and every field is optional; missing ones take the defaults
//! below.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::archive::{BLOBS_MEMBER, LOGS_MEMBER, TASK_LOGS_MEMBER};
use crate::domain::{JobKind, ManagedInstance, ScheduleEntry};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StewardConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub log_level: String,
    pub agent: AgentConfig,
    pub director: DirectorConfig,
    pub scheduler: SchedulerConfig,
    pub backup: BackupConfig,
    pub snapshot: SnapshotConfig,
}

impl Default for StewardConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            agent: AgentConfig::default(),
            director: DirectorConfig::default(),
            scheduler: SchedulerConfig::default(),
            backup: BackupConfig::default(),
            snapshot: SnapshotConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub agent_id: String,
    pub store_path: PathBuf,
    pub migration_target_path: PathBuf,
    /// Disk cid -> partition path.
    pub disks: HashMap<String, String>,
    /// Keep mounts in an in-process table instead of calling mount(8).
    pub dry_run_mounts: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            agent_id: "agent".to_string(),
            store_path: PathBuf::from("/var/vcap/store"),
            migration_target_path: PathBuf::from("/var/vcap/store_migration_target"),
            disks: HashMap::new(),
            dry_run_mounts: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectorConfig {
    pub name: String,
    pub uuid: String,
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            name: "director".to_string(),
            uuid: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub tick_ms: u64,
    pub entries: Vec<EntryConfig>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_ms: 1000,
            entries: Vec::new(),
        }
    }
}

impl SchedulerConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn schedule_entries(&self) -> Vec<ScheduleEntry> {
        self.entries.iter().map(EntryConfig::to_entry).collect()
    }
}

/// One `[[scheduler.entries]]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryConfig {
    pub name: String,
    pub job: JobKind,
    pub every_secs: u64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl EntryConfig {
    pub fn to_entry(&self) -> ScheduleEntry {
        let entry = ScheduleEntry::new(
            self.name.clone(),
            self.job,
            Duration::from_secs(self.every_secs),
        );
        if self.enabled { entry } else { entry.disabled() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupConfig {
    pub logs_dir: PathBuf,
    pub task_logs_dir: PathBuf,
    pub blobstore_dir: PathBuf,
    /// Where scheduled backups are written.
    pub destination_dir: PathBuf,
    /// argv of the command whose stdout is the database dump.
    pub database_dump_command: Vec<String>,
    /// Member name of the dump inside the archive.
    pub database_dump_name: String,
    /// Name used in the manual backup confirmation.
    pub system_name: String,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            logs_dir: PathBuf::from("/var/vcap/sys/log"),
            task_logs_dir: PathBuf::from("/var/vcap/store/director/tasks"),
            blobstore_dir: PathBuf::from("/var/vcap/store/blobstore"),
            destination_dir: PathBuf::from("/var/vcap/store/director/backups"),
            database_dump_command: vec!["pg_dump".to_string(), "bosh".to_string()],
            database_dump_name: "director_db.sql".to_string(),
            system_name: "BOSH director".to_string(),
        }
    }
}

impl BackupConfig {
    /// The dump is written into the staging directory under this name, so it
    /// must be a plain file name distinct from every bundle member.
    pub fn check_dump_name(&self) -> Result<(), String> {
        let name = self.database_dump_name.as_str();
        if name.is_empty() {
            return Err("backup.database_dump_name must not be empty".to_string());
        }
        if name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(format!(
                "backup.database_dump_name `{name}` must be a plain file name"
            ));
        }
        if [LOGS_MEMBER, TASK_LOGS_MEMBER, BLOBS_MEMBER].contains(&name) {
            return Err(format!(
                "backup.database_dump_name `{name}` collides with a bundle member"
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    pub snapshot_dir: PathBuf,
    pub deployments: Vec<ManagedInstance>,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            snapshot_dir: PathBuf::from("/var/vcap/store/snapshots"),
            deployments: Vec::new(),
        }
    }
}

impl StewardConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let paths = [
            ("agent.store_path", &self.agent.store_path),
            ("agent.migration_target_path", &self.agent.migration_target_path),
            ("backup.logs_dir", &self.backup.logs_dir),
            ("backup.task_logs_dir", &self.backup.task_logs_dir),
            ("backup.blobstore_dir", &self.backup.blobstore_dir),
            ("backup.destination_dir", &self.backup.destination_dir),
            ("snapshot.snapshot_dir", &self.snapshot.snapshot_dir),
        ];
        for (key, path) in paths {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Invalid(format!("{key} must not be empty")));
            }
        }
        if self.agent.store_path == self.agent.migration_target_path {
            return Err(ConfigError::Invalid(
                "agent.store_path and agent.migration_target_path must differ".to_string(),
            ));
        }
        self.backup.check_dump_name().map_err(ConfigError::Invalid)?;
        if self.scheduler.tick_ms == 0 {
            return Err(ConfigError::Invalid(
                "scheduler.tick_ms must be greater than 0".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for entry in &self.scheduler.entries {
            if entry.name.is_empty() {
                return Err(ConfigError::Invalid(
                    "scheduler entry name must not be empty".to_string(),
                ));
            }
            if !seen.insert(entry.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate scheduler entry `{}`",
                    entry.name
                )));
            }
            if entry.every_secs == 0 {
                return Err(ConfigError::Invalid(format!(
                    "scheduler entry `{}`: every_secs must be greater than 0",
                    entry.name
                )));
            }
        }
        Ok(())
    }
}
