//! Errors - the closed set of failures an agent operation can report.
//!
//! Every operation returns `AgentError` instead of panicking. Long-running
//! handlers never surface these to the dispatcher's caller directly; the
//! dispatcher records them on the task as a [`TaskFailure`](crate::tracker::TaskFailure).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// ErrorKind classifies a failure for operators.
///
/// - Transient: retrying later may succeed (a busy device, a dump that timed out)
/// - Permanent: the request itself is wrong (unknown message, bad arguments)
/// - Infrastructure: the host or its devices misbehaved (mount/copy/io)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Transient,
    Permanent,
    Infrastructure,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Transient => "transient",
            ErrorKind::Permanent => "permanent",
            ErrorKind::Infrastructure => "infrastructure",
        }
    }
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("unknown message `{name}`")]
    UnknownMessage { name: String },

    #[error("invalid arguments for `{message}`: {cause}")]
    InvalidArguments { message: String, cause: String },

    #[error("disk with cid `{cid}` could not be found")]
    DiskNotFound { cid: String },

    #[error(
        "Failed to mount: {device} {} (exit code {})",
        .mountpoint.display(),
        exit_code(.exit_status)
    )]
    MountFailure {
        device: String,
        mountpoint: PathBuf,
        exit_status: Option<i32>,
    },

    #[error(
        "Failed to unmount: {} (exit code {})",
        .mountpoint.display(),
        exit_code(.exit_status)
    )]
    UnmountFailure {
        mountpoint: PathBuf,
        exit_status: Option<i32>,
    },

    #[error(
        "failed to copy {} to {}: {cause}",
        .source_dir.display(),
        .destination_dir.display()
    )]
    CopyFailure {
        source_dir: PathBuf,
        destination_dir: PathBuf,
        cause: String,
    },

    #[error("Task with id {id} could not be found")]
    TaskNotFound { id: String },

    /// A finished task's recorded failure, re-surfaced by a status query.
    #[error("{message}")]
    TaskFailed { message: String, kind: ErrorKind },

    #[error("scheduled firing of `{entry}` failed: {cause}")]
    ScheduleFiringFailure { entry: String, cause: String },

    #[error("snapshot failed: {cause}")]
    Snapshot { cause: String },

    #[error("backup failed: {cause}")]
    Backup { cause: String },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl AgentError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownMessage { .. }
            | Self::InvalidArguments { .. }
            | Self::DiskNotFound { .. }
            | Self::TaskNotFound { .. } => ErrorKind::Permanent,
            Self::MountFailure { .. }
            | Self::UnmountFailure { .. }
            | Self::CopyFailure { .. }
            | Self::Io { .. } => ErrorKind::Infrastructure,
            Self::ScheduleFiringFailure { .. } | Self::Snapshot { .. } | Self::Backup { .. } => {
                ErrorKind::Transient
            }
            Self::TaskFailed { kind, .. } => *kind,
        }
    }
}

fn exit_code(status: &Option<i32>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "none".to_string(),
    }
}
