//! Result Reporter - final outcomes in the shape callers consume.
//!
//! On the wire a report is `{"value": ...}` or
//! `{"exception": {"message": ..., "kind": ...}}`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{AgentError, ErrorKind};
use crate::tracker::TaskRecord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Report {
    Value(serde_json::Value),
    Exception(ExceptionReport),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionReport {
    pub message: String,
    pub kind: ErrorKind,
}

impl Report {
    pub fn from_result(result: Result<serde_json::Value, AgentError>) -> Self {
        match result {
            Ok(value) => Report::Value(value),
            Err(err) => Report::from_error(&err),
        }
    }

    pub fn from_error(err: &AgentError) -> Self {
        Report::Exception(ExceptionReport {
            message: err.to_string(),
            kind: err.kind(),
        })
    }

    pub fn from_record(record: &TaskRecord) -> Self {
        Report::from_result(record.outcome())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Report::Value(_))
    }

    /// One line for a terminal or a log.
    pub fn render_line(&self) -> String {
        match self {
            Report::Value(serde_json::Value::String(text)) => text.clone(),
            Report::Value(value) => value.to_string(),
            Report::Exception(exception) => {
                format!("error ({}): {}", exception.kind.as_str(), exception.message)
            }
        }
    }
}

/// Confirmation shown after a manual backup.
pub fn backup_confirmation(system_name: &str, path: &Path) -> String {
    format!("Backup of {system_name} was put in {}", path.display())
}
