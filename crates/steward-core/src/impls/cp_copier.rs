//! CpCopier - `cp -a` based directory copy.

use std::path::Path;

use async_trait::async_trait;
use tokio::process::Command;

use crate::domain::AgentError;
use crate::ports::DirCopier;

/// Archive-mode copy: ownership, modes, timestamps, links and special files
/// survive the move.
#[derive(Debug, Clone, Default)]
pub struct CpCopier;

impl CpCopier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DirCopier for CpCopier {
    async fn copy(&self, source: &Path, destination: &Path) -> Result<(), AgentError> {
        let failure = |cause: String| AgentError::CopyFailure {
            source_dir: source.to_path_buf(),
            destination_dir: destination.to_path_buf(),
            cause,
        };

        // `<source>/.` copies the contents, hidden files included
        let output = Command::new("cp")
            .arg("-a")
            .arg(source.join("."))
            .arg(destination)
            .output()
            .await
            .map_err(|e| failure(format!("could not run cp: {e}")))?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(failure(format!(
                "cp exited with {}: {}",
                output.status,
                stderr.trim()
            )))
        }
    }
}
