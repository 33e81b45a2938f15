//! CommandDumper - runs a dump command (e.g. `pg_dump`) and keeps its stdout.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::domain::AgentError;
use crate::ports::DatabaseDumper;

#[derive(Debug, Clone)]
pub struct CommandDumper {
    argv: Vec<String>,
}

impl CommandDumper {
    pub fn new(argv: Vec<String>) -> Self {
        Self { argv }
    }
}

#[async_trait]
impl DatabaseDumper for CommandDumper {
    async fn dump(&self, destination: &Path) -> Result<(), AgentError> {
        let Some((program, args)) = self.argv.split_first() else {
            return Err(AgentError::Backup {
                cause: "no database dump command configured".to_string(),
            });
        };

        debug!(program = %program, "dumping director database");
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| AgentError::Backup {
                cause: format!("could not run {program}: {e}"),
            })?;

        if !output.status.success() {
            return Err(AgentError::Backup {
                cause: format!(
                    "{program} exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }
        if output.stdout.is_empty() {
            return Err(AgentError::Backup {
                cause: format!("{program} produced an empty dump"),
            });
        }

        tokio::fs::write(destination, &output.stdout)
            .await
            .map_err(|e| AgentError::io(format!("write {}", destination.display()), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> CommandDumper {
        CommandDumper::new(vec!["sh".to_string(), "-c".to_string(), script.to_string()])
    }

    #[tokio::test]
    async fn keeps_stdout_as_the_dump() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("director_db.sql");

        sh("echo 'CREATE TABLE deployments;'").dump(&target).await.unwrap();

        let dump = std::fs::read_to_string(&target).unwrap();
        assert_eq!(dump.trim(), "CREATE TABLE deployments;");
    }

    #[tokio::test]
    async fn non_zero_exit_is_a_backup_failure() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("director_db.sql");

        let err = sh("echo 'access denied' >&2; exit 2")
            .dump(&target)
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::Backup { ref cause } if cause.contains("access denied")));
        assert!(!target.exists());
    }

    #[tokio::test]
    async fn empty_dump_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = sh("true")
            .dump(&dir.path().join("director_db.sql"))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Backup { .. }));
    }

    #[tokio::test]
    async fn missing_command_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = CommandDumper::new(Vec::new())
            .dump(&dir.path().join("x"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no database dump command"));
    }
}
