//! DirCopier port - recursive, attribute-preserving directory copy.

use std::path::Path;

use async_trait::async_trait;

use crate::domain::AgentError;

/// Copies the *contents* of `source` into `destination`.
///
/// Implementations must fail on any I/O error with
/// `AgentError::CopyFailure`; a partial copy is left as is.
#[async_trait]
pub trait DirCopier: Send + Sync {
    async fn copy(&self, source: &Path, destination: &Path) -> Result<(), AgentError>;
}
