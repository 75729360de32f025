//! Run-level error taxonomy.
//!
//! Configuration and lookup errors abort a run. Everything raised while
//! fetching one issue or reconciling one (reference, owning task) pair is
//! caught by the orchestrator and recorded instead.

use crate::asana::AsanaError;
use crate::config::ConfigError;
use crate::gitlab::GitLabError;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Asana workspace \"{0}\" not found")]
    WorkspaceNotFound(String),
    #[error("Custom field \"{0}\" not found in workspace")]
    CustomFieldNotFound(String),
    #[error("{reference} is claimed by {} subtasks of task {owning_task}: {}", .candidates.len(), .candidates.join(", "))]
    AmbiguousMatch {
        reference: String,
        owning_task: String,
        candidates: Vec<String>,
    },
    #[error(transparent)]
    Asana(#[from] AsanaError),
    #[error(transparent)]
    GitLab(#[from] GitLabError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SyncError {
    /// Lookup failures mean no task can be discovered at all.
    pub fn is_lookup(&self) -> bool {
        matches!(
            self,
            SyncError::WorkspaceNotFound(_) | SyncError::CustomFieldNotFound(_)
        )
    }
}
