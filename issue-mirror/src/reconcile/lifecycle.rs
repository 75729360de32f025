//! Mirrors the GitLab open/closed state onto subtask completion.

use std::fmt;

use tracing::debug;

use crate::backend::TaskTracker;
use crate::error::SyncError;
use crate::types::IssueState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    MarkComplete,
    MarkIncomplete,
}

impl LifecycleAction {
    pub fn completed(self) -> bool {
        matches!(self, LifecycleAction::MarkComplete)
    }
}

impl fmt::Display for LifecycleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleAction::MarkComplete => write!(f, "completed"),
            LifecycleAction::MarkIncomplete => write!(f, "reopened"),
        }
    }
}

/// At most one action; none when the subtask already agrees with the issue.
pub fn plan_lifecycle(state: IssueState, completed: bool) -> Option<LifecycleAction> {
    match (state.is_closed(), completed) {
        (true, false) => Some(LifecycleAction::MarkComplete),
        (false, true) => Some(LifecycleAction::MarkIncomplete),
        _ => None,
    }
}

/// Plan and apply the completion flip for one subtask.
pub async fn apply_lifecycle(
    tracker: &dyn TaskTracker,
    task_id: &str,
    state: IssueState,
    completed: bool,
) -> Result<Option<LifecycleAction>, SyncError> {
    let action = plan_lifecycle(state, completed);
    match action {
        Some(action) => {
            debug!("Issue is {state}, marking subtask {task_id} {action}");
            tracker.set_completion(task_id, action.completed()).await?;
        }
        None => debug!("Subtask {task_id} already agrees with issue state {state}"),
    }
    Ok(action)
}
