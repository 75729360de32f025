//! Read-only wrapper around a task tracker for `sync --dry-run`.
//!
//! Reads go to the wrapped tracker. Writes are logged and dropped; a created
//! subtask comes back as a `dry-run-<n>` placeholder so the pass can continue.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tracing::info;

use crate::backend::TaskTracker;
use crate::error::SyncError;
use crate::pagination::Page;
use crate::types::{ChildTask, CustomFieldValue, NewChildTask, StoryComment, TaskSummary};

pub const PLACEHOLDER_PREFIX: &str = "dry-run-";

#[derive(Debug)]
pub struct DryRunTracker<T> {
    inner: T,
    placeholders: AtomicU64,
}

impl<T: TaskTracker> DryRunTracker<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            placeholders: AtomicU64::new(0),
        }
    }

    fn is_placeholder(task_id: &str) -> bool {
        task_id.starts_with(PLACEHOLDER_PREFIX)
    }
}

fn preview(body: &str) -> String {
    const MAX: usize = 80;
    let flat = body.replace('\n', " ");
    match flat.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &flat[..idx]),
        None => flat,
    }
}

#[async_trait]
impl<T: TaskTracker> TaskTracker for DryRunTracker<T> {
    async fn resolve_workspace_id(&self, name: &str) -> Result<String, SyncError> {
        self.inner.resolve_workspace_id(name).await
    }

    async fn resolve_custom_field_id(
        &self,
        workspace_id: &str,
        name: &str,
    ) -> Result<String, SyncError> {
        self.inner.resolve_custom_field_id(workspace_id, name).await
    }

    async fn search_tasks_page(
        &self,
        workspace_id: &str,
        field_id: &str,
        offset: Option<&str>,
    ) -> Result<Page<TaskSummary>, SyncError> {
        self.inner
            .search_tasks_page(workspace_id, field_id, offset)
            .await
    }

    async fn list_child_tasks(&self, task_id: &str) -> Result<Vec<ChildTask>, SyncError> {
        self.inner.list_child_tasks(task_id).await
    }

    async fn list_comments(&self, task_id: &str) -> Result<Vec<StoryComment>, SyncError> {
        if Self::is_placeholder(task_id) {
            return Ok(Vec::new());
        }
        self.inner.list_comments(task_id).await
    }

    async fn create_comment(&self, task_id: &str, body: &str) -> Result<(), SyncError> {
        info!("[dry-run] would comment on {task_id}: {}", preview(body));
        Ok(())
    }

    async fn update_comment(&self, handle: &str, body: &str) -> Result<(), SyncError> {
        info!("[dry-run] would update story {handle}: {}", preview(body));
        Ok(())
    }

    async fn create_child_task(&self, input: &NewChildTask) -> Result<ChildTask, SyncError> {
        let n = self.placeholders.fetch_add(1, Ordering::Relaxed) + 1;
        info!(
            "[dry-run] would create subtask \"{}\" under {}",
            input.title, input.parent_id
        );
        Ok(ChildTask {
            id: format!("{PLACEHOLDER_PREFIX}{n}"),
            title: input.title.clone(),
            custom_fields: vec![CustomFieldValue {
                field_id: input.field_id.clone(),
                display_value: Some(input.field_value.clone()),
            }],
            completed: false,
        })
    }

    async fn set_completion(&self, task_id: &str, completed: bool) -> Result<(), SyncError> {
        let verb = if completed { "complete" } else { "reopen" };
        info!("[dry-run] would {verb} subtask {task_id}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::{run_sync, SyncSettings};
    use crate::testing::{FakeIssueTracker, FakeTaskTracker};
    use crate::types::IssueState;

    fn settings() -> SyncSettings {
        SyncSettings {
            workspace: "Acme".to_string(),
            custom_field: "Gitlab Issues".to_string(),
        }
    }

    #[test]
    fn test_preview_truncates() {
        assert_eq!(preview("a\nb"), "a b");
        let long = "x".repeat(200);
        assert_eq!(preview(&long).len(), 83);
    }

    #[tokio::test]
    async fn test_dry_run_reports_without_writing() {
        let tracker = DryRunTracker::new(
            FakeTaskTracker::new()
                .with_task("T", "Owner", "grp/proj#1, grp/proj#2")
                .with_child("T", "existing", "grp/proj#2", false),
        );
        let issues = FakeIssueTracker::new()
            .with_issue("grp/proj#1", "One", IssueState::Closed, &[(1, "hi")])
            .with_issue("grp/proj#2", "Two", IssueState::Closed, &[(2, "yo")]);

        let report = run_sync(&tracker, &issues, &settings()).await.unwrap();

        assert_eq!(report.subtasks_created(), 1);
        assert_eq!(report.pairs[0].subtask.as_deref(), Some("dry-run-1"));
        assert_eq!(report.comments().created, 2);
        assert_eq!(report.completion_flips(), 2);
        assert!(!report.has_failures());
        assert!(tracker.inner.writes().is_empty());
    }
}
