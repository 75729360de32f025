//! Capabilities the reconciliation engine needs from the two services.
//!
//! The engine only talks to these traits; `AsanaClient` and `GitLabClient`
//! are the production implementations and the tests use in-memory fakes.

use async_trait::async_trait;

use crate::error::SyncError;
use crate::pagination::{Page, PageCursor};
use crate::reference::IssueReference;
use crate::types::{
    ChildTask, IssueMetadata, NewChildTask, StoryComment, TaskSummary, TrackerComment,
};

/// The task-tracking side (Asana).
#[async_trait]
pub trait TaskTracker: Send + Sync {
    async fn resolve_workspace_id(&self, name: &str) -> Result<String, SyncError>;

    async fn resolve_custom_field_id(
        &self,
        workspace_id: &str,
        name: &str,
    ) -> Result<String, SyncError>;

    /// One page of open tasks whose `field_id` custom field is set.
    async fn search_tasks_page(
        &self,
        workspace_id: &str,
        field_id: &str,
        offset: Option<&str>,
    ) -> Result<Page<TaskSummary>, SyncError>;

    /// Every open task whose `field_id` custom field is set, across all pages.
    async fn search_tasks_with_populated_field(
        &self,
        workspace_id: &str,
        field_id: &str,
    ) -> Result<Vec<TaskSummary>, SyncError> {
        let mut cursor = PageCursor::new();
        let mut tasks = Vec::new();

        while let Some(offset) = cursor.next_request() {
            let page = self
                .search_tasks_page(workspace_id, field_id, offset.as_deref())
                .await?;
            tasks.extend(page.items);
            cursor.advance(page.next_offset);
            if !cursor.is_exhausted() {
                tracing::debug!("Fetched {} tasks, getting next page", tasks.len());
            }
        }

        Ok(tasks)
    }

    async fn list_child_tasks(&self, task_id: &str) -> Result<Vec<ChildTask>, SyncError>;

    async fn list_comments(&self, task_id: &str) -> Result<Vec<StoryComment>, SyncError>;

    async fn create_comment(&self, task_id: &str, body: &str) -> Result<(), SyncError>;

    async fn update_comment(&self, handle: &str, body: &str) -> Result<(), SyncError>;

    async fn create_child_task(&self, input: &NewChildTask) -> Result<ChildTask, SyncError>;

    async fn set_completion(&self, task_id: &str, completed: bool) -> Result<(), SyncError>;
}

/// The issue-tracker side (GitLab).
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Instance root used for browser permalinks.
    fn base_url(&self) -> &str;

    async fn get_issue_metadata(
        &self,
        reference: &IssueReference,
    ) -> Result<IssueMetadata, SyncError>;

    /// All notes on the issue, oldest update first.
    async fn get_issue_comments(
        &self,
        reference: &IssueReference,
    ) -> Result<Vec<TrackerComment>, SyncError>;
}
