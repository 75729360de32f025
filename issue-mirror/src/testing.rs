//! In-memory fakes of both trackers for engine tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use anyhow::anyhow;
use async_trait::async_trait;

use crate::backend::{IssueTracker, TaskTracker};
use crate::error::SyncError;
use crate::pagination::Page;
use crate::reference::IssueReference;
use crate::types::{
    ChildTask, CustomFieldValue, IssueMetadata, IssueState, NewChildTask, StoryComment,
    TaskSummary, TrackerComment,
};

pub const FAKE_WORKSPACE: &str = "ws-1";
pub const FAKE_FIELD: &str = "field-1";
pub const FAKE_GITLAB: &str = "https://gitlab.example.com";

/// A write issued against the fake task tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Write {
    CreateComment { task: String, body: String },
    UpdateComment { handle: String, body: String },
    CreateChild { parent: String, title: String, field_value: String },
    SetCompletion { task: String, completed: bool },
}

#[derive(Debug, Default)]
struct TaskStore {
    tasks: Vec<TaskSummary>,
    children: HashMap<String, Vec<ChildTask>>,
    stories: HashMap<String, Vec<StoryComment>>,
    writes: Vec<Write>,
    failing_children: HashSet<String>,
    /// Remaining successful `create_comment` calls before they start failing.
    comment_budget: Option<usize>,
    next_id: u64,
}

impl TaskStore {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }
}

#[derive(Debug)]
pub struct FakeTaskTracker {
    state: Mutex<TaskStore>,
    page_size: usize,
}

impl Default for FakeTaskTracker {
    fn default() -> Self {
        Self {
            state: Mutex::new(TaskStore::default()),
            page_size: 2,
        }
    }
}

impl FakeTaskTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an open task whose tracking field holds `field_value`.
    pub fn with_task(self, id: &str, title: &str, field_value: &str) -> Self {
        self.state.lock().unwrap().tasks.push(TaskSummary {
            id: id.to_string(),
            title: title.to_string(),
            custom_fields: vec![field(field_value)],
        });
        self
    }

    /// Add an existing subtask under `parent`.
    pub fn with_child(self, parent: &str, id: &str, field_value: &str, completed: bool) -> Self {
        self.state
            .lock()
            .unwrap()
            .children
            .entry(parent.to_string())
            .or_default()
            .push(ChildTask {
                id: id.to_string(),
                title: format!("child {id}"),
                custom_fields: vec![field(field_value)],
                completed,
            });
        self
    }

    /// Add a story to a task.
    pub fn with_story(self, task: &str, handle: &str, html_text: &str, is_comment: bool) -> Self {
        self.state
            .lock()
            .unwrap()
            .stories
            .entry(task.to_string())
            .or_default()
            .push(StoryComment {
                handle: handle.to_string(),
                html_text: html_text.to_string(),
                is_comment,
            });
        self
    }

    /// Make `list_child_tasks` fail for one parent.
    pub fn failing_children(self, parent: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_children
            .insert(parent.to_string());
        self
    }

    /// Let the first `n` `create_comment` calls succeed and fail the rest.
    pub fn failing_comment_after(self, n: usize) -> Self {
        self.state.lock().unwrap().comment_budget = Some(n);
        self
    }

    /// Stop failing `create_comment` calls.
    pub fn heal_comments(&self) {
        self.state.lock().unwrap().comment_budget = None;
    }

    pub fn writes(&self) -> Vec<Write> {
        self.state.lock().unwrap().writes.clone()
    }

    pub fn clear_writes(&self) {
        self.state.lock().unwrap().writes.clear();
    }

    pub fn children_of(&self, parent: &str) -> Vec<ChildTask> {
        self.state
            .lock()
            .unwrap()
            .children
            .get(parent)
            .cloned()
            .unwrap_or_default()
    }

    pub fn stories_of(&self, task: &str) -> Vec<StoryComment> {
        self.state
            .lock()
            .unwrap()
            .stories
            .get(task)
            .cloned()
            .unwrap_or_default()
    }
}

fn field(value: &str) -> CustomFieldValue {
    CustomFieldValue {
        field_id: FAKE_FIELD.to_string(),
        display_value: Some(value.to_string()),
    }
}

#[async_trait]
impl TaskTracker for FakeTaskTracker {
    async fn resolve_workspace_id(&self, name: &str) -> Result<String, SyncError> {
        if name == "Acme" {
            Ok(FAKE_WORKSPACE.to_string())
        } else {
            Err(SyncError::WorkspaceNotFound(name.to_string()))
        }
    }

    async fn resolve_custom_field_id(
        &self,
        _workspace_id: &str,
        name: &str,
    ) -> Result<String, SyncError> {
        if name == "Gitlab Issues" {
            Ok(FAKE_FIELD.to_string())
        } else {
            Err(SyncError::CustomFieldNotFound(name.to_string()))
        }
    }

    async fn search_tasks_page(
        &self,
        _workspace_id: &str,
        _field_id: &str,
        offset: Option<&str>,
    ) -> Result<Page<TaskSummary>, SyncError> {
        let state = self.state.lock().unwrap();
        let start: usize = offset.map(|o| o.parse().unwrap()).unwrap_or(0);
        let end = (start + self.page_size).min(state.tasks.len());
        let next_offset = (end < state.tasks.len()).then(|| end.to_string());
        Ok(Page {
            items: state.tasks[start..end].to_vec(),
            next_offset,
        })
    }

    async fn list_child_tasks(&self, task_id: &str) -> Result<Vec<ChildTask>, SyncError> {
        let state = self.state.lock().unwrap();
        if state.failing_children.contains(task_id) {
            return Err(SyncError::Other(anyhow!("subtask listing failed")));
        }
        Ok(state.children.get(task_id).cloned().unwrap_or_default())
    }

    async fn list_comments(&self, task_id: &str) -> Result<Vec<StoryComment>, SyncError> {
        Ok(self.stories_of(task_id))
    }

    async fn create_comment(&self, task_id: &str, body: &str) -> Result<(), SyncError> {
        let mut state = self.state.lock().unwrap();
        match state.comment_budget {
            Some(0) => return Err(SyncError::Other(anyhow!("story creation failed"))),
            Some(n) => state.comment_budget = Some(n - 1),
            None => {}
        }
        let handle = state.next_id("story");
        state
            .stories
            .entry(task_id.to_string())
            .or_default()
            .push(StoryComment {
                handle,
                html_text: body.to_string(),
                is_comment: true,
            });
        state.writes.push(Write::CreateComment {
            task: task_id.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }

    async fn update_comment(&self, handle: &str, body: &str) -> Result<(), SyncError> {
        let mut state = self.state.lock().unwrap();
        for story in state.stories.values_mut().flatten() {
            if story.handle == handle {
                story.html_text = body.to_string();
            }
        }
        state.writes.push(Write::UpdateComment {
            handle: handle.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }

    async fn create_child_task(&self, input: &NewChildTask) -> Result<ChildTask, SyncError> {
        let mut state = self.state.lock().unwrap();
        let child = ChildTask {
            id: state.next_id("sub"),
            title: input.title.clone(),
            custom_fields: vec![CustomFieldValue {
                field_id: input.field_id.clone(),
                display_value: Some(input.field_value.clone()),
            }],
            completed: false,
        };
        state
            .children
            .entry(input.parent_id.clone())
            .or_default()
            .push(child.clone());
        state.writes.push(Write::CreateChild {
            parent: input.parent_id.clone(),
            title: input.title.clone(),
            field_value: input.field_value.clone(),
        });
        Ok(child)
    }

    async fn set_completion(&self, task_id: &str, completed: bool) -> Result<(), SyncError> {
        let mut state = self.state.lock().unwrap();
        for child in state.children.values_mut().flatten() {
            if child.id == task_id {
                child.completed = completed;
            }
        }
        state.writes.push(Write::SetCompletion {
            task: task_id.to_string(),
            completed,
        });
        Ok(())
    }
}

#[derive(Debug, Default)]
struct IssueStore {
    issues: HashMap<IssueReference, (IssueMetadata, Vec<TrackerComment>)>,
    failing_comments: HashSet<IssueReference>,
}

#[derive(Debug, Default)]
pub struct FakeIssueTracker {
    state: Mutex<IssueStore>,
}

impl FakeIssueTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an issue with `(note id, body)` notes, all authored by "Ada".
    pub fn with_issue(
        self,
        reference: &str,
        title: &str,
        state: IssueState,
        notes: &[(u64, &str)],
    ) -> Self {
        let reference = IssueReference::parse(reference).unwrap();
        let metadata = IssueMetadata {
            title: title.to_string(),
            description: None,
            author: Some("Ada".to_string()),
            web_url: format!(
                "{FAKE_GITLAB}/{}/-/issues/{}",
                reference.display_path(),
                reference.issue_id()
            ),
            created_at: None,
            state,
        };
        let comments = notes
            .iter()
            .map(|(id, body)| note(*id, body, false))
            .collect();
        self.state
            .lock()
            .unwrap()
            .issues
            .insert(reference, (metadata, comments));
        self
    }

    /// Make `get_issue_comments` fail for one issue.
    pub fn failing_comments(self, reference: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_comments
            .insert(IssueReference::parse(reference).unwrap());
        self
    }

    pub fn push_note(&self, reference: &str, comment: TrackerComment) {
        let reference = IssueReference::parse(reference).unwrap();
        if let Some((_, comments)) = self.state.lock().unwrap().issues.get_mut(&reference) {
            comments.push(comment);
        }
    }

    pub fn edit_note(&self, reference: &str, origin_id: u64, body: &str) {
        let reference = IssueReference::parse(reference).unwrap();
        if let Some((_, comments)) = self.state.lock().unwrap().issues.get_mut(&reference) {
            for c in comments.iter_mut().filter(|c| c.origin_id == origin_id) {
                c.body = body.to_string();
            }
        }
    }

    pub fn set_state(&self, reference: &str, state: IssueState) {
        let reference = IssueReference::parse(reference).unwrap();
        if let Some((meta, _)) = self.state.lock().unwrap().issues.get_mut(&reference) {
            meta.state = state;
        }
    }
}

pub fn note(id: u64, body: &str, is_system: bool) -> TrackerComment {
    TrackerComment {
        origin_id: id,
        author: Some("Ada".to_string()),
        body: body.to_string(),
        updated_at: None,
        is_system,
    }
}

#[async_trait]
impl IssueTracker for FakeIssueTracker {
    fn base_url(&self) -> &str {
        FAKE_GITLAB
    }

    async fn get_issue_metadata(
        &self,
        reference: &IssueReference,
    ) -> Result<IssueMetadata, SyncError> {
        self.state
            .lock()
            .unwrap()
            .issues
            .get(reference)
            .map(|(meta, _)| meta.clone())
            .ok_or_else(|| SyncError::Other(anyhow!("no such issue {reference}")))
    }

    async fn get_issue_comments(
        &self,
        reference: &IssueReference,
    ) -> Result<Vec<TrackerComment>, SyncError> {
        let state = self.state.lock().unwrap();
        if state.failing_comments.contains(reference) {
            return Err(SyncError::Other(anyhow!("notes unavailable for {reference}")));
        }
        state
            .issues
            .get(reference)
            .map(|(_, comments)| comments.clone())
            .ok_or_else(|| SyncError::Other(anyhow!("no such issue {reference}")))
    }
}
