//! Asana REST API 1.0 client
//!
//! Covers the handful of endpoints the mirror needs: workspace and custom
//! field lookup, custom-field task search, subtasks, stories (comments) and
//! task completion. Every response is wrapped in a `{ "data": ... }` envelope;
//! list endpoints paginate through `next_page.offset`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::backend::TaskTracker;
use crate::error::SyncError;
use crate::pagination::{Page, PageCursor};
use crate::types::{
    AsanaConfig, ChildTask, CustomFieldValue, HttpConfig, NewChildTask, StoryComment, TaskSummary,
};

/// Page size requested from list endpoints that support `limit`.
const PAGE_LIMIT: &str = "100";

// ---------------------------------------------------------------------------
// Internal Asana API response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct ListEnvelope<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
    next_page: Option<NextPage>,
}

#[derive(Debug, Deserialize)]
struct NextPage {
    offset: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NamedResource {
    gid: String,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AsanaTask {
    gid: String,
    name: Option<String>,
    completed: Option<bool>,
    custom_fields: Option<Vec<AsanaCustomField>>,
}

#[derive(Debug, Deserialize)]
struct AsanaCustomField {
    gid: String,
    display_value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AsanaStory {
    gid: String,
    #[serde(rename = "type")]
    story_type: Option<String>,
    text: Option<String>,
    html_text: Option<String>,
}

impl AsanaTask {
    fn custom_field_values(&self) -> Vec<CustomFieldValue> {
        self.custom_fields
            .as_ref()
            .map(|fields| {
                fields
                    .iter()
                    .map(|f| CustomFieldValue {
                        field_id: f.gid.clone(),
                        display_value: f.display_value.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn into_summary(self) -> TaskSummary {
        let custom_fields = self.custom_field_values();
        TaskSummary {
            id: self.gid,
            title: self.name.unwrap_or_default(),
            custom_fields,
        }
    }

    fn into_child(self) -> ChildTask {
        let custom_fields = self.custom_field_values();
        ChildTask {
            id: self.gid,
            title: self.name.unwrap_or_default(),
            custom_fields,
            completed: self.completed.unwrap_or(false),
        }
    }
}

impl From<AsanaStory> for StoryComment {
    fn from(story: AsanaStory) -> Self {
        StoryComment {
            handle: story.gid,
            html_text: story.html_text.or(story.text).unwrap_or_default(),
            is_comment: story.story_type.as_deref() == Some("comment"),
        }
    }
}

// ---------------------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct DataPayload<T: Serialize> {
    data: T,
}

#[derive(Debug, Serialize)]
struct StoryPayload<'a> {
    html_text: &'a str,
}

#[derive(Debug, Serialize)]
struct CompletionPayload {
    completed: bool,
}

// ---------------------------------------------------------------------------
// Error helpers
// ---------------------------------------------------------------------------

/// Custom error type for Asana API operations.
#[derive(Debug, thiserror::Error)]
pub enum AsanaError {
    #[error("Authentication failed (401). Check ASANA_PAT")]
    AuthFailed,
    #[error("Permission denied (403). The token may lack access to this resource")]
    PermissionDenied,
    #[error("Resource not found (404): {0}")]
    NotFound(String),
    #[error("Invalid request (400): {0}")]
    BadRequest(String),
    #[error("Rate limited (429) on {0}")]
    RateLimited(String),
    #[error("Asana API error (HTTP {status}): {message}")]
    HttpError { status: u16, message: String },
    #[error(transparent)]
    Request(#[from] reqwest::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Asana REST API client.
pub struct AsanaClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl std::fmt::Debug for AsanaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsanaClient")
            .field("base_url", &self.base_url)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl AsanaClient {
    /// Create a client for the configured API root with a personal access token.
    pub fn new(config: &AsanaConfig, http: &HttpConfig, token: &str) -> Result<Self, AsanaError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(http.timeout_secs.max(1)))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token: token.trim().to_string(),
        })
    }

    // -----------------------------------------------------------------------
    // Generic HTTP helpers
    // -----------------------------------------------------------------------

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<T, AsanaError> {
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(&self.token)
            .header("Accept", "application/json")
            .query(query)
            .send()
            .await?;

        self.handle_response(resp, path).await
    }

    async fn send_json<T: DeserializeOwned, B: Serialize>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &B,
    ) -> Result<T, AsanaError> {
        let resp = self
            .client
            .request(method, self.url(path))
            .bearer_auth(&self.token)
            .header("Accept", "application/json")
            .json(body)
            .send()
            .await?;

        self.handle_response(resp, path).await
    }

    async fn send_json_no_response<B: Serialize>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &B,
    ) -> Result<(), AsanaError> {
        let resp = self
            .client
            .request(method, self.url(path))
            .bearer_auth(&self.token)
            .header("Accept", "application/json")
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            let body_text = resp.text().await.unwrap_or_default();
            map_http_error(status, path, &body_text)
        }
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
        path: &str,
    ) -> Result<T, AsanaError> {
        let status = resp.status();
        if status.is_success() {
            let parsed = resp
                .json::<T>()
                .await
                .map_err(|e| anyhow::anyhow!("Failed to parse Asana response: {e}"))?;
            Ok(parsed)
        } else {
            let body_text = resp.text().await.unwrap_or_default();
            map_http_error(status, path, &body_text)
        }
    }

    /// Fetch one page of a list endpoint.
    async fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        offset: Option<&str>,
    ) -> Result<Page<T>, AsanaError> {
        let mut params: Vec<(String, String)> = query
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        if let Some(offset) = offset {
            params.push(("offset".to_string(), offset.to_string()));
        }

        let resp: ListEnvelope<T> = self.get(path, &params).await?;
        Ok(Page {
            items: resp.data,
            next_offset: resp.next_page.and_then(|p| p.offset),
        })
    }

    /// Drain every page of a list endpoint.
    async fn get_all<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, AsanaError> {
        let mut cursor = PageCursor::new();
        let mut items = Vec::new();

        while let Some(offset) = cursor.next_request() {
            let page = self.get_page(path, query, offset.as_deref()).await?;
            items.extend(page.items);
            cursor.advance(page.next_offset);
        }

        Ok(items)
    }

    // -----------------------------------------------------------------------
    // Public API methods
    // -----------------------------------------------------------------------

    /// Find the gid of a workspace by exact name.
    pub async fn find_workspace_gid(&self, name: &str) -> Result<Option<String>, AsanaError> {
        let workspaces: Vec<NamedResource> =
            self.get_all("workspaces", &[("limit", PAGE_LIMIT)]).await?;
        Ok(find_by_name(workspaces, name))
    }

    /// Find the gid of a workspace custom field by exact name.
    pub async fn find_custom_field_gid(
        &self,
        workspace_gid: &str,
        name: &str,
    ) -> Result<Option<String>, AsanaError> {
        let fields: Vec<NamedResource> = self
            .get_all(
                &format!("workspaces/{workspace_gid}/custom_fields"),
                &[("limit", PAGE_LIMIT)],
            )
            .await?;
        Ok(find_by_name(fields, name))
    }

    /// One page of incomplete tasks where the custom field is set.
    pub async fn search_tasks(
        &self,
        workspace_gid: &str,
        field_gid: &str,
        offset: Option<&str>,
    ) -> Result<Page<TaskSummary>, AsanaError> {
        let is_set = format!("custom_fields.{field_gid}.is_set");
        let page: Page<AsanaTask> = self
            .get_page(
                &format!("workspaces/{workspace_gid}/tasks/search"),
                &[
                    (is_set.as_str(), "true"),
                    ("completed", "false"),
                    ("opt_fields", "name,custom_fields"),
                    ("limit", PAGE_LIMIT),
                ],
                offset,
            )
            .await?;

        Ok(Page {
            items: page.items.into_iter().map(AsanaTask::into_summary).collect(),
            next_offset: page.next_offset,
        })
    }

    /// All subtasks of a task.
    pub async fn fetch_subtasks(&self, task_gid: &str) -> Result<Vec<ChildTask>, AsanaError> {
        let tasks: Vec<AsanaTask> = self
            .get_all(
                &format!("tasks/{task_gid}/subtasks"),
                &[
                    ("opt_fields", "name,completed,custom_fields"),
                    ("limit", PAGE_LIMIT),
                ],
            )
            .await?;
        Ok(tasks.into_iter().map(AsanaTask::into_child).collect())
    }

    /// All stories of a task, comments and system stories alike.
    pub async fn fetch_stories(&self, task_gid: &str) -> Result<Vec<StoryComment>, AsanaError> {
        let stories: Vec<AsanaStory> = self
            .get_all(
                &format!("tasks/{task_gid}/stories"),
                &[("opt_fields", "type,text,html_text"), ("limit", PAGE_LIMIT)],
            )
            .await?;
        Ok(stories.into_iter().map(StoryComment::from).collect())
    }

    /// Add a comment story to a task.
    pub async fn add_story(&self, task_gid: &str, html_text: &str) -> Result<(), AsanaError> {
        self.send_json_no_response(
            reqwest::Method::POST,
            &format!("tasks/{task_gid}/stories"),
            &DataPayload {
                data: StoryPayload { html_text },
            },
        )
        .await
    }

    /// Replace the text of an existing comment story.
    pub async fn update_story(&self, story_gid: &str, html_text: &str) -> Result<(), AsanaError> {
        self.send_json_no_response(
            reqwest::Method::PUT,
            &format!("stories/{story_gid}"),
            &DataPayload {
                data: StoryPayload { html_text },
            },
        )
        .await
    }

    /// Create a subtask with the tracking custom field preset.
    pub async fn create_subtask(&self, input: &NewChildTask) -> Result<ChildTask, AsanaError> {
        let mut custom_fields = serde_json::Map::new();
        custom_fields.insert(
            input.field_id.clone(),
            serde_json::Value::String(input.field_value.clone()),
        );

        let body = serde_json::json!({
            "data": {
                "name": &input.title,
                "html_notes": &input.html_notes,
                "custom_fields": custom_fields,
            }
        });

        let resp: DataEnvelope<AsanaTask> = self
            .send_json(
                reqwest::Method::POST,
                &format!("tasks/{}/subtasks", input.parent_id),
                &body,
            )
            .await?;

        let mut child = resp.data.into_child();
        if child.title.is_empty() {
            child.title = input.title.clone();
        }
        Ok(child)
    }

    /// Mark a task complete or incomplete.
    pub async fn update_task_completed(
        &self,
        task_gid: &str,
        completed: bool,
    ) -> Result<(), AsanaError> {
        self.send_json_no_response(
            reqwest::Method::PUT,
            &format!("tasks/{task_gid}"),
            &DataPayload {
                data: CompletionPayload { completed },
            },
        )
        .await
    }
}

#[async_trait]
impl TaskTracker for AsanaClient {
    async fn resolve_workspace_id(&self, name: &str) -> Result<String, SyncError> {
        debug!("Searching for Asana workspace named '{name}'");
        let gid = self
            .find_workspace_gid(name)
            .await?
            .ok_or_else(|| SyncError::WorkspaceNotFound(name.to_string()))?;
        debug!("Found Asana workspace gid {gid}");
        Ok(gid)
    }

    async fn resolve_custom_field_id(
        &self,
        workspace_id: &str,
        name: &str,
    ) -> Result<String, SyncError> {
        debug!("Searching for Asana custom field '{name}'");
        let gid = self
            .find_custom_field_gid(workspace_id, name)
            .await?
            .ok_or_else(|| SyncError::CustomFieldNotFound(name.to_string()))?;
        debug!("Found Asana custom field gid {gid}");
        Ok(gid)
    }

    async fn search_tasks_page(
        &self,
        workspace_id: &str,
        field_id: &str,
        offset: Option<&str>,
    ) -> Result<Page<TaskSummary>, SyncError> {
        Ok(self.search_tasks(workspace_id, field_id, offset).await?)
    }

    async fn list_child_tasks(&self, task_id: &str) -> Result<Vec<ChildTask>, SyncError> {
        Ok(self.fetch_subtasks(task_id).await?)
    }

    async fn list_comments(&self, task_id: &str) -> Result<Vec<StoryComment>, SyncError> {
        Ok(self.fetch_stories(task_id).await?)
    }

    async fn create_comment(&self, task_id: &str, body: &str) -> Result<(), SyncError> {
        Ok(self.add_story(task_id, body).await?)
    }

    async fn update_comment(&self, handle: &str, body: &str) -> Result<(), SyncError> {
        Ok(self.update_story(handle, body).await?)
    }

    async fn create_child_task(&self, input: &NewChildTask) -> Result<ChildTask, SyncError> {
        Ok(self.create_subtask(input).await?)
    }

    async fn set_completion(&self, task_id: &str, completed: bool) -> Result<(), SyncError> {
        Ok(self.update_task_completed(task_id, completed).await?)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn find_by_name(resources: Vec<NamedResource>, name: &str) -> Option<String> {
    resources
        .into_iter()
        .find(|r| r.name.as_deref() == Some(name))
        .map(|r| r.gid)
}

fn map_http_error<T>(status: StatusCode, path: &str, body: &str) -> Result<T, AsanaError> {
    warn!(
        "Asana API error: HTTP {} on {}: {}",
        status.as_u16(),
        path,
        body
    );
    match status {
        StatusCode::UNAUTHORIZED => Err(AsanaError::AuthFailed),
        StatusCode::FORBIDDEN => Err(AsanaError::PermissionDenied),
        StatusCode::NOT_FOUND => Err(AsanaError::NotFound(path.to_string())),
        StatusCode::BAD_REQUEST => Err(AsanaError::BadRequest(body.to_string())),
        StatusCode::TOO_MANY_REQUESTS => Err(AsanaError::RateLimited(path.to_string())),
        _ => Err(AsanaError::HttpError {
            status: status.as_u16(),
            message: body.to_string(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
