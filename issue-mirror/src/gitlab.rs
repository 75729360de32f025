//! GitLab REST API v4 client
//!
//! Read-only: issue metadata and the issue's notes. Notes are paginated with
//! `page`/`per_page`; the `x-next-page` response header is empty on the last
//! page.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::backend::IssueTracker;
use crate::error::SyncError;
use crate::pagination::{Page, PageCursor};
use crate::reference::IssueReference;
use crate::types::{GitLabConfig, HttpConfig, IssueMetadata, IssueState, TrackerComment};

const NOTES_PER_PAGE: &str = "100";
const NEXT_PAGE_HEADER: &str = "x-next-page";

// ---------------------------------------------------------------------------
// Internal GitLab API response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GitLabUser {
    name: Option<String>,
    username: Option<String>,
}

impl GitLabUser {
    fn display_name(self) -> Option<String> {
        self.name
            .filter(|n| !n.trim().is_empty())
            .or(self.username)
    }
}

#[derive(Debug, Deserialize)]
struct GitLabIssue {
    title: Option<String>,
    description: Option<String>,
    author: Option<GitLabUser>,
    web_url: Option<String>,
    created_at: Option<String>,
    state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitLabNote {
    id: u64,
    body: Option<String>,
    author: Option<GitLabUser>,
    updated_at: Option<String>,
    #[serde(default)]
    system: bool,
}

impl From<GitLabIssue> for IssueMetadata {
    fn from(issue: GitLabIssue) -> Self {
        IssueMetadata {
            title: issue.title.unwrap_or_default(),
            description: issue.description.filter(|d| !d.is_empty()),
            author: issue.author.and_then(GitLabUser::display_name),
            web_url: issue.web_url.unwrap_or_default(),
            created_at: parse_timestamp(issue.created_at.as_deref()),
            state: IssueState::from_gitlab(issue.state.as_deref().unwrap_or_default()),
        }
    }
}

impl From<GitLabNote> for TrackerComment {
    fn from(note: GitLabNote) -> Self {
        TrackerComment {
            origin_id: note.id,
            author: note.author.and_then(GitLabUser::display_name),
            body: note.body.unwrap_or_default(),
            updated_at: parse_timestamp(note.updated_at.as_deref()),
            is_system: note.system,
        }
    }
}

/// Parse a GitLab ISO 8601 timestamp; anything unparseable becomes `None`.
fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?;
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => Some(dt.with_timezone(&Utc)),
        Err(e) => {
            debug!("Ignoring unparseable GitLab timestamp '{raw}': {e}");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Error helpers
// ---------------------------------------------------------------------------

/// Custom error type for GitLab API operations.
#[derive(Debug, thiserror::Error)]
pub enum GitLabError {
    #[error("Authentication failed (401). Check GITLAB_PAT")]
    AuthFailed,
    #[error("Permission denied (403). The token may lack read_api scope")]
    PermissionDenied,
    #[error("Issue or project not found (404): {0}")]
    NotFound(String),
    #[error("Invalid request (400): {0}")]
    BadRequest(String),
    #[error("GitLab API error (HTTP {status}): {message}")]
    HttpError { status: u16, message: String },
    #[error(transparent)]
    Request(#[from] reqwest::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// GitLab REST API client.
pub struct GitLabClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl std::fmt::Debug for GitLabClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitLabClient")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl GitLabClient {
    /// Create a client for a GitLab instance. Without a token every request
    /// is anonymous, which only works for public projects.
    pub fn new(
        config: &GitLabConfig,
        http: &HttpConfig,
        token: Option<&str>,
    ) -> Result<Self, GitLabError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(http.timeout_secs.max(1)))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: token
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api/v4/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn issue_path(reference: &IssueReference) -> String {
        format!(
            "projects/{}/issues/{}",
            reference.api_path(),
            reference.issue_id()
        )
    }

    async fn send_get(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<reqwest::Response, GitLabError> {
        let mut req = self
            .client
            .get(self.api_url(path))
            .header("Accept", "application/json")
            .query(query);
        if let Some(token) = &self.token {
            req = req.header("PRIVATE-TOKEN", token);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if status.is_success() {
            Ok(resp)
        } else {
            let body_text = resp.text().await.unwrap_or_default();
            map_http_error(status, path, &body_text)
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, GitLabError> {
        let resp = self.send_get(path, &[]).await?;
        let parsed = resp
            .json::<T>()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to parse GitLab response: {e}"))?;
        Ok(parsed)
    }

    /// Fetch one page of notes. `page` is the value of the previous
    /// response's `x-next-page` header, `None` for the first page.
    async fn notes_page(
        &self,
        reference: &IssueReference,
        page: Option<&str>,
    ) -> Result<Page<GitLabNote>, GitLabError> {
        let path = format!("{}/notes", Self::issue_path(reference));
        let resp = self
            .send_get(
                &path,
                &[
                    ("sort", "asc"),
                    ("order_by", "updated_at"),
                    ("per_page", NOTES_PER_PAGE),
                    ("page", page.unwrap_or("1")),
                ],
            )
            .await?;

        let next_offset = resp
            .headers()
            .get(NEXT_PAGE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        let items = resp
            .json::<Vec<GitLabNote>>()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to parse GitLab notes: {e}"))?;

        Ok(Page { items, next_offset })
    }

    /// Fetch the issue itself.
    pub async fn fetch_issue(
        &self,
        reference: &IssueReference,
    ) -> Result<IssueMetadata, GitLabError> {
        let issue: GitLabIssue = self.get(&Self::issue_path(reference)).await?;
        Ok(issue.into())
    }

    /// Fetch every note on the issue, oldest update first.
    pub async fn fetch_notes(
        &self,
        reference: &IssueReference,
    ) -> Result<Vec<TrackerComment>, GitLabError> {
        let mut cursor = PageCursor::new();
        let mut notes = Vec::new();

        while let Some(page) = cursor.next_request() {
            let page = self.notes_page(reference, page.as_deref()).await?;
            notes.extend(page.items.into_iter().map(TrackerComment::from));
            cursor.advance(page.next_offset);
        }

        debug!("Fetched {} notes for {reference}", notes.len());
        Ok(notes)
    }
}

#[async_trait]
impl IssueTracker for GitLabClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_issue_metadata(
        &self,
        reference: &IssueReference,
    ) -> Result<IssueMetadata, SyncError> {
        Ok(self.fetch_issue(reference).await?)
    }

    async fn get_issue_comments(
        &self,
        reference: &IssueReference,
    ) -> Result<Vec<TrackerComment>, SyncError> {
        Ok(self.fetch_notes(reference).await?)
    }
}

fn map_http_error<T>(status: StatusCode, path: &str, body: &str) -> Result<T, GitLabError> {
    warn!(
        "GitLab API error: HTTP {} on {}: {}",
        status.as_u16(),
        path,
        body
    );
    match status {
        StatusCode::UNAUTHORIZED => Err(GitLabError::AuthFailed),
        StatusCode::FORBIDDEN => Err(GitLabError::PermissionDenied),
        StatusCode::NOT_FOUND => Err(GitLabError::NotFound(path.to_string())),
        StatusCode::BAD_REQUEST => Err(GitLabError::BadRequest(body.to_string())),
        _ => Err(GitLabError::HttpError {
            status: status.as_u16(),
            message: body.to_string(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
