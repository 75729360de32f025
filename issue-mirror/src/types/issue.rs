use chrono::{DateTime, Utc};

use super::enums::IssueState;
use crate::reference::IssueReference;

/// High-level GitLab issue fields needed to build a mirror subtask
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueMetadata {
    pub title: String,
    pub description: Option<String>,
    pub author: Option<String>,
    pub web_url: String,
    pub created_at: Option<DateTime<Utc>>,
    pub state: IssueState,
}

/// A GitLab note on an issue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerComment {
    /// GitLab note id, stable for the lifetime of the note
    pub origin_id: u64,
    pub author: Option<String>,
    pub body: String,
    pub updated_at: Option<DateTime<Utc>>,
    /// State-change audit entries ("closed", "changed the description", ...)
    pub is_system: bool,
}

/// Everything fetched for one reference during a run.
///
/// System notes are kept here and filtered out by the comment reconciler.
#[derive(Debug, Clone)]
pub struct IssueSnapshot {
    pub reference: IssueReference,
    pub metadata: IssueMetadata,
    pub comments: Vec<TrackerComment>,
}
