//! One full reconciliation pass.
//!
//! Discovery → fetch → for every (reference, owning task) pair: match,
//! create-or-reconcile comments, reconcile completion. Strictly sequential;
//! nothing is carried over between runs. A failing pair is recorded in the
//! report and the run moves on to the next one.

use tracing::{debug, info, warn};

use crate::backend::{IssueTracker, TaskTracker};
use crate::discovery::{build_index, DiscoveryIndex};
use crate::error::SyncError;
use crate::fetcher::fetch_issue_data;
use crate::matcher::{find_matching_subtask, MatchOutcome};
use crate::reconcile::{
    apply_comment_plan, apply_lifecycle, extract_mirror_comments, plan_comment_sync,
    CommentSyncStats, LifecycleAction,
};
use crate::reference::IssueReference;
use crate::render::{render_comment, subtask_notes, subtask_title};
use crate::types::{ChildTask, IssueSnapshot, NewChildTask};

/// Names resolved against the task tracker at the start of a run.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub workspace: String,
    pub custom_field: String,
}

/// Result of one (reference, owning task) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairOutcome {
    pub reference: IssueReference,
    pub owning_task: String,
    pub subtask: Option<String>,
    pub created_subtask: bool,
    pub comments: CommentSyncStats,
    pub lifecycle: Option<LifecycleAction>,
    pub error: Option<String>,
}

impl PairOutcome {
    fn new(reference: &IssueReference, owning_task: &str) -> Self {
        Self {
            reference: reference.clone(),
            owning_task: owning_task.to_string(),
            subtask: None,
            created_subtask: false,
            comments: CommentSyncStats::default(),
            lifecycle: None,
            error: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// A reference whose issue data could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedFetch {
    pub reference: IssueReference,
    pub error: String,
}

#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    /// Open tasks returned by the custom-field search
    pub tasks_searched: usize,
    /// Distinct references in the discovery index
    pub references: usize,
    pub pairs: Vec<PairOutcome>,
    pub fetch_failures: Vec<FailedFetch>,
}

impl SyncReport {
    pub fn subtasks_created(&self) -> usize {
        self.pairs.iter().filter(|p| p.created_subtask).count()
    }

    pub fn comments(&self) -> CommentSyncStats {
        let mut total = CommentSyncStats::default();
        for pair in &self.pairs {
            total.add(pair.comments);
        }
        total
    }

    pub fn completion_flips(&self) -> usize {
        self.pairs.iter().filter(|p| p.lifecycle.is_some()).count()
    }

    pub fn pair_failures(&self) -> usize {
        self.pairs.iter().filter(|p| !p.is_ok()).count()
    }

    pub fn has_failures(&self) -> bool {
        self.pair_failures() > 0 || !self.fetch_failures.is_empty()
    }
}

/// What discovery found: the resolved field gid and the reference index.
#[derive(Debug, Clone)]
pub struct Discovery {
    pub field_id: String,
    pub tasks_searched: usize,
    pub index: DiscoveryIndex,
}

/// Resolve names and build the discovery index. Every error here is fatal.
pub async fn discover(
    tracker: &dyn TaskTracker,
    settings: &SyncSettings,
) -> Result<Discovery, SyncError> {
    let workspace_id = tracker.resolve_workspace_id(&settings.workspace).await?;
    let field_id = tracker
        .resolve_custom_field_id(&workspace_id, &settings.custom_field)
        .await?;

    info!(
        "Searching workspace \"{}\" for tasks with \"{}\" set",
        settings.workspace, settings.custom_field
    );
    let tasks = tracker
        .search_tasks_with_populated_field(&workspace_id, &field_id)
        .await?;
    let index = build_index(&tasks, &field_id);
    info!(
        "Found {} tasks referencing {} GitLab issues",
        tasks.len(),
        index.len()
    );

    Ok(Discovery {
        field_id,
        tasks_searched: tasks.len(),
        index,
    })
}

/// Run one full reconciliation pass.
pub async fn run_sync(
    tracker: &dyn TaskTracker,
    issues: &dyn IssueTracker,
    settings: &SyncSettings,
) -> Result<SyncReport, SyncError> {
    let Discovery {
        field_id,
        tasks_searched,
        index,
    } = discover(tracker, settings).await?;

    let mut report = SyncReport {
        tasks_searched,
        references: index.len(),
        ..SyncReport::default()
    };

    info!("Fetching {} GitLab issues", index.len());
    let fetched = fetch_issue_data(issues, index.references()).await;
    report.fetch_failures = fetched
        .failures
        .into_iter()
        .map(|f| FailedFetch {
            reference: f.reference,
            error: f.error.to_string(),
        })
        .collect();

    for snapshot in &fetched.snapshots {
        let owners = index.get(&snapshot.reference).unwrap_or_default();
        for owner in owners {
            info!("Syncing {} into task {owner}", snapshot.reference);
            let mut outcome = PairOutcome::new(&snapshot.reference, owner);
            if let Err(e) =
                sync_pair(tracker, issues.base_url(), snapshot, owner, &field_id, &mut outcome)
                    .await
            {
                warn!(
                    "Failed to sync {} into task {owner}: {e}",
                    snapshot.reference
                );
                outcome.error = Some(e.to_string());
            }
            report.pairs.push(outcome);
        }
    }

    Ok(report)
}

/// Drive one pair through match → comments → lifecycle, recording progress
/// into `outcome` as it goes.
async fn sync_pair(
    tracker: &dyn TaskTracker,
    gitlab_base: &str,
    snapshot: &IssueSnapshot,
    owner: &str,
    field_id: &str,
    outcome: &mut PairOutcome,
) -> Result<(), SyncError> {
    let children = tracker.list_child_tasks(owner).await?;
    debug!("Task {owner} has {} subtasks", children.len());

    let (subtask, existing_mirrors) =
        match find_matching_subtask(&children, &snapshot.reference, field_id) {
            MatchOutcome::Matched(child) => {
                debug!("Found existing subtask {}", child.id);
                let stories = tracker.list_comments(&child.id).await?;
                (child, extract_mirror_comments(&stories))
            }
            MatchOutcome::Unmatched => {
                let child = create_subtask(tracker, snapshot, owner, field_id).await?;
                outcome.created_subtask = true;
                (child, Vec::new())
            }
            MatchOutcome::Ambiguous(candidates) => {
                return Err(SyncError::AmbiguousMatch {
                    reference: snapshot.reference.canonical(),
                    owning_task: owner.to_string(),
                    candidates: candidates.into_iter().map(|c| c.id).collect(),
                });
            }
        };
    outcome.subtask = Some(subtask.id.clone());

    let plan = plan_comment_sync(&snapshot.comments, &existing_mirrors, |c| {
        render_comment(gitlab_base, &snapshot.reference, c)
    });
    outcome.comments = apply_comment_plan(tracker, &subtask.id, &plan).await?;

    outcome.lifecycle = apply_lifecycle(
        tracker,
        &subtask.id,
        snapshot.metadata.state,
        subtask.completed,
    )
    .await?;

    Ok(())
}

async fn create_subtask(
    tracker: &dyn TaskTracker,
    snapshot: &IssueSnapshot,
    owner: &str,
    field_id: &str,
) -> Result<ChildTask, SyncError> {
    info!(
        "No subtask for {} under task {owner}, creating one",
        snapshot.reference
    );
    let input = NewChildTask {
        parent_id: owner.to_string(),
        title: subtask_title(&snapshot.reference, &snapshot.metadata),
        html_notes: subtask_notes(&snapshot.metadata),
        field_id: field_id.to_string(),
        field_value: snapshot.reference.canonical(),
    };
    let child = tracker.create_child_task(&input).await?;
    debug!("Created subtask {}", child.id);
    Ok(child)
}
