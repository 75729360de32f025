//! Comment reconciliation. Keeps a subtask's comments in lockstep with the
//! GitLab note thread.
//!
//! Only stories whose body starts with the `[Comment <id>]` marker are ours.
//! Anything else on the subtask is left alone: never updated, never deleted.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::backend::TaskTracker;
use crate::error::SyncError;
use crate::render::parse_comment_marker;
use crate::types::{MirrorComment, StoryComment, TrackerComment};

/// A mirror comment that does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedCreate {
    pub origin_id: u64,
    pub body: String,
}

/// A mirror comment whose text no longer matches its note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedUpdate {
    pub handle: String,
    pub origin_id: u64,
    pub body: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentPlan {
    /// In tracker order
    pub creates: Vec<PlannedCreate>,
    pub updates: Vec<PlannedUpdate>,
    pub unchanged: usize,
}

impl CommentPlan {
    pub fn is_noop(&self) -> bool {
        self.creates.is_empty() && self.updates.is_empty()
    }
}

/// Counts of what one comment pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommentSyncStats {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
}

impl CommentSyncStats {
    pub fn add(&mut self, other: CommentSyncStats) {
        self.created += other.created;
        self.updated += other.updated;
        self.unchanged += other.unchanged;
    }
}

/// Pick out the stories that carry a parseable marker.
///
/// When several stories claim the same note only the first (oldest) one is
/// treated as its mirror.
pub fn extract_mirror_comments(stories: &[StoryComment]) -> Vec<MirrorComment> {
    let mut seen = HashSet::new();
    let mut mirrors = Vec::new();

    for story in stories.iter().filter(|s| s.is_comment) {
        let Some(origin_id) = parse_comment_marker(&story.html_text) else {
            continue;
        };
        if !seen.insert(origin_id) {
            debug!(
                "Ignoring duplicate mirror of note {origin_id} in story {}",
                story.handle
            );
            continue;
        }
        mirrors.push(MirrorComment {
            handle: story.handle.clone(),
            origin_id,
            body: story.html_text.clone(),
        });
    }

    mirrors
}

/// Compute the creates and updates needed to mirror `tracker_comments`.
///
/// System notes are skipped. A note id repeated in the input is planned once.
pub fn plan_comment_sync<F>(
    tracker_comments: &[TrackerComment],
    mirror_comments: &[MirrorComment],
    render: F,
) -> CommentPlan
where
    F: Fn(&TrackerComment) -> String,
{
    let existing: HashMap<u64, &MirrorComment> = mirror_comments
        .iter()
        .map(|m| (m.origin_id, m))
        .collect();

    let mut plan = CommentPlan::default();
    let mut planned = HashSet::new();

    for comment in tracker_comments.iter().filter(|c| !c.is_system) {
        if !planned.insert(comment.origin_id) {
            continue;
        }

        let body = render(comment);
        match existing.get(&comment.origin_id) {
            None => plan.creates.push(PlannedCreate {
                origin_id: comment.origin_id,
                body,
            }),
            Some(mirror) if mirror.body != body => plan.updates.push(PlannedUpdate {
                handle: mirror.handle.clone(),
                origin_id: comment.origin_id,
                body,
            }),
            Some(_) => plan.unchanged += 1,
        }
    }

    plan
}

/// Execute a plan against a subtask: creates first, then updates.
pub async fn apply_comment_plan(
    tracker: &dyn TaskTracker,
    task_id: &str,
    plan: &CommentPlan,
) -> Result<CommentSyncStats, SyncError> {
    let mut stats = CommentSyncStats {
        unchanged: plan.unchanged,
        ..CommentSyncStats::default()
    };
    if plan.is_noop() {
        debug!("Comments on subtask {task_id} are up to date");
        return Ok(stats);
    }

    for create in &plan.creates {
        debug!("Adding comment {} to subtask {task_id}", create.origin_id);
        tracker.create_comment(task_id, &create.body).await?;
        stats.created += 1;
    }

    for update in &plan.updates {
        debug!(
            "Updating comment {} (story {}) on subtask {task_id}",
            update.origin_id, update.handle
        );
        tracker.update_comment(&update.handle, &update.body).await?;
        stats.updated += 1;
    }

    Ok(stats)
}
