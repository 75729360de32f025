//! Fetches issue metadata and notes for every distinct reference.
//!
//! A failure for one issue never stops the others: it is logged, recorded and
//! the issue is left out of the run.

use tracing::{debug, warn};

use crate::backend::IssueTracker;
use crate::error::SyncError;
use crate::reference::IssueReference;
use crate::types::IssueSnapshot;

/// A reference whose data could not be fetched this run.
#[derive(Debug)]
pub struct FetchFailure {
    pub reference: IssueReference,
    pub error: SyncError,
}

#[derive(Debug, Default)]
pub struct FetchOutcome {
    /// Successfully fetched issues, in input order
    pub snapshots: Vec<IssueSnapshot>,
    pub failures: Vec<FetchFailure>,
}

async fn fetch_one(
    issues: &dyn IssueTracker,
    reference: &IssueReference,
) -> Result<IssueSnapshot, SyncError> {
    let metadata = issues.get_issue_metadata(reference).await?;
    let comments = issues.get_issue_comments(reference).await?;
    Ok(IssueSnapshot {
        reference: reference.clone(),
        metadata,
        comments,
    })
}

/// Fetch every reference sequentially.
pub async fn fetch_issue_data<'a, I>(issues: &dyn IssueTracker, references: I) -> FetchOutcome
where
    I: IntoIterator<Item = &'a IssueReference>,
{
    let mut outcome = FetchOutcome::default();

    for reference in references {
        debug!("Fetching GitLab issue {reference}");
        match fetch_one(issues, reference).await {
            Ok(snapshot) => {
                debug!(
                    "Fetched {reference}: {} notes, state {}",
                    snapshot.comments.len(),
                    snapshot.metadata.state
                );
                outcome.snapshots.push(snapshot);
            }
            Err(error) => {
                warn!("Failed to fetch GitLab issue {reference}: {error}");
                outcome.failures.push(FetchFailure {
                    reference: reference.clone(),
                    error,
                });
            }
        }
    }

    outcome
}
