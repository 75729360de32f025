//! Builds the reference → owning task index from the custom-field search.

use std::collections::HashMap;

use tracing::debug;

use crate::reference::IssueReference;
use crate::render::is_mirror_title;
use crate::types::{OwningTask, TaskSummary};

/// One reference and every owning task that lists it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub reference: IssueReference,
    pub owning_tasks: Vec<String>,
}

/// Ordered mapping from issue reference to owning task ids.
///
/// Both references and task ids keep first-seen order. Rebuilt every run.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryIndex {
    entries: Vec<IndexEntry>,
    positions: HashMap<IssueReference, usize>,
}

impl DiscoveryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `task_id` lists `reference`. Repeats are ignored.
    pub fn insert(&mut self, reference: IssueReference, task_id: &str) {
        let pos = match self.positions.get(&reference) {
            Some(&pos) => pos,
            None => {
                self.entries.push(IndexEntry {
                    reference: reference.clone(),
                    owning_tasks: Vec::new(),
                });
                self.positions.insert(reference, self.entries.len() - 1);
                self.entries.len() - 1
            }
        };

        let tasks = &mut self.entries[pos].owning_tasks;
        if !tasks.iter().any(|t| t == task_id) {
            tasks.push(task_id.to_string());
        }
    }

    pub fn get(&self, reference: &IssueReference) -> Option<&[String]> {
        self.positions
            .get(reference)
            .map(|&pos| self.entries[pos].owning_tasks.as_slice())
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Distinct references in first-seen order.
    pub fn references(&self) -> impl Iterator<Item = &IssueReference> {
        self.entries.iter().map(|e| &e.reference)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total (reference, owning task) pairs.
    pub fn pair_count(&self) -> usize {
        self.entries.iter().map(|e| e.owning_tasks.len()).sum()
    }
}

/// Build the index from search results, skipping our own mirror subtasks
/// and tasks whose field holds no parseable reference.
pub fn build_index(tasks: &[TaskSummary], field_id: &str) -> DiscoveryIndex {
    let mut index = DiscoveryIndex::new();

    for task in tasks {
        if is_mirror_title(&task.title) {
            debug!("Skipping mirror subtask {} ({})", task.id, task.title);
            continue;
        }

        let owner = OwningTask::from_summary(task, field_id);
        if owner.references.is_empty() {
            debug!(
                "Task {} ({}) has no usable issue references",
                owner.id, owner.title
            );
            continue;
        }

        for reference in owner.references {
            index.insert(reference, &owner.id);
        }
    }

    index
}
