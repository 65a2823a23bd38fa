//! Backlog of tasks that are neither completed nor held by a worker.

use crate::graph::DependencyIndex;
use crate::models::{TaskId, Tick};

/// A queued task, optionally carrying the remaining work of an abandoned attempt.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QueuedTask {
    pub id: TaskId,
    pub remaining: Option<f64>,
}

/// Unclaimed tasks in insertion order.
///
/// A task leaves the queue only through [`TaskQueue::claim`].
#[derive(Clone, Debug, Default)]
pub struct TaskQueue {
    entries: Vec<QueuedTask>,
}

impl TaskQueue {
    pub fn from_ids(ids: impl IntoIterator<Item = TaskId>) -> Self {
        Self {
            entries: ids
                .into_iter()
                .map(|id| QueuedTask {
                    id,
                    remaining: None,
                })
                .collect(),
        }
    }

    pub fn push(&mut self, id: TaskId) {
        debug_assert!(!self.contains(id), "task {id} queued twice");
        self.entries.push(QueuedTask {
            id,
            remaining: None,
        });
    }

    /// Return an abandoned task with its remaining work.
    pub fn requeue(&mut self, id: TaskId, remaining: f64) {
        debug_assert!(!self.contains(id), "task {id} queued twice");
        self.entries.push(QueuedTask {
            id,
            remaining: Some(remaining),
        });
    }

    /// Remove and return the entry at `position`.
    pub fn claim(&mut self, position: usize) -> QueuedTask {
        self.entries.remove(position)
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueuedTask> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True if some queued task's project has not started by `tick`.
    pub fn has_pending_start(&self, index: &DependencyIndex, tick: Tick) -> bool {
        self.entries
            .iter()
            .any(|e| index.get(e.id).start_offset > tick)
    }
}
