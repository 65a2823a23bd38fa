//! Task arena with dependency lookups and graph validation.

use std::collections::VecDeque;

use thiserror::Error;

use crate::models::{Task, TaskId};

/// Problems with a caller-supplied task set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Task at position {position} has id {found}; ids must be dense and in order")]
    NonSequentialId { position: usize, found: TaskId },
    #[error("Task {0} has zero duration")]
    ZeroDuration(TaskId),
    #[error("Task {task} depends on unknown task {dependency}")]
    UnknownDependency { task: TaskId, dependency: TaskId },
    #[error("Task {task} depends on task {dependency} of another project")]
    CrossProjectDependency { task: TaskId, dependency: TaskId },
    #[error("Circular dependency detected in task graph")]
    CircularDependency,
}

/// Order tasks so every task comes after all of its dependencies (Kahn's algorithm).
///
/// Returns `GraphError::CircularDependency` if no such order exists. Dependencies
/// on ids outside the slice are ignored here; [`DependencyIndex::new`] rejects them.
pub fn topological_order(tasks: &[Task]) -> Result<Vec<TaskId>, GraphError> {
    let n = tasks.len();
    let mut remaining_deps: Vec<usize> = vec![0; n];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];

    for (i, task) in tasks.iter().enumerate() {
        for &dep in &task.dependencies {
            let dep = dep as usize;
            if dep < n {
                remaining_deps[i] += 1;
                dependents[dep].push(i);
            }
        }
    }

    let mut queue: VecDeque<usize> = (0..n).filter(|&i| remaining_deps[i] == 0).collect();
    let mut order: Vec<TaskId> = Vec::with_capacity(n);

    while let Some(i) = queue.pop_front() {
        order.push(tasks[i].id);
        for &dependent in &dependents[i] {
            remaining_deps[dependent] -= 1;
            if remaining_deps[dependent] == 0 {
                queue.push_back(dependent);
            }
        }
    }

    if order.len() != n {
        return Err(GraphError::CircularDependency);
    }
    Ok(order)
}

/// Arena of tasks indexed by id, answering "are all dependencies complete?".
///
/// Completion flags are only ever set through [`DependencyIndex::mark_complete`].
#[derive(Clone, Debug, Default)]
pub struct DependencyIndex {
    tasks: Vec<Task>,
}

impl DependencyIndex {
    /// Validate a task set and take ownership of it.
    pub fn new(tasks: Vec<Task>) -> Result<Self, GraphError> {
        for (position, task) in tasks.iter().enumerate() {
            if task.id as usize != position {
                return Err(GraphError::NonSequentialId {
                    position,
                    found: task.id,
                });
            }
            if task.duration == 0 {
                return Err(GraphError::ZeroDuration(task.id));
            }
            for &dependency in &task.dependencies {
                let Some(dep_task) = tasks.get(dependency as usize) else {
                    return Err(GraphError::UnknownDependency {
                        task: task.id,
                        dependency,
                    });
                };
                if dep_task.project_id != task.project_id {
                    return Err(GraphError::CrossProjectDependency {
                        task: task.id,
                        dependency,
                    });
                }
            }
        }
        topological_order(&tasks)?;
        Ok(Self { tasks })
    }

    #[inline]
    pub fn get(&self, id: TaskId) -> &Task {
        &self.tasks[id as usize]
    }

    /// True iff every dependency of `id` is complete.
    #[inline]
    pub fn is_ready(&self, id: TaskId) -> bool {
        self.get(id)
            .dependencies
            .iter()
            .all(|&dep| self.tasks[dep as usize].completed)
    }

    /// Flip the completion flag of `id`. Completing a task twice is a logic bug.
    pub fn mark_complete(&mut self, id: TaskId) {
        let task = &mut self.tasks[id as usize];
        assert!(!task.completed, "task {id} completed twice");
        task.completed = true;
    }

    /// Append a task created mid-run, assigning it the next id.
    pub fn push(&mut self, mut task: Task) -> TaskId {
        let id = self.tasks.len() as TaskId;
        debug_assert!(task.dependencies.iter().all(|&dep| dep < id));
        task.id = id;
        self.tasks.push(task);
        id
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn into_tasks(self) -> Vec<Task> {
        self.tasks
    }
}
