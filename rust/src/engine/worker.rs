//! Workers and the fixed-size worker pool.

use crate::models::{SkillId, TaskId, WorkerId};

/// Remaining work at or below this counts as finished.
pub const COMPLETION_EPSILON: f64 = 1e-9;

/// What a worker is doing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum WorkerState {
    Idle,
    Working { task: TaskId, remaining: f64 },
}

/// A worker with one fixed skill and at most one assignment.
#[derive(Clone, Debug)]
pub struct Worker {
    pub id: WorkerId,
    pub skill: SkillId,
    pub state: WorkerState,
    /// Most recent task claimed this run
    pub last_task: Option<TaskId>,
    pub context_switches: u32,
}

impl Worker {
    pub fn new(id: WorkerId, skill: SkillId) -> Self {
        Self {
            id,
            skill,
            state: WorkerState::Idle,
            last_task: None,
            context_switches: 0,
        }
    }

    #[inline]
    pub fn current_task(&self) -> Option<TaskId> {
        match self.state {
            WorkerState::Working { task, .. } => Some(task),
            WorkerState::Idle => None,
        }
    }

    #[inline]
    pub fn is_working(&self) -> bool {
        matches!(self.state, WorkerState::Working { .. })
    }

    /// Start working on `task`. Returns true if this counts as a context switch,
    /// i.e. the worker previously held a different task.
    pub fn assign(&mut self, task: TaskId, remaining: f64) -> bool {
        assert!(
            !self.is_working(),
            "worker {} assigned task {task} while busy",
            self.id
        );
        let switched = matches!(self.last_task, Some(previous) if previous != task);
        if switched {
            self.context_switches += 1;
        }
        self.last_task = Some(task);
        self.state = WorkerState::Working { task, remaining };
        switched
    }

    /// Apply one tick of progress. Returns the task if it finished, leaving the
    /// worker idle.
    pub fn apply_work(&mut self, progress: f64) -> Option<TaskId> {
        let WorkerState::Working { task, remaining } = &mut self.state else {
            return None;
        };
        *remaining -= progress;
        debug_assert!(
            *remaining > -1.0 - COMPLETION_EPSILON,
            "remaining work of task {task} fell to {remaining}"
        );
        if *remaining <= COMPLETION_EPSILON {
            let finished = *task;
            self.state = WorkerState::Idle;
            return Some(finished);
        }
        None
    }

    /// Drop the current task, handing back its remaining work.
    pub fn release(&mut self) -> Option<(TaskId, f64)> {
        match std::mem::replace(&mut self.state, WorkerState::Idle) {
            WorkerState::Working { task, remaining } => Some((task, remaining)),
            WorkerState::Idle => None,
        }
    }
}

/// Fixed set of workers, indexed by worker id.
#[derive(Clone, Debug, Default)]
pub struct WorkerPool {
    workers: Vec<Worker>,
}

impl WorkerPool {
    /// Create `count` idle workers; `skill_of` maps a worker id to its skill.
    pub fn new(count: u32, skill_of: impl Fn(WorkerId) -> SkillId) -> Self {
        Self {
            workers: (0..count).map(|id| Worker::new(id, skill_of(id))).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    pub fn get(&self, id: WorkerId) -> &Worker {
        &self.workers[id as usize]
    }

    pub fn get_mut(&mut self, id: WorkerId) -> &mut Worker {
        &mut self.workers[id as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Worker> {
        self.workers.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Worker> {
        self.workers.iter_mut()
    }

    pub fn any_working(&self) -> bool {
        self.workers.iter().any(Worker::is_working)
    }

    pub fn busy_count(&self) -> u32 {
        self.workers.iter().filter(|w| w.is_working()).count() as u32
    }

    pub fn context_switches(&self) -> Vec<u32> {
        self.workers.iter().map(|w| w.context_switches).collect()
    }
}
