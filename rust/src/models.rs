//! Core data types for the simulation.

use pyo3::prelude::*;

/// Task identifier; also the task's index in the task arena.
pub type TaskId = u32;
/// Project identifier (dense, starting at 0).
pub type ProjectId = u32;
/// Index into the configured skill set.
pub type SkillId = u32;
/// Worker identifier (0..num_workers).
pub type WorkerId = u32;
/// Discrete simulation time. Tick 0 is the instant before any work.
pub type Tick = u64;

/// A unit of work belonging to one project.
#[pyclass]
#[derive(Clone, Debug, PartialEq)]
pub struct Task {
    #[pyo3(get)]
    pub id: TaskId,
    #[pyo3(get)]
    pub project_id: ProjectId,
    /// Work units needed at full productivity
    #[pyo3(get)]
    pub duration: u32,
    #[pyo3(get)]
    pub skill: SkillId,
    /// Same-project tasks that must complete before this one can be claimed
    #[pyo3(get)]
    pub dependencies: Vec<TaskId>,
    /// First tick at which the task may be claimed
    #[pyo3(get)]
    pub start_offset: Tick,
    #[pyo3(get)]
    pub is_review: bool,
    #[pyo3(get)]
    pub completed: bool,
}

impl Task {
    /// Create a regular, not yet completed task with no start offset.
    pub fn new(
        id: TaskId,
        project_id: ProjectId,
        duration: u32,
        skill: SkillId,
        dependencies: Vec<TaskId>,
    ) -> Self {
        Self {
            id,
            project_id,
            duration,
            skill,
            dependencies,
            start_offset: 0,
            is_review: false,
            completed: false,
        }
    }

    /// Set the project start offset.
    pub fn with_start_offset(mut self, start_offset: Tick) -> Self {
        self.start_offset = start_offset;
        self
    }
}

#[pymethods]
impl Task {
    #[new]
    #[pyo3(signature = (id, project_id, duration, skill, dependencies=None, start_offset=0))]
    fn py_new(
        id: TaskId,
        project_id: ProjectId,
        duration: u32,
        skill: SkillId,
        dependencies: Option<Vec<TaskId>>,
        start_offset: Tick,
    ) -> Self {
        Self::new(
            id,
            project_id,
            duration,
            skill,
            dependencies.unwrap_or_default(),
        )
        .with_start_offset(start_offset)
    }

    fn __repr__(&self) -> String {
        format!(
            "Task(id={}, project={}, duration={}, skill={}, deps={}, review={})",
            self.id,
            self.project_id,
            self.duration,
            self.skill,
            self.dependencies.len(),
            self.is_review
        )
    }
}

/// How a run ended.
#[pyclass(eq, eq_int)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// Backlog empty and no work in progress.
    Completed,
    /// No progress for `stall_ticks` consecutive ticks.
    Stalled,
    /// The `max_ticks` ceiling was reached first.
    TickLimitReached,
}

/// First assignment and final completion of a project.
#[pyclass]
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectSpan {
    #[pyo3(get)]
    pub project_id: ProjectId,
    #[pyo3(get)]
    pub start_offset: Tick,
    #[pyo3(get)]
    pub start_tick: Option<Tick>,
    #[pyo3(get)]
    pub end_tick: Option<Tick>,
}

#[pymethods]
impl ProjectSpan {
    /// Ticks from first assignment to completion, inclusive.
    pub fn duration(&self) -> Option<Tick> {
        match (self.start_tick, self.end_tick) {
            (Some(start), Some(end)) => Some(end - start + 1),
            _ => None,
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "ProjectSpan(project_id={}, start={:?}, end={:?})",
            self.project_id, self.start_tick, self.end_tick
        )
    }
}

/// What one worker held during one tick.
#[pyclass]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TraceEntry {
    #[pyo3(get)]
    pub tick: Tick,
    #[pyo3(get)]
    pub worker_id: WorkerId,
    #[pyo3(get)]
    pub task_id: Option<TaskId>,
}

/// Aggregate state sampled once per tick.
#[pyclass]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickMetrics {
    #[pyo3(get)]
    pub tick: Tick,
    /// Distinct projects with in-progress work this tick
    #[pyo3(get)]
    pub active_projects: u32,
    #[pyo3(get)]
    pub overhead: f64,
    /// Work units completed per working worker this tick
    #[pyo3(get)]
    pub productivity: f64,
    #[pyo3(get)]
    pub busy_workers: u32,
    /// Cumulative completed tasks at the end of the tick
    #[pyo3(get)]
    pub completed_tasks: u32,
    /// Tasks left in the queue at the end of the tick
    #[pyo3(get)]
    pub queued_tasks: u32,
}

/// Everything a run produced; the hand-off to reporting and plotting.
#[pyclass]
#[derive(Clone, Debug)]
pub struct SimulationResult {
    #[pyo3(get)]
    pub outcome: RunOutcome,
    #[pyo3(get)]
    pub total_ticks: Tick,
    #[pyo3(get)]
    pub completed_tasks: u32,
    #[pyo3(get)]
    pub projects: Vec<ProjectSpan>,
    /// Indexed by worker id
    #[pyo3(get)]
    pub context_switches: Vec<u32>,
    #[pyo3(get)]
    pub trace: Vec<TraceEntry>,
    #[pyo3(get)]
    pub metrics: Vec<TickMetrics>,
    /// Unordered worker pairs that shared a project during some tick, sorted
    #[pyo3(get)]
    pub interactions: Vec<(WorkerId, WorkerId)>,
    /// Final task records, review tasks included
    #[pyo3(get)]
    pub tasks: Vec<Task>,
    #[pyo3(get)]
    pub seed: Option<u64>,
}

#[pymethods]
impl SimulationResult {
    /// Sum of context switches over all workers.
    pub fn total_context_switches(&self) -> u64 {
        self.context_switches.iter().map(|&c| c as u64).sum()
    }

    /// Mean productivity over ticks with in-progress work.
    pub fn mean_productivity(&self) -> Option<f64> {
        let busy: Vec<f64> = self
            .metrics
            .iter()
            .filter(|m| m.busy_workers > 0)
            .map(|m| m.productivity)
            .collect();
        if busy.is_empty() {
            return None;
        }
        Some(busy.iter().sum::<f64>() / busy.len() as f64)
    }

    /// Per-project durations for finished projects.
    pub fn project_durations(&self) -> Vec<Tick> {
        self.projects.iter().filter_map(|p| p.duration()).collect()
    }

    pub fn is_completed(&self) -> bool {
        self.outcome == RunOutcome::Completed
    }

    fn __repr__(&self) -> String {
        format!(
            "SimulationResult(outcome={:?}, total_ticks={}, completed_tasks={}, projects={})",
            self.outcome,
            self.total_ticks,
            self.completed_tasks,
            self.projects.len()
        )
    }
}
