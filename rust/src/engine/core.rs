//! Core tick loop.

use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;

use crate::config::{AssignmentPolicy, ConfigError, SimulationConfig};
use crate::graph::{DependencyIndex, GraphError};
use crate::models::{
    ProjectId, ProjectSpan, RunOutcome, SimulationResult, SkillId, Task, TaskId, Tick,
    TickMetrics, TraceEntry, WorkerId,
};
use crate::random::Random;
use crate::{log_changes, log_checks, log_debug};

use super::queue::TaskQueue;
use super::worker::WorkerPool;

/// Errors that prevent a run from starting.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
    #[error("Invalid task set: {0}")]
    InvalidTasks(#[from] GraphError),
    #[error("Task {task} requires skill {skill}, which is not in the skill set")]
    UnknownSkill { task: TaskId, skill: SkillId },
}

/// What happened during one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub tick: Tick,
    pub assignments: u32,
    pub completions: u32,
    pub busy_workers: u32,
}

/// Single-run simulation state.
///
/// Each tick, in order:
/// 1. (ungated policy only) working workers may abandon their task;
/// 2. idle workers claim a uniformly random eligible task;
/// 3. the set of projects with in-progress work fixes the tick's overhead,
///    `active_projects * overhead_multiplier`, shared by every working worker;
/// 4. every working worker progresses by `1 / (1 + overhead)` work units;
/// 5. finished tasks are marked complete and their workers freed;
/// 6. one trace entry per worker and one metrics sample are recorded.
///
/// A task claimed at tick `t` receives its first unit of work at tick `t`, so a
/// duration-5 task claimed at tick 1 with no overhead completes at tick 5.
#[derive(Debug)]
pub struct SchedulingEngine {
    index: DependencyIndex,
    queue: TaskQueue,
    workers: WorkerPool,
    rng: Box<dyn Random>,
    policy: AssignmentPolicy,
    overhead_multiplier: f64,
    review_durations: Option<(u32, u32)>,
    stall_ticks: u64,
    max_ticks: Option<Tick>,
    seed: Option<u64>,
    verbosity: u8,

    tick: Tick,
    completed_count: u32,
    /// Consecutive ticks without any progress
    idle_streak: u64,
    spans: Vec<ProjectSpan>,
    /// Uncompleted tasks per project, review tasks included
    outstanding: Vec<u32>,
    trace: Vec<TraceEntry>,
    metrics: Vec<TickMetrics>,
    interactions: FxHashSet<(WorkerId, WorkerId)>,
}

impl SchedulingEngine {
    /// Build the initial state: all workers idle, every uncompleted task queued,
    /// tick 0.
    pub fn new(
        config: &SimulationConfig,
        tasks: Vec<Task>,
        rng: Box<dyn Random>,
    ) -> Result<Self, SimulationError> {
        config.validate()?;
        let policy = config.policy()?;

        let skill_count = config.skills.len() as SkillId;
        if let Some(task) = tasks.iter().find(|t| t.skill >= skill_count) {
            return Err(SimulationError::UnknownSkill {
                task: task.id,
                skill: task.skill,
            });
        }

        let index = DependencyIndex::new(tasks)?;

        let project_count = index
            .tasks()
            .iter()
            .map(|t| t.project_id as usize + 1)
            .max()
            .unwrap_or(0);
        let mut spans: Vec<ProjectSpan> = (0..project_count)
            .map(|p| ProjectSpan {
                project_id: p as ProjectId,
                start_offset: Tick::MAX,
                start_tick: None,
                end_tick: None,
            })
            .collect();
        let mut outstanding = vec![0u32; project_count];
        for task in index.tasks() {
            let span = &mut spans[task.project_id as usize];
            span.start_offset = span.start_offset.min(task.start_offset);
            if !task.completed {
                outstanding[task.project_id as usize] += 1;
            }
        }
        for span in &mut spans {
            if span.start_offset == Tick::MAX {
                span.start_offset = 0;
            }
        }

        let queue = TaskQueue::from_ids(
            index
                .tasks()
                .iter()
                .filter(|t| !t.completed)
                .map(|t| t.id),
        );
        let workers = WorkerPool::new(config.num_workers, |id| config.worker_skill(id));

        let review_durations = config
            .generates_review_tasks
            .then_some((config.review_min_duration, config.review_max_duration));

        log_debug!(
            config.verbosity,
            "Engine ready: {} tasks, {} projects, {} workers, policy {:?}",
            index.len(),
            project_count,
            workers.len(),
            policy
        );

        Ok(Self {
            index,
            queue,
            workers,
            rng,
            policy,
            overhead_multiplier: config.overhead_multiplier,
            review_durations,
            stall_ticks: config.stall_ticks,
            max_ticks: config.max_ticks,
            seed: config.seed,
            verbosity: config.verbosity,
            tick: 0,
            completed_count: 0,
            idle_streak: 0,
            spans,
            outstanding,
            trace: Vec::new(),
            metrics: Vec::new(),
            interactions: FxHashSet::default(),
        })
    }

    /// Last tick processed (0 before the first step).
    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub fn completed_count(&self) -> u32 {
        self.completed_count
    }

    pub fn workers(&self) -> &WorkerPool {
        &self.workers
    }

    pub fn queue(&self) -> &TaskQueue {
        &self.queue
    }

    pub fn tasks(&self) -> &[Task] {
        self.index.tasks()
    }

    pub fn trace(&self) -> &[TraceEntry] {
        &self.trace
    }

    /// Backlog empty and nobody working.
    pub fn is_finished(&self) -> bool {
        self.queue.is_empty() && !self.workers.any_working()
    }

    /// True once `stall_ticks` consecutive ticks passed without progress.
    pub fn is_stalled(&self) -> bool {
        self.idle_streak >= self.stall_ticks
    }

    /// Advance the simulation by one tick.
    pub fn step(&mut self) -> TickSummary {
        self.tick += 1;
        let tick = self.tick;

        if let AssignmentPolicy::Ungated { switch_probability } = self.policy {
            self.abandon_tasks(switch_probability);
        }
        let assignments = self.assign_idle_workers(tick);

        // Overhead comes from the holdings before anyone works this tick.
        let mut project_workers: FxHashMap<ProjectId, Vec<WorkerId>> = FxHashMap::default();
        for worker in self.workers.iter() {
            if let Some(task) = worker.current_task() {
                project_workers
                    .entry(self.index.get(task).project_id)
                    .or_default()
                    .push(worker.id);
            }
        }
        let active_projects = project_workers.len() as u32;
        let overhead = active_projects as f64 * self.overhead_multiplier;
        let productivity = 1.0 / (1.0 + overhead);
        log_debug!(
            self.verbosity,
            "Tick {}: {} active projects, overhead {:.3}, productivity {:.3}",
            tick,
            active_projects,
            overhead,
            productivity
        );

        for members in project_workers.values() {
            for (i, &a) in members.iter().enumerate() {
                for &b in &members[i + 1..] {
                    self.interactions.insert((a.min(b), a.max(b)));
                }
            }
        }

        let mut finished: Vec<(WorkerId, TaskId)> = Vec::new();
        let mut busy_workers = 0;
        for worker in self.workers.iter_mut() {
            let held = worker.current_task();
            self.trace.push(TraceEntry {
                tick,
                worker_id: worker.id,
                task_id: held,
            });
            if held.is_some() {
                busy_workers += 1;
                if let Some(task) = worker.apply_work(productivity) {
                    finished.push((worker.id, task));
                }
            }
        }

        let completions = finished.len() as u32;
        for (worker_id, task) in finished {
            self.complete_task(worker_id, task, tick);
        }

        self.metrics.push(TickMetrics {
            tick,
            active_projects,
            overhead,
            productivity,
            busy_workers,
            completed_tasks: self.completed_count,
            queued_tasks: self.queue.len() as u32,
        });

        let progressed = assignments > 0 || busy_workers > 0;
        if progressed || self.queue.is_empty() || self.queue.has_pending_start(&self.index, tick)
        {
            self.idle_streak = 0;
        } else {
            self.idle_streak += 1;
        }

        TickSummary {
            tick,
            assignments,
            completions,
            busy_workers,
        }
    }

    /// Step until the backlog is drained, the run stalls, or the tick limit is hit.
    pub fn run(mut self) -> SimulationResult {
        let outcome = loop {
            if self.is_finished() {
                break RunOutcome::Completed;
            }
            if self.max_ticks.is_some_and(|limit| self.tick >= limit) {
                log_changes!(self.verbosity, "Tick limit reached at tick {}", self.tick);
                break RunOutcome::TickLimitReached;
            }
            self.step();
            if self.is_stalled() && !self.is_finished() {
                log_changes!(
                    self.verbosity,
                    "Stalled at tick {}: {} tasks queued, none claimable",
                    self.tick,
                    self.queue.len()
                );
                break RunOutcome::Stalled;
            }
        };
        self.into_result(outcome)
    }

    /// Package the accumulated state into the run record.
    pub fn into_result(self, outcome: RunOutcome) -> SimulationResult {
        let mut interactions: Vec<(WorkerId, WorkerId)> = self.interactions.into_iter().collect();
        interactions.sort_unstable();

        SimulationResult {
            outcome,
            total_ticks: self.tick,
            completed_tasks: self.completed_count,
            projects: self.spans,
            context_switches: self.workers.context_switches(),
            trace: self.trace,
            metrics: self.metrics,
            interactions,
            tasks: self.index.into_tasks(),
            seed: self.seed,
        }
    }

    /// Under the ungated policy, each working worker drops its task with
    /// probability `switch_probability`; the task keeps its remaining work.
    fn abandon_tasks(&mut self, switch_probability: f64) {
        for worker in self.workers.iter_mut() {
            if !worker.is_working() || !self.rng.generate_bool(switch_probability) {
                continue;
            }
            if let Some((task, remaining)) = worker.release() {
                log_changes!(
                    self.verbosity,
                    "  Worker {} abandoned task {} ({:.2} remaining)",
                    worker.id,
                    task,
                    remaining
                );
                self.queue.requeue(task, remaining);
            }
        }
    }

    fn assign_idle_workers(&mut self, tick: Tick) -> u32 {
        let mut assignments = 0;

        for worker_id in 0..self.workers.len() as WorkerId {
            let worker = self.workers.get(worker_id);
            if worker.is_working() {
                continue;
            }

            let eligible = self.eligible_positions(worker.skill, tick);
            if eligible.is_empty() {
                log_checks!(
                    self.verbosity,
                    "  Worker {} (skill {}) idle: nothing eligible",
                    worker_id,
                    worker.skill
                );
                continue;
            }
            log_checks!(
                self.verbosity,
                "  Worker {} (skill {}): {} eligible tasks",
                worker_id,
                worker.skill,
                eligible.len()
            );

            let position = eligible[self.rng.generate_usize_in_range(0..eligible.len())];
            let entry = self.queue.claim(position);
            let task = self.index.get(entry.id);
            debug_assert!(!task.completed, "claimed completed task {}", task.id);
            let remaining = entry.remaining.unwrap_or(task.duration as f64);
            let project_id = task.project_id;

            let switched = self.workers.get_mut(worker_id).assign(entry.id, remaining);
            self.spans[project_id as usize].start_tick.get_or_insert(tick);
            assignments += 1;

            log_changes!(
                self.verbosity,
                "Tick {}: worker {} claimed task {} (project {}, {:.2} work){}",
                tick,
                worker_id,
                entry.id,
                project_id,
                remaining,
                if switched { " [switch]" } else { "" }
            );
        }

        assignments
    }

    /// Queue positions a worker with `skill` may claim at `tick`.
    fn eligible_positions(&self, skill: SkillId, tick: Tick) -> Vec<usize> {
        self.queue
            .iter()
            .enumerate()
            .filter(|(_, entry)| {
                let task = self.index.get(entry.id);
                if tick < task.start_offset {
                    return false;
                }
                match self.policy {
                    AssignmentPolicy::Gated => {
                        task.skill == skill && self.index.is_ready(entry.id)
                    }
                    AssignmentPolicy::Ungated { .. } => true,
                }
            })
            .map(|(position, _)| position)
            .collect()
    }

    fn complete_task(&mut self, worker_id: WorkerId, task_id: TaskId, tick: Tick) {
        self.index.mark_complete(task_id);
        self.completed_count += 1;

        let task = self.index.get(task_id);
        let project = task.project_id as usize;
        log_changes!(
            self.verbosity,
            "Tick {}: worker {} completed task {} (project {})",
            tick,
            worker_id,
            task_id,
            project
        );

        if let Some((min, max)) = self.review_durations {
            if !task.is_review {
                let review = Task {
                    is_review: true,
                    start_offset: task.start_offset,
                    ..Task::new(
                        0,
                        task.project_id,
                        self.rng.generate_u32_in_range(min, max),
                        task.skill,
                        Vec::new(),
                    )
                };
                let review_id = self.index.push(review);
                self.queue.push(review_id);
                self.outstanding[project] += 1;
                log_changes!(
                    self.verbosity,
                    "  Review task {} queued for task {}",
                    review_id,
                    task_id
                );
            }
        }

        self.outstanding[project] -= 1;
        if self.outstanding[project] == 0 {
            self.spans[project].end_tick = Some(tick);
            log_changes!(self.verbosity, "Tick {}: project {} finished", tick, project);
        }
    }
}
