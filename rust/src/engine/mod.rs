//! Discrete-time scheduling engine.
//!
//! One [`SchedulingEngine`] owns the state of one run: the task arena, the queue
//! of unclaimed tasks and the worker pool. Runs share nothing, so independent
//! runs can be driven from separate threads.

mod core;
mod queue;
mod worker;

pub use core::{SchedulingEngine, SimulationError, TickSummary};
pub use queue::{QueuedTask, TaskQueue};
pub use worker::{Worker, WorkerPool, WorkerState, COMPLETION_EPSILON};
