//! Discrete-time simulation of a worker pool completing interdependent tasks
//! across concurrently running projects.
//!
//! The engine produces one [`SimulationResult`] per run: completion ticks per
//! project, context switches per worker, a per-tick metrics series and the full
//! activity trace. Plotting and cross-run statistics live in the Python layer
//! that consumes these records.

// Allow clippy warning triggered by PyO3 macro expansion
#![allow(clippy::useless_conversion)]

use pyo3::prelude::*;

mod config;
pub mod driver;
pub mod engine;
pub mod generator;
pub mod graph;
pub mod logging;
mod models;
pub mod random;

pub use config::{AssignmentPolicy, ConfigError, SimulationConfig};
pub use driver::{run_simulation, run_simulation_with_tasks, run_sweep};
pub use engine::{SchedulingEngine, SimulationError, TickSummary};
pub use generator::{generate_workload, Workload};
pub use graph::{topological_order, DependencyIndex, GraphError};
pub use models::{
    ProjectId, ProjectSpan, RunOutcome, SimulationResult, SkillId, Task, TaskId, Tick,
    TickMetrics, TraceEntry, WorkerId,
};
pub use random::{rng_from_seed, Random};

/// Run one simulation on a generated workload.
///
/// # Raises
/// * ValueError if the configuration is invalid
#[pyfunction]
#[pyo3(name = "run_simulation")]
fn py_run_simulation(config: SimulationConfig) -> PyResult<SimulationResult> {
    run_simulation(&config).map_err(|e| pyo3::exceptions::PyValueError::new_err(e.to_string()))
}

/// Run one simulation on an explicit task list.
///
/// # Raises
/// * ValueError if the configuration or the task graph is invalid
#[pyfunction]
#[pyo3(name = "run_simulation_with_tasks")]
fn py_run_simulation_with_tasks(
    config: SimulationConfig,
    tasks: Vec<Task>,
) -> PyResult<SimulationResult> {
    run_simulation_with_tasks(&config, tasks)
        .map_err(|e| pyo3::exceptions::PyValueError::new_err(e.to_string()))
}

/// Run `runs_per_count` independent simulations for each project count.
///
/// Returns one record per run, ordered by project count then repetition.
///
/// # Raises
/// * ValueError if the configuration is invalid
#[pyfunction]
#[pyo3(name = "run_sweep", signature = (config, project_counts, runs_per_count=1))]
fn py_run_sweep(
    py: Python<'_>,
    config: SimulationConfig,
    project_counts: Vec<u32>,
    runs_per_count: u32,
) -> PyResult<Vec<SimulationResult>> {
    py.allow_threads(|| run_sweep(&config, &project_counts, runs_per_count))
        .map_err(|e| pyo3::exceptions::PyValueError::new_err(e.to_string()))
}

/// The multitask.rust Python module.
#[pymodule]
fn rust(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Config
    m.add_class::<SimulationConfig>()?;

    // Data types
    m.add_class::<Task>()?;
    m.add_class::<RunOutcome>()?;
    m.add_class::<ProjectSpan>()?;
    m.add_class::<TraceEntry>()?;
    m.add_class::<TickMetrics>()?;
    m.add_class::<SimulationResult>()?;

    // Drivers
    m.add_function(wrap_pyfunction!(py_run_simulation, m)?)?;
    m.add_function(wrap_pyfunction!(py_run_simulation_with_tasks, m)?)?;
    m.add_function(wrap_pyfunction!(py_run_sweep, m)?)?;

    Ok(())
}
