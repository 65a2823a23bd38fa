//! Random workload generation: projects, tasks and their dependency graphs.

use crate::config::SimulationConfig;
use crate::models::{ProjectId, Task, TaskId, Tick};
use crate::random::Random;

/// A generated backlog.
#[derive(Clone, Debug, Default)]
pub struct Workload {
    /// Tasks in generation order; `tasks[i].id == i`
    pub tasks: Vec<Task>,
    /// Start offset per project (all zero without staggering)
    pub project_offsets: Vec<Tick>,
}

/// Generate tasks for `config.num_projects` projects.
///
/// Per project the start offset is drawn first (only when staggering is
/// enabled), then the task count. Each task then draws its duration, its skill,
/// a dependency count `k` in `0..=n` where `n` is the number of tasks already
/// generated for the project, and `k` distinct dependencies among those `n`.
/// Dependencies therefore always point at smaller ids of the same project, so the
/// graph is acyclic by construction.
///
/// The config must already be validated.
pub fn generate_workload(config: &SimulationConfig, rng: &mut dyn Random) -> Workload {
    let mut workload = Workload::default();
    let skill_count = config.skills.len();

    for project_id in 0..config.num_projects {
        let offset = if config.stagger_enabled {
            rng.generate_u64_in_range(config.stagger_min_offset, config.stagger_max_offset)
        } else {
            0
        };
        workload.project_offsets.push(offset);

        let task_count =
            rng.generate_u32_in_range(config.min_tasks_per_project, config.max_tasks_per_project);
        let mut project_tasks: Vec<TaskId> = Vec::with_capacity(task_count as usize);

        for _ in 0..task_count {
            let id = workload.tasks.len() as TaskId;
            let duration = rng.generate_u32_in_range(1, config.max_task_duration);
            let skill = rng.generate_usize_in_range(0..skill_count) as u32;
            let dependency_count = rng.generate_usize_in_range(0..project_tasks.len() + 1);
            let mut dependencies: Vec<TaskId> = rng
                .sample_indices(project_tasks.len(), dependency_count)
                .into_iter()
                .map(|i| project_tasks[i])
                .collect();
            dependencies.sort_unstable();

            workload.tasks.push(
                Task::new(id, project_id as ProjectId, duration, skill, dependencies)
                    .with_start_offset(offset),
            );
            project_tasks.push(id);
        }
    }

    workload
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    use super::*;
    use crate::graph::topological_order;
    use crate::random::tests::TestRandom;

    fn config(num_projects: u32) -> SimulationConfig {
        SimulationConfig {
            num_projects,
            ..Default::default()
        }
    }

    #[test]
    fn test_zero_projects_yields_empty_workload() {
        let mut rng = SmallRng::seed_from_u64(1);
        let workload = generate_workload(&config(0), &mut rng);
        assert!(workload.tasks.is_empty());
        assert!(workload.project_offsets.is_empty());
    }

    #[test]
    fn test_generated_tasks_respect_ranges() {
        let config = config(4);
        let mut rng = SmallRng::seed_from_u64(11);
        let workload = generate_workload(&config, &mut rng);

        for project_id in 0..4 {
            let count = workload
                .tasks
                .iter()
                .filter(|t| t.project_id == project_id)
                .count() as u32;
            assert!((config.min_tasks_per_project..=config.max_tasks_per_project).contains(&count));
        }
        for (i, task) in workload.tasks.iter().enumerate() {
            assert_eq!(task.id as usize, i);
            assert!((1..=config.max_task_duration).contains(&task.duration));
            assert!((task.skill as usize) < config.skills.len());
            assert_eq!(task.start_offset, 0);
            assert!(!task.completed);
            for &dep in &task.dependencies {
                assert!(dep < task.id);
                assert_eq!(workload.tasks[dep as usize].project_id, task.project_id);
            }
        }
    }

    #[test]
    fn test_generated_graph_is_acyclic() {
        for seed in 0..20 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let workload = generate_workload(&config(3), &mut rng);
            let order = topological_order(&workload.tasks).unwrap();
            assert_eq!(order.len(), workload.tasks.len());
        }
    }

    #[test]
    fn test_same_seed_same_workload() {
        let config = config(3);
        let a = generate_workload(&config, &mut SmallRng::seed_from_u64(5));
        let b = generate_workload(&config, &mut SmallRng::seed_from_u64(5));
        assert_eq!(a.tasks, b.tasks);
    }

    #[test]
    fn test_stagger_offsets_apply_to_whole_project() {
        let config = SimulationConfig {
            num_projects: 5,
            stagger_enabled: true,
            stagger_min_offset: 3,
            stagger_max_offset: 12,
            ..Default::default()
        };
        let mut rng = SmallRng::seed_from_u64(9);
        let workload = generate_workload(&config, &mut rng);

        assert_eq!(workload.project_offsets.len(), 5);
        for task in &workload.tasks {
            let offset = workload.project_offsets[task.project_id as usize];
            assert!((3..=12).contains(&offset));
            assert_eq!(task.start_offset, offset);
        }
    }

    #[test]
    fn test_scripted_draws() {
        let config = SimulationConfig {
            num_projects: 1,
            min_tasks_per_project: 1,
            max_tasks_per_project: 3,
            ..Default::default()
        };
        // Task count 2; task 0: duration 4, skill 1, k=0;
        // task 1: duration 7, skill 0, k=1, picks index 0.
        let mut rng = TestRandom {
            integers: VecDeque::from(vec![2, 4, 7]),
            usizes: VecDeque::from(vec![1, 0, 0, 1, 0]),
            ..Default::default()
        };
        let workload = generate_workload(&config, &mut rng);

        assert_eq!(
            workload.tasks,
            vec![Task::new(0, 0, 4, 1, vec![]), Task::new(1, 0, 7, 0, vec![0])]
        );
    }
}
