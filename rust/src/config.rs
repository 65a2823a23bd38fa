//! Configuration types for the simulation.

use pyo3::prelude::*;
use thiserror::Error;

/// Errors raised while validating a [`SimulationConfig`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Worker count must be positive")]
    NoWorkers,
    #[error("Minimum tasks per project must be at least 1, got {0}")]
    MinTasksTooSmall(u32),
    #[error("Maximum tasks per project ({max}) is below the minimum ({min})")]
    TaskRangeInverted { min: u32, max: u32 },
    #[error("Maximum task duration must be at least 1, got {0}")]
    MaxDurationTooSmall(u32),
    #[error("Skill set must not be empty")]
    NoSkills,
    #[error("Overhead multiplier must be a non-negative number, got {0}")]
    InvalidOverhead(f64),
    #[error("Stagger offset range is inverted: {min}..={max}")]
    StaggerRangeInverted { min: u64, max: u64 },
    #[error("Review duration range is invalid: {min}..={max}")]
    InvalidReviewRange { min: u32, max: u32 },
    #[error("Unknown assignment policy: {0}")]
    UnknownPolicy(String),
    #[error("Switch probability must be within [0, 1], got {0}")]
    InvalidSwitchProbability(f64),
    #[error("Stall ceiling must be at least 1 tick")]
    ZeroStallCeiling,
    #[error("Tick limit must be at least 1 tick")]
    ZeroTickLimit,
}

/// How idle workers pick their next task.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AssignmentPolicy {
    /// Skill and dependency gated, no preemption.
    Gated,
    /// No skill or dependency gates; working workers drop their task with
    /// `switch_probability` at the start of every tick.
    Ungated { switch_probability: f64 },
}

/// Parameters for one simulation run.
#[pyclass]
#[derive(Clone, Debug)]
pub struct SimulationConfig {
    /// Size of the worker pool
    #[pyo3(get, set)]
    pub num_workers: u32,
    /// Number of concurrently running projects
    #[pyo3(get, set)]
    pub num_projects: u32,
    #[pyo3(get, set)]
    pub min_tasks_per_project: u32,
    #[pyo3(get, set)]
    pub max_tasks_per_project: u32,
    /// Durations are sampled from 1..=max_task_duration
    #[pyo3(get, set)]
    pub max_task_duration: u32,
    /// Skill names; worker `i` holds skill `i % skills.len()`
    #[pyo3(get, set)]
    pub skills: Vec<String>,
    /// Overhead added per concurrently active project
    #[pyo3(get, set)]
    pub overhead_multiplier: f64,
    #[pyo3(get, set)]
    pub stagger_enabled: bool,
    #[pyo3(get, set)]
    pub stagger_min_offset: u64,
    #[pyo3(get, set)]
    pub stagger_max_offset: u64,
    /// Spawn a review task whenever a regular task finishes
    #[pyo3(get, set)]
    pub generates_review_tasks: bool,
    #[pyo3(get, set)]
    pub review_min_duration: u32,
    #[pyo3(get, set)]
    pub review_max_duration: u32,
    /// "gated" or "ungated"
    #[pyo3(get, set)]
    pub assignment_policy: String,
    /// Per-tick chance of abandoning the current task (ungated policy only)
    #[pyo3(get, set)]
    pub switch_probability: f64,
    /// Consecutive non-progressing ticks before a run is declared stalled
    #[pyo3(get, set)]
    pub stall_ticks: u64,
    /// Hard ceiling on the number of ticks (None = unlimited)
    #[pyo3(get, set)]
    pub max_ticks: Option<u64>,
    /// Seed for the random source (None = non-reproducible)
    #[pyo3(get, set)]
    pub seed: Option<u64>,
    /// Verbosity level: 0=silent, 1=changes, 2=checks, 3=debug.
    #[pyo3(get, set)]
    pub verbosity: u8,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            num_workers: 5,
            num_projects: 1,
            min_tasks_per_project: 5,
            max_tasks_per_project: 20,
            max_task_duration: 10,
            skills: vec![
                "design".to_string(),
                "development".to_string(),
                "testing".to_string(),
            ],
            overhead_multiplier: 0.1,
            stagger_enabled: false,
            stagger_min_offset: 0,
            stagger_max_offset: 10,
            generates_review_tasks: false,
            review_min_duration: 1,
            review_max_duration: 3,
            assignment_policy: "gated".to_string(),
            switch_probability: 1.0 / 6.0,
            stall_ticks: 100,
            max_ticks: None,
            seed: None,
            verbosity: 0,
        }
    }
}

impl SimulationConfig {
    /// Check every parameter, failing on the first invalid one.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.min_tasks_per_project < 1 {
            return Err(ConfigError::MinTasksTooSmall(self.min_tasks_per_project));
        }
        if self.max_tasks_per_project < self.min_tasks_per_project {
            return Err(ConfigError::TaskRangeInverted {
                min: self.min_tasks_per_project,
                max: self.max_tasks_per_project,
            });
        }
        if self.max_task_duration < 1 {
            return Err(ConfigError::MaxDurationTooSmall(self.max_task_duration));
        }
        if self.skills.is_empty() {
            return Err(ConfigError::NoSkills);
        }
        if !self.overhead_multiplier.is_finite() || self.overhead_multiplier < 0.0 {
            return Err(ConfigError::InvalidOverhead(self.overhead_multiplier));
        }
        if self.stagger_enabled && self.stagger_max_offset < self.stagger_min_offset {
            return Err(ConfigError::StaggerRangeInverted {
                min: self.stagger_min_offset,
                max: self.stagger_max_offset,
            });
        }
        if self.generates_review_tasks
            && (self.review_min_duration < 1 || self.review_max_duration < self.review_min_duration)
        {
            return Err(ConfigError::InvalidReviewRange {
                min: self.review_min_duration,
                max: self.review_max_duration,
            });
        }
        if self.stall_ticks == 0 {
            return Err(ConfigError::ZeroStallCeiling);
        }
        if self.max_ticks == Some(0) {
            return Err(ConfigError::ZeroTickLimit);
        }
        self.policy().map(|_| ())
    }

    /// Parse the configured assignment policy.
    pub fn policy(&self) -> Result<AssignmentPolicy, ConfigError> {
        match self.assignment_policy.as_str() {
            "gated" => Ok(AssignmentPolicy::Gated),
            "ungated" => {
                let p = self.switch_probability;
                if !(0.0..=1.0).contains(&p) {
                    return Err(ConfigError::InvalidSwitchProbability(p));
                }
                Ok(AssignmentPolicy::Ungated {
                    switch_probability: p,
                })
            }
            other => Err(ConfigError::UnknownPolicy(other.to_string())),
        }
    }

    /// Skill held by a worker.
    pub fn worker_skill(&self, worker_id: u32) -> u32 {
        worker_id % self.skills.len().max(1) as u32
    }
}

#[pymethods]
impl SimulationConfig {
    #[new]
    #[pyo3(signature = (
        num_workers=None,
        num_projects=None,
        min_tasks_per_project=None,
        max_tasks_per_project=None,
        max_task_duration=None,
        skills=None,
        overhead_multiplier=None,
        stagger_enabled=None,
        stagger_min_offset=None,
        stagger_max_offset=None,
        generates_review_tasks=None,
        review_min_duration=None,
        review_max_duration=None,
        assignment_policy=None,
        switch_probability=None,
        stall_ticks=None,
        max_ticks=None,
        seed=None,
        verbosity=None
    ))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        num_workers: Option<u32>,
        num_projects: Option<u32>,
        min_tasks_per_project: Option<u32>,
        max_tasks_per_project: Option<u32>,
        max_task_duration: Option<u32>,
        skills: Option<Vec<String>>,
        overhead_multiplier: Option<f64>,
        stagger_enabled: Option<bool>,
        stagger_min_offset: Option<u64>,
        stagger_max_offset: Option<u64>,
        generates_review_tasks: Option<bool>,
        review_min_duration: Option<u32>,
        review_max_duration: Option<u32>,
        assignment_policy: Option<String>,
        switch_probability: Option<f64>,
        stall_ticks: Option<u64>,
        max_ticks: Option<u64>,
        seed: Option<u64>,
        verbosity: Option<u8>,
    ) -> Self {
        let defaults = Self::default();
        Self {
            num_workers: num_workers.unwrap_or(defaults.num_workers),
            num_projects: num_projects.unwrap_or(defaults.num_projects),
            min_tasks_per_project: min_tasks_per_project
                .unwrap_or(defaults.min_tasks_per_project),
            max_tasks_per_project: max_tasks_per_project
                .unwrap_or(defaults.max_tasks_per_project),
            max_task_duration: max_task_duration.unwrap_or(defaults.max_task_duration),
            skills: skills.unwrap_or(defaults.skills),
            overhead_multiplier: overhead_multiplier.unwrap_or(defaults.overhead_multiplier),
            stagger_enabled: stagger_enabled.unwrap_or(defaults.stagger_enabled),
            stagger_min_offset: stagger_min_offset.unwrap_or(defaults.stagger_min_offset),
            stagger_max_offset: stagger_max_offset.unwrap_or(defaults.stagger_max_offset),
            generates_review_tasks: generates_review_tasks
                .unwrap_or(defaults.generates_review_tasks),
            review_min_duration: review_min_duration.unwrap_or(defaults.review_min_duration),
            review_max_duration: review_max_duration.unwrap_or(defaults.review_max_duration),
            assignment_policy: assignment_policy.unwrap_or(defaults.assignment_policy),
            switch_probability: switch_probability.unwrap_or(defaults.switch_probability),
            stall_ticks: stall_ticks.unwrap_or(defaults.stall_ticks),
            max_ticks,
            seed,
            verbosity: verbosity.unwrap_or(defaults.verbosity),
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "SimulationConfig(num_workers={}, num_projects={}, overhead_multiplier={}, policy={:?}, seed={:?})",
            self.num_workers,
            self.num_projects,
            self.overhead_multiplier,
            self.assignment_policy,
            self.seed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SimulationConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.policy(), Ok(AssignmentPolicy::Gated));
    }

    #[test]
    fn test_zero_projects_is_valid() {
        let config = SimulationConfig {
            num_projects: 0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_inverted_task_range() {
        let config = SimulationConfig {
            min_tasks_per_project: 8,
            max_tasks_per_project: 3,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::TaskRangeInverted { min: 8, max: 3 })
        );
    }

    #[test]
    fn test_rejects_bad_parameters() {
        let cases = [
            SimulationConfig {
                num_workers: 0,
                ..Default::default()
            },
            SimulationConfig {
                min_tasks_per_project: 0,
                ..Default::default()
            },
            SimulationConfig {
                max_task_duration: 0,
                ..Default::default()
            },
            SimulationConfig {
                skills: vec![],
                ..Default::default()
            },
            SimulationConfig {
                overhead_multiplier: -0.1,
                ..Default::default()
            },
            SimulationConfig {
                overhead_multiplier: f64::NAN,
                ..Default::default()
            },
            SimulationConfig {
                stall_ticks: 0,
                ..Default::default()
            },
            SimulationConfig {
                max_ticks: Some(0),
                ..Default::default()
            },
        ];
        for config in cases {
            assert!(config.validate().is_err(), "accepted {:?}", config);
        }
    }

    #[test]
    fn test_stagger_and_review_ranges_only_checked_when_enabled() {
        let config = SimulationConfig {
            stagger_min_offset: 9,
            stagger_max_offset: 2,
            review_min_duration: 0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        let staggered = SimulationConfig {
            stagger_enabled: true,
            ..config.clone()
        };
        assert_eq!(
            staggered.validate(),
            Err(ConfigError::StaggerRangeInverted { min: 9, max: 2 })
        );

        let reviewed = SimulationConfig {
            generates_review_tasks: true,
            ..config
        };
        assert_eq!(
            reviewed.validate(),
            Err(ConfigError::InvalidReviewRange { min: 0, max: 3 })
        );
    }

    #[test]
    fn test_policy_parsing() {
        let ungated = SimulationConfig {
            assignment_policy: "ungated".to_string(),
            switch_probability: 0.25,
            ..Default::default()
        };
        assert_eq!(
            ungated.policy(),
            Ok(AssignmentPolicy::Ungated {
                switch_probability: 0.25
            })
        );

        let bad_probability = SimulationConfig {
            switch_probability: 1.5,
            ..ungated
        };
        assert_eq!(
            bad_probability.validate(),
            Err(ConfigError::InvalidSwitchProbability(1.5))
        );

        let unknown = SimulationConfig {
            assignment_policy: "shortest_first".to_string(),
            ..Default::default()
        };
        assert_eq!(
            unknown.validate(),
            Err(ConfigError::UnknownPolicy("shortest_first".to_string()))
        );
    }

    #[test]
    fn test_worker_skill_wraps_around_skill_set() {
        let config = SimulationConfig::default();
        assert_eq!(config.worker_skill(0), 0);
        assert_eq!(config.worker_skill(2), 2);
        assert_eq!(config.worker_skill(4), 1);
    }
}
