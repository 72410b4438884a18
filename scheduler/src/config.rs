//! The run configuration, as a typed Rust struct.
//!
//! Every tunable the engine exposes has one field (or one enum variant
//! set) here; `cli::Cli` layers `clap`/environment parsing on top of this,
//! splitting configuration defaults from flag parsing.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChoiceOrchestration {
    None,
    Random,
    QLearning,
    EpsilonGreedy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskOrchestration {
    DepthFirst,
    Random,
    CoverageAStar,
    Learn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymmetryMode {
    None,
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateCachingMode {
    None,
    Fast,
    Exact,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub choice_orchestration: ChoiceOrchestration,
    pub task_orchestration: TaskOrchestration,
    pub symmetry_mode: SymmetryMode,
    pub state_caching_mode: StateCachingMode,
    pub is_symbolic: bool,
    pub use_backtrack: bool,
    pub max_step_bound: usize,
    pub fail_on_max_step_bound: bool,
    pub max_executions: usize,
    pub max_backtrack_tasks_per_execution: usize,
    pub verbosity: u8,

    /// Ambient tunables needed to make `ChoiceOrchestrator`/coverage
    /// concretely runnable and deterministic.
    pub max_coverage_goal: f64,
    pub random_seed: u64,
    pub epsilon_greedy_epsilon: f64,
    pub progress_interval_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            choice_orchestration: ChoiceOrchestration::None,
            task_orchestration: TaskOrchestration::DepthFirst,
            symmetry_mode: SymmetryMode::None,
            state_caching_mode: StateCachingMode::None,
            is_symbolic: false,
            use_backtrack: true,
            max_step_bound: 10_000,
            fail_on_max_step_bound: false,
            max_executions: 0,
            max_backtrack_tasks_per_execution: 1000,
            verbosity: 1,
            max_coverage_goal: 1.0,
            random_seed: 0,
            epsilon_greedy_epsilon: 0.1,
            progress_interval_ms: 1000,
        }
    }
}

impl SchedulerConfig {
    /// `SCHED_*` environment overlay, falling back to `Default` for
    /// anything unset or unparsable.
    pub fn from_env() -> Self {
        let mut cfg = SchedulerConfig::default();
        if let Ok(v) = std::env::var("SCHED_MAX_STEP_BOUND") {
            if let Ok(n) = v.parse() {
                cfg.max_step_bound = n;
            }
        }
        if let Ok(v) = std::env::var("SCHED_MAX_EXECUTIONS") {
            if let Ok(n) = v.parse() {
                cfg.max_executions = n;
            }
        }
        if let Ok(v) = std::env::var("SCHED_VERBOSITY") {
            if let Ok(n) = v.parse() {
                cfg.verbosity = n;
            }
        }
        if let Ok(v) = std::env::var("SCHED_RANDOM_SEED") {
            if let Ok(n) = v.parse() {
                cfg.random_seed = n;
            }
        }
        cfg
    }
}
