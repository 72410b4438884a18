use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use scheduler::{ChoiceOrchestration, SchedulerConfig, StateCachingMode, SymmetryMode, TaskOrchestration};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ChoiceOrchestrationArg {
    None,
    Random,
    QLearning,
    EpsilonGreedy,
}

impl From<ChoiceOrchestrationArg> for ChoiceOrchestration {
    fn from(value: ChoiceOrchestrationArg) -> Self {
        match value {
            ChoiceOrchestrationArg::None => ChoiceOrchestration::None,
            ChoiceOrchestrationArg::Random => ChoiceOrchestration::Random,
            ChoiceOrchestrationArg::QLearning => ChoiceOrchestration::QLearning,
            ChoiceOrchestrationArg::EpsilonGreedy => ChoiceOrchestration::EpsilonGreedy,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TaskOrchestrationArg {
    DepthFirst,
    Random,
    CoverageAStar,
    Learn,
}

impl From<TaskOrchestrationArg> for TaskOrchestration {
    fn from(value: TaskOrchestrationArg) -> Self {
        match value {
            TaskOrchestrationArg::DepthFirst => TaskOrchestration::DepthFirst,
            TaskOrchestrationArg::Random => TaskOrchestration::Random,
            TaskOrchestrationArg::CoverageAStar => TaskOrchestration::CoverageAStar,
            TaskOrchestrationArg::Learn => TaskOrchestration::Learn,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StateCachingArg {
    None,
    Fast,
    Exact,
}

impl From<StateCachingArg> for StateCachingMode {
    fn from(value: StateCachingArg) -> Self {
        match value {
            StateCachingArg::None => StateCachingMode::None,
            StateCachingArg::Fast => StateCachingMode::Fast,
            StateCachingArg::Exact => StateCachingMode::Exact,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SymmetryArg {
    None,
    Full,
}

impl From<SymmetryArg> for SymmetryMode {
    fn from(value: SymmetryArg) -> Self {
        match value {
            SymmetryArg::None => SymmetryMode::None,
            SymmetryArg::Full => SymmetryMode::Full,
        }
    }
}

/// `pexplore` — drives the search loop over an in-memory reference machine
/// environment. Flags mirror the Configuration table: every
/// `SchedulerConfig` field has a corresponding argument here.
#[derive(Debug, Parser)]
#[clap(name = "pexplore", version, about = "State-space exploration scheduler")]
pub struct Cli {
    #[clap(long, value_enum, default_value = "none", env = "SCHED_CHOICE_ORCHESTRATION")]
    pub choice_orchestration: ChoiceOrchestrationArg,

    #[clap(long, value_enum, default_value = "depth-first", env = "SCHED_TASK_ORCHESTRATION")]
    pub task_orchestration: TaskOrchestrationArg,

    #[clap(long, value_enum, default_value = "none", env = "SCHED_SYMMETRY_MODE")]
    pub symmetry_mode: SymmetryArg,

    #[clap(long, value_enum, default_value = "none", env = "SCHED_STATE_CACHING_MODE")]
    pub state_caching_mode: StateCachingArg,

    #[clap(long)]
    pub is_symbolic: bool,

    #[clap(long, default_value_t = true)]
    pub use_backtrack: bool,

    #[clap(long, default_value_t = 10_000, env = "SCHED_MAX_STEP_BOUND")]
    pub max_step_bound: usize,

    #[clap(long)]
    pub fail_on_max_step_bound: bool,

    #[clap(long, default_value_t = 0, env = "SCHED_MAX_EXECUTIONS")]
    pub max_executions: usize,

    #[clap(long, default_value_t = 1000)]
    pub max_backtrack_tasks_per_execution: usize,

    #[clap(long, short = 'v', default_value_t = 1, env = "SCHED_VERBOSITY")]
    pub verbosity: u8,

    /// Emit structured JSON log lines instead of the default human-readable format.
    #[clap(long, env = "SCHED_JSON_LOGS")]
    pub json_logs: bool,

    #[clap(long, default_value_t = 0, env = "SCHED_RANDOM_SEED")]
    pub random_seed: u64,

    #[clap(long, default_value_t = 0.1)]
    pub epsilon_greedy_epsilon: f64,

    /// Number of reference machines to spawn in demo mode.
    #[clap(long, default_value_t = 3)]
    pub demo_machines: usize,

    /// Write a checkpoint here after the run completes.
    #[clap(long)]
    pub checkpoint_out: Option<PathBuf>,

    /// Resume from a checkpoint written by a prior run instead of starting fresh.
    #[clap(long)]
    pub resume_from: Option<PathBuf>,
}

impl Cli {
    pub fn to_scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            choice_orchestration: self.choice_orchestration.into(),
            task_orchestration: self.task_orchestration.into(),
            symmetry_mode: self.symmetry_mode.into(),
            state_caching_mode: self.state_caching_mode.into(),
            is_symbolic: self.is_symbolic,
            use_backtrack: self.use_backtrack,
            max_step_bound: self.max_step_bound,
            fail_on_max_step_bound: self.fail_on_max_step_bound,
            max_executions: self.max_executions,
            max_backtrack_tasks_per_execution: self.max_backtrack_tasks_per_execution,
            verbosity: self.verbosity,
            random_seed: self.random_seed,
            epsilon_greedy_epsilon: self.epsilon_greedy_epsilon,
            ..SchedulerConfig::default()
        }
    }
}
