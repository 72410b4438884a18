//! `SearchLoop` — the outer `do_search`/`resume_search` iteration, and
//! iteration-end bookkeeping (`post_iteration_cleanup`).

use std::time::Instant;

use machines::MachineEnvironment;
use runtime::RuntimeContext;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{SchedulerConfig, TaskOrchestration};
use crate::coverage::CoverageStats;
use crate::error::EngineError;
use crate::liveness::{LivenessMonitor, NoLivenessMonitor};
use crate::orchestrator::ChoiceOrchestrator;
use crate::schedule::Schedule;
use crate::state_cache::StateCache;
use crate::step::step;
use crate::symmetry::{StructuralSymmetryReducer, SymmetryReducer};
use crate::task_manager::TaskManager;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct IterationCounters {
    pub iter: u64,
    pub start_iter: u64,
    pub depth: usize,
    pub choice_depth: usize,
    pub backtrack_depth: usize,
    pub done: bool,
    pub is_done_iterating: bool,
    pub sticky_step: bool,
}

pub struct SearchLoop<E: MachineEnvironment> {
    pub env: E,
    pub schedule: Schedule,
    pub ctx: RuntimeContext,
    pub config: SchedulerConfig,
    pub orchestrator: ChoiceOrchestrator,
    pub coverage: CoverageStats,
    pub state_cache: StateCache,
    pub tasks: TaskManager,
    pub counters: IterationCounters,
    pub result: String,
    pub liveness: Box<dyn LivenessMonitor>,
    pub symmetry: Box<dyn SymmetryReducer>,
    current_task_id: u64,
    last_progress: Instant,
}

impl<E: MachineEnvironment> SearchLoop<E> {
    pub fn new(env: E, config: SchedulerConfig) -> Self {
        let rng_seed = config.random_seed;
        let epsilon = config.epsilon_greedy_epsilon;
        let orchestrator = ChoiceOrchestrator::new(config.choice_orchestration, rng_seed, epsilon);
        let schedule = Schedule::new();
        let tasks = TaskManager::new(schedule.clone());
        SearchLoop {
            env,
            schedule,
            ctx: RuntimeContext::unbounded(),
            config,
            orchestrator,
            coverage: CoverageStats::new(),
            state_cache: StateCache::new(),
            tasks,
            counters: IterationCounters::default(),
            result: "incomplete".to_string(),
            liveness: Box::new(NoLivenessMonitor),
            symmetry: Box::new(StructuralSymmetryReducer),
            current_task_id: 0,
            last_progress: Instant::now(),
        }
    }

    /// Installs a fairness hook, replacing the no-op default.
    pub fn set_liveness_monitor(&mut self, monitor: Box<dyn LivenessMonitor>) {
        self.liveness = monitor;
    }

    /// Installs a symmetry reducer, replacing the structural-equality default.
    pub fn set_symmetry_reducer(&mut self, reducer: Box<dyn SymmetryReducer>) {
        self.symmetry = reducer;
    }

    /// Runs the outer search loop to completion from an empty schedule.
    pub fn do_search(&mut self) -> Result<(), EngineError> {
        self.result = "incomplete".to_string();
        self.counters.iter += 1;
        self.run_until_done()
    }

    /// Runs the outer search loop from a checkpointed state rather than an
    /// empty schedule. The checkpoint crate hands back a
    /// `Schedule`/`IterationCounters` pair; this just rebinds them and
    /// continues the loop.
    pub fn resume_search(&mut self, schedule: Schedule, counters: IterationCounters) -> Result<(), EngineError> {
        self.schedule = schedule;
        self.counters = counters;
        self.counters.start_iter = self.counters.iter;
        self.ctx.stats = runtime::SolverStats::new();
        if self.counters.done {
            self.coverage = CoverageStats::new();
        }
        self.run_until_done()
    }

    /// Shared loop body: steps the iteration, lets the fairness monitor judge
    /// it, then decides whether another iteration is owed. A liveness
    /// violation is treated exactly like a `PropertyViolation` raised mid-step.
    fn run_until_done(&mut self) -> Result<(), EngineError> {
        loop {
            self.perform_search()?;
            if let Err(detail) = self.liveness.check_liveness(false) {
                self.result = "bug found".to_string();
                return Err(EngineError::PropertyViolation { depth: self.counters.depth, detail });
            }
            self.summarize_iteration()?;
            self.maybe_report_progress();
            if self.counters.is_done_iterating {
                break;
            }
        }
        if let Err(detail) = self.liveness.check_liveness(true) {
            self.result = "bug found".to_string();
            return Err(EngineError::PropertyViolation { depth: self.counters.depth, detail });
        }
        Ok(())
    }

    /// One iteration: steps until `done` or the step bound is hit.
    fn perform_search(&mut self) -> Result<(), EngineError> {
        self.counters.done = false;
        loop {
            if self.counters.depth >= self.config.max_step_bound {
                if self.config.fail_on_max_step_bound {
                    return Err(EngineError::StepBoundExceeded {
                        depth: self.counters.depth,
                        bound: self.config.max_step_bound,
                    });
                }
                self.result = format!("correct up to step {}", self.counters.depth);
                self.counters.done = true;
                return Ok(());
            }

            let outcome = step(
                &mut self.env,
                &mut self.schedule,
                &mut self.ctx,
                &self.config,
                &mut self.orchestrator,
                &mut self.coverage,
                &mut self.state_cache,
                self.symmetry.as_mut(),
                &mut self.counters.depth,
                &mut self.counters.choice_depth,
                self.counters.backtrack_depth,
                self.counters.sticky_step,
            );
            let outcome = match outcome {
                Ok(outcome) => outcome,
                Err(EngineError::PropertyViolation { depth, detail }) => {
                    self.counters.done = true;
                    self.result = "bug found".to_string();
                    return Err(EngineError::PropertyViolation { depth, detail });
                }
                Err(other) => return Err(other),
            };
            self.counters.sticky_step = outcome.sticky_step;
            if outcome.done {
                self.counters.done = true;
                self.mark_fully_exhausted();
                return Ok(());
            }
        }
    }

    /// Promotes `"incomplete"` to `"correct for any depth"` once coverage
    /// reaches `max_coverage_goal` — never overwrites a result already set to
    /// something more specific (`"correct up to step N"`, `"bug found"`).
    fn mark_fully_exhausted(&mut self) {
        if self.result == "incomplete" && self.coverage.coverage() >= self.config.max_coverage_goal {
            self.result = "correct for any depth".to_string();
        }
    }

    /// Backtrack alternatives still owed a visit: every depth's deferred
    /// `Choice::backtrack` entries under depth-first orchestration, or the
    /// task manager's pending count otherwise.
    fn remaining_backtracks(&self) -> usize {
        if matches!(self.config.task_orchestration, TaskOrchestration::DepthFirst) {
            self.schedule
                .iter()
                .map(|c| c.backtrack.iter().filter(|b| !b.is_empty()).count())
                .sum()
        } else {
            self.tasks.num_pending_backtracks()
        }
    }

    fn maybe_report_progress(&mut self) {
        if self.config.verbosity == 0 {
            return;
        }
        let interval = std::time::Duration::from_millis(self.config.progress_interval_ms);
        if self.last_progress.elapsed() < interval {
            return;
        }
        self.last_progress = Instant::now();
        info!(
            iter = self.counters.iter,
            depth = self.counters.depth,
            elapsed_ms = self.ctx.time.elapsed().as_millis() as u64,
            remaining_backtracks = self.remaining_backtracks(),
            coverage = self.coverage.coverage(),
            "search progress",
        );
    }

    /// Runs once at the end of every iteration: checks the interrupt flag
    /// and execution cap, then either hands off to the task manager or
    /// walks the schedule for the next in-place backtrack.
    fn summarize_iteration(&mut self) -> Result<(), EngineError> {
        self.ctx.interrupt.check().map_err(|_| EngineError::Interrupted)?;

        if self.config.max_executions > 0
            && self.counters.iter.saturating_sub(self.counters.start_iter) >= self.config.max_executions as u64
        {
            self.counters.is_done_iterating = true;
            let remaining = self.remaining_backtracks();
            if remaining > 0 {
                self.result = format!("partially correct with {remaining} backtracks remaining");
            } else {
                self.mark_fully_exhausted();
            }
            return Ok(());
        }

        if !matches!(self.config.task_orchestration, TaskOrchestration::DepthFirst) {
            self.tasks.set_backtrack_tasks(
                self.current_task_id,
                &self.schedule,
                self.config.max_backtrack_tasks_per_execution,
            );
            let mut rng = TaskManager::new_rng(self.config.random_seed);
            match self.tasks.get_next_task(self.config.task_orchestration, &mut rng) {
                Some(task) => {
                    info!(task_id = task.id, "resuming from backtrack task");
                    self.current_task_id = task.id;
                    let snapshot = task.choices.get(task.choice_depth).and_then(|c| c.saved.clone());
                    self.schedule = task.choices;
                    self.counters.depth = task.depth;
                    self.counters.choice_depth = task.choice_depth;
                    self.counters.backtrack_depth = task.depth;
                    self.counters.iter += 1;
                    if let Some(snapshot) = snapshot {
                        self.restore_snapshot(&snapshot, task.depth)?;
                    }
                }
                None => {
                    self.counters.is_done_iterating = true;
                    self.mark_fully_exhausted();
                }
            }
            return Ok(());
        }

        self.post_iteration_cleanup()
    }

    /// Rebinds `env`/`ctx` to a `SchedulerStateSnapshot` taken at
    /// `scheduler_depth`, used by both the in-schedule backtrack path and
    /// task-manager-driven resumption.
    fn restore_snapshot(
        &mut self,
        snapshot: &crate::choice::SchedulerStateSnapshot,
        scheduler_depth: usize,
    ) -> Result<(), EngineError> {
        if let Some(ref sym) = snapshot.symmetry {
            debug!(classes = sym.len(), "restoring symmetry tracker");
        }
        for (&machine, state) in &snapshot.machine_states {
            self.env.set_local_state(machine, state.clone()).map_err(EngineError::from)?;
        }
        self.ctx.global.restore(snapshot.creation_counters.clone());
        if scheduler_depth == 0 {
            for id in self.env.current_machines() {
                self.env.reset(id).map_err(EngineError::from)?;
            }
        }
        Ok(())
    }

    /// Walks the schedule top-down looking for the first depth with a
    /// pending backtrack.
    fn post_iteration_cleanup(&mut self) -> Result<(), EngineError> {
        let top = self.schedule.size();
        for d in (0..top).rev() {
            let Some(choice) = self.schedule.get_mut(d) else { continue };
            choice.handled_universe = choice.handled_universe.or(&choice.repeat.universe());
            choice.repeat = crate::choice::Vs::empty();

            if choice.has_backtrack() {
                let saved = choice.saved.clone();
                let scheduler_depth = choice.scheduler_depth;
                let scheduler_choice_depth = choice.scheduler_choice_depth;
                self.counters.backtrack_depth = d;
                if let Some(snapshot) = saved {
                    self.restore_snapshot(&snapshot, scheduler_depth)?;
                    self.counters.depth = scheduler_depth;
                    self.counters.choice_depth = scheduler_choice_depth;
                }

                // Open question, decided: `repeat` is populated only here, for
                // every shallower depth, so a caller that replays the schedule
                // from choice depth 0 (rather than trusting the snapshot
                // above) gets the same chosen value back without re-invoking
                // its producer.
                let already_decided: Vec<crate::choice::Vs> =
                    (0..d).filter_map(|d2| self.schedule.get(d2).map(|c| c.chosen.clone())).collect();
                for (d2, chosen) in already_decided.into_iter().enumerate() {
                    if let Some(c) = self.schedule.get_mut(d2) {
                        c.repeat = chosen;
                    }
                }

                self.coverage.note_backtrack_consumed(self.counters.depth, d);
                self.counters.iter += 1;
                return Ok(());
            }

            self.schedule.truncate(d);
            self.coverage.reset_depth(self.counters.depth, d);
        }
        self.counters.is_done_iterating = true;
        self.mark_fully_exhausted();
        info!(iter = self.counters.iter, result = %self.result, "search space exhausted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use machines::InMemoryEnvironment;

    #[test]
    fn do_search_terminates_with_no_machines() {
        let env = InMemoryEnvironment::new();
        let mut loop_ = SearchLoop::new(env, SchedulerConfig::default());
        loop_.do_search().unwrap();
        assert!(loop_.counters.is_done_iterating);
        assert_eq!(loop_.result, "correct for any depth");
    }

    #[test]
    fn step_bound_without_fail_flag_records_partial_result() {
        let mut env = InMemoryEnvironment::new();
        let a = env.spawn(Vec::new());
        let b = env.spawn(Vec::new());
        for _ in 0..5 {
            env.enqueue(a, solver::Guard::true_(), machines::Message::new(b, "ping", Vec::new()));
        }
        let mut config = SchedulerConfig::default();
        config.max_step_bound = 1;
        config.fail_on_max_step_bound = false;
        let mut loop_ = SearchLoop::new(env, config);
        loop_.do_search().unwrap();
        assert!(loop_.result.starts_with("correct up to step"));
    }

    #[test]
    fn step_bound_with_fail_flag_returns_error() {
        let mut env = InMemoryEnvironment::new();
        let a = env.spawn(Vec::new());
        let b = env.spawn(Vec::new());
        for _ in 0..5 {
            env.enqueue(a, solver::Guard::true_(), machines::Message::new(b, "ping", Vec::new()));
        }
        let mut config = SchedulerConfig::default();
        config.max_step_bound = 1;
        config.fail_on_max_step_bound = true;
        let mut loop_ = SearchLoop::new(env, config);
        let result = loop_.do_search();
        assert!(matches!(result, Err(EngineError::StepBoundExceeded { .. })));
    }

    #[test]
    fn property_violation_sets_bug_found() {
        let mut env = InMemoryEnvironment::new();
        let a = env.spawn(Vec::new());
        env.enqueue(a, solver::Guard::true_(), machines::Message::new(a, "assert_fail", vec![machines::Value::Str("oops".into())]));
        let mut loop_ = SearchLoop::new(env, SchedulerConfig::default());
        let result = loop_.do_search();
        assert!(matches!(result, Err(EngineError::PropertyViolation { .. })));
        assert_eq!(loop_.result, "bug found");
    }

    struct AlwaysUnfair;
    impl LivenessMonitor for AlwaysUnfair {
        fn check_liveness(&mut self, _is_final: bool) -> Result<(), String> {
            Err("starvation detected".to_string())
        }
    }

    #[test]
    fn liveness_violation_sets_bug_found() {
        let env = InMemoryEnvironment::new();
        let mut loop_ = SearchLoop::new(env, SchedulerConfig::default());
        loop_.set_liveness_monitor(Box::new(AlwaysUnfair));
        let result = loop_.do_search();
        assert!(matches!(result, Err(EngineError::PropertyViolation { .. })));
        assert_eq!(loop_.result, "bug found");
    }

    #[test]
    fn max_executions_with_pending_backtracks_reports_partial_result() {
        let mut env = InMemoryEnvironment::new();
        let a = env.spawn(Vec::new());
        let b = env.spawn(Vec::new());
        let c = env.spawn(Vec::new());
        env.enqueue(a, solver::Guard::true_(), machines::Message::new(c, "ping", Vec::new()));
        env.enqueue(b, solver::Guard::true_(), machines::Message::new(c, "ping", Vec::new()));
        let mut config = SchedulerConfig::default();
        config.max_executions = 1;
        let mut loop_ = SearchLoop::new(env, config);
        loop_.do_search().unwrap();
        assert!(loop_.result.starts_with("partially correct with"));
    }
}
