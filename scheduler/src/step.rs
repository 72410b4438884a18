//! `Step` — one atomic scheduling decision: snapshot state for distinct-state
//! pruning, merge symmetry classes, pick a sender, pick its pending message,
//! dispatch it, and advance (or not) the schedule depth.

use std::collections::HashMap;
use std::fmt;

use machines::{LocalState, MachineEnvironment, MachineError, MachineId, Message, Value};
use solver::{DnfConcretizer, Guard, GuardedValue, PrimitiveVS};

use crate::choice::SchedulerStateSnapshot;
use crate::choice_selector::get_next;
use crate::config::{SchedulerConfig, StateCachingMode, SymmetryMode};
use crate::coverage::CoverageStats;
use crate::error::EngineError;
use crate::orchestrator::ChoiceOrchestrator;
use crate::schedule::Schedule;
use crate::state_cache::StateCache;
use crate::symmetry::SymmetryReducer;
use runtime::RuntimeContext;

pub struct StepOutcome {
    pub done: bool,
    pub sticky_step: bool,
}

fn sender_choices_to_candidates(choices: &[PrimitiveVS<MachineId>]) -> Vec<GuardedValue<Value>> {
    choices
        .iter()
        .flat_map(|vs| {
            vs.guarded_values()
                .iter()
                .map(|gv| GuardedValue { guard: gv.guard.clone(), value: Value::Machine(gv.value) })
        })
        .collect()
}

fn snapshot_states<E: MachineEnvironment>(env: &E) -> Result<Vec<(MachineId, LocalState)>, EngineError> {
    env.current_machines()
        .into_iter()
        .map(|id| -> Result<_, EngineError> { Ok((id, env.get_local_state(id).map_err(EngineError::from)?)) })
        .collect()
}

/// A whole machine's local state (every variable), concretized into one
/// composite key — the Cartesian product of its variables' guarded values,
/// so a machine with several live branches across its variables still
/// yields one `PrimitiveVS` per machine the way `StateCache`'s enumeration
/// functions expect.
#[derive(Clone, Debug, PartialEq)]
struct StateKey(Vec<Value>);

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.iter().map(ToString::to_string).collect::<Vec<_>>().join(","))
    }
}

fn composite_local_state(local: &LocalState) -> PrimitiveVS<StateKey> {
    let mut acc: Vec<(Guard, Vec<Value>)> = vec![(Guard::true_(), Vec::new())];
    for var in local {
        let mut next = Vec::new();
        for (guard, values) in &acc {
            for gv in var.guarded_values() {
                let combined = guard.and(&gv.guard);
                if combined.is_false() {
                    continue;
                }
                let mut values = values.clone();
                values.push(gv.value.clone());
                next.push((combined, values));
            }
        }
        acc = next;
    }
    PrimitiveVS::from_guarded(acc.into_iter().map(|(guard, values)| GuardedValue { guard, value: StateKey(values) }))
}

fn composite_states(raw: &[(MachineId, LocalState)]) -> Vec<(MachineId, PrimitiveVS<StateKey>)> {
    raw.iter().map(|(id, ls)| (*id, composite_local_state(ls))).collect()
}

/// Runs one step against `env`, mutating `schedule` at `(*depth, *choice_depth)`.
/// Returns `done = true` when there is no eligible sender left to schedule —
/// the caller ends the iteration in that case.
#[allow(clippy::too_many_arguments)]
pub fn step<E: MachineEnvironment>(
    env: &mut E,
    schedule: &mut Schedule,
    ctx: &mut RuntimeContext,
    config: &SchedulerConfig,
    orchestrator: &mut ChoiceOrchestrator,
    coverage: &mut CoverageStats,
    state_cache: &mut StateCache,
    symmetry: &mut dyn SymmetryReducer,
    depth: &mut usize,
    choice_depth: &mut usize,
    backtrack_depth: usize,
    prior_sticky_step: bool,
) -> Result<StepOutcome, EngineError> {
    // Steps 1-2: snapshot every live machine's local state and run
    // distinct-state pruning, when state caching is on at all.
    let caching_enabled = config.is_symbolic || !matches!(config.state_caching_mode, StateCachingMode::None);
    let distinct_state_guard: Option<Guard> = if caching_enabled {
        let concretizer = DnfConcretizer;
        if config.is_symbolic {
            let raw = snapshot_states(env)?;
            let composite = composite_states(&raw);
            let result =
                state_cache.enumerate_concrete_states_from_symbolic(&composite, &concretizer, schedule.filter.clone());
            Some(result.distinct_state_guard)
        } else {
            match config.state_caching_mode {
                StateCachingMode::Fast => {
                    let raw = snapshot_states(env)?;
                    let result = state_cache.enumerate_fast(&raw);
                    Some(result.distinct_state_guard)
                }
                StateCachingMode::Exact => {
                    let raw = snapshot_states(env)?;
                    let composite = composite_states(&raw);
                    let result = state_cache.enumerate_concrete_states_from_explicit(
                        config.state_caching_mode,
                        prior_sticky_step,
                        *choice_depth,
                        backtrack_depth,
                        &composite,
                        &concretizer,
                    );
                    Some(result.distinct_state_guard)
                }
                StateCachingMode::None => unreachable!("gated by caching_enabled"),
            }
        }
    } else {
        None
    };

    // Step 3: symmetry merge, before sender selection.
    let symmetry_classes = if matches!(config.symmetry_mode, SymmetryMode::Full) {
        let raw = snapshot_states(env)?;
        let refs: Vec<(MachineId, &LocalState)> = raw.iter().map(|(id, ls)| (*id, ls)).collect();
        Some(symmetry.merge_classes(&refs))
    } else {
        None
    };

    // Step 5: GC halted-target remnants, before sender selection so it
    // never sees a dead target.
    for id in env.current_machines() {
        env.gc_halted_targets(id).map_err(EngineError::from)?;
    }

    // Step 6: pick sender, pruned to `distinct_state_guard` at the
    // sender-selection boundary when caching found a repeat.
    let mut sender_choices = env.get_next_sender_choices();
    if let Some(guard) = &distinct_state_guard {
        sender_choices =
            sender_choices.iter().map(|vs| StateCache::filter_distinct(vs, guard)).filter(|vs| !vs.is_empty()).collect();
    }
    if sender_choices.iter().all(|vs| vs.is_empty()) {
        return Ok(StepOutcome { done: true, sticky_step: false });
    }

    let state_hash = {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};
        let mut hasher = DefaultHasher::new();
        env.current_machines().hash(&mut hasher);
        hasher.finish()
    };

    let d = *choice_depth;
    let next = get_next(
        schedule,
        d,
        false,
        config.is_symbolic,
        config.use_backtrack,
        *depth,
        orchestrator,
        coverage,
        state_hash,
        || sender_choices_to_candidates(&sender_choices),
    );

    if next.exhausted {
        return Ok(StepOutcome { done: true, sticky_step: false });
    }
    *choice_depth += 1;

    // Step 4 (save point): the first time this depth picks up a backtrack
    // set, snapshot the state it would need to restore to retry one of the
    // deferred alternatives later (`post_iteration_cleanup` reads this
    // back). When `use_backtrack` is false, `get_next` never populates a
    // backtrack set in the first place, so this never fires — no saved
    // state, nothing to revisit.
    if config.use_backtrack {
        if let Some(choice) = schedule.get_mut(d) {
            if choice.has_backtrack() && choice.saved.is_none() {
                let mut machine_states = HashMap::new();
                for id in env.current_machines() {
                    machine_states.insert(id, env.get_local_state(id).map_err(EngineError::from)?);
                }
                choice.saved = Some(SchedulerStateSnapshot {
                    machine_states,
                    creation_counters: ctx.global.snapshot(),
                    symmetry: symmetry_classes.clone(),
                });
            }
        }
    }

    // Step 7: wall-clock deadline.
    ctx.time.check().map_err(|_| EngineError::Timeout { elapsed_ms: ctx.time.elapsed().as_millis() })?;
    ctx.interrupt.check().map_err(|_| EngineError::Interrupted)?;

    // Step 8: remove one message per (machine, guard), merge into `effect`.
    let senders: Vec<(MachineId, Guard)> =
        next.value.guarded_values().iter().map(|gv| (gv.value, gv.guard.clone())).collect();

    let mut effect: Option<Message> = None;
    for (machine, guard) in &senders {
        if let Some(message) = env.rm_buffer(*machine, guard).map_err(EngineError::from)? {
            effect = Some(match effect {
                None => message,
                Some(base) => base.merge(message),
            });
        }
    }
    let Some(effect) = effect else {
        return Ok(StepOutcome { done: true, sticky_step: false });
    };

    // Step 9: sticky-step rule.
    let only_one_sender = senders.len() == 1;
    let sticky_step = only_one_sender && effect.is_sticky;
    if sticky_step {
        coverage.record(*depth, d, 0, 0, false, false);
    } else {
        *depth += 1;
    }

    // Step 10: dispatch. `PropertyViolation` gets its own depth-tagged
    // variant; everything else from the environment boundary converts
    // through the blanket `From<MachineError>`.
    env.perform_effect(effect).map_err(|err| match err {
        MachineError::PropertyViolation(detail) => EngineError::PropertyViolation { depth: *depth, detail },
        other => EngineError::from(other),
    })?;

    Ok(StepOutcome { done: false, sticky_step })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symmetry::StructuralSymmetryReducer;
    use machines::InMemoryEnvironment;
    use runtime::TimeMonitor;

    fn context() -> RuntimeContext {
        RuntimeContext::new(TimeMonitor::unbounded())
    }

    #[allow(clippy::too_many_arguments)]
    fn run_step(
        env: &mut InMemoryEnvironment,
        schedule: &mut Schedule,
        ctx: &mut RuntimeContext,
        config: &SchedulerConfig,
        orch: &mut ChoiceOrchestrator,
        coverage: &mut CoverageStats,
        cache: &mut StateCache,
        depth: &mut usize,
        choice_depth: &mut usize,
    ) -> Result<StepOutcome, EngineError> {
        let mut reducer = StructuralSymmetryReducer;
        step(env, schedule, ctx, config, orch, coverage, cache, &mut reducer, depth, choice_depth, 0, false)
    }

    #[test]
    fn step_with_no_machines_is_immediately_done() {
        let mut env = InMemoryEnvironment::new();
        let mut schedule = Schedule::new();
        let mut ctx = context();
        let config = SchedulerConfig::default();
        let mut orch = ChoiceOrchestrator::new(crate::config::ChoiceOrchestration::None, 0, 0.1);
        let mut coverage = CoverageStats::new();
        let mut cache = StateCache::new();
        let mut depth = 0;
        let mut choice_depth = 0;
        let outcome =
            run_step(&mut env, &mut schedule, &mut ctx, &config, &mut orch, &mut coverage, &mut cache, &mut depth, &mut choice_depth)
                .unwrap();
        assert!(outcome.done);
    }

    #[test]
    fn step_dispatches_a_pending_message() {
        let mut env = InMemoryEnvironment::new();
        let a = env.spawn(Vec::new());
        let b = env.spawn(Vec::new());
        env.enqueue(a, Guard::true_(), Message::new(b, "ping", Vec::new()));
        let mut schedule = Schedule::new();
        let mut ctx = context();
        let config = SchedulerConfig::default();
        let mut orch = ChoiceOrchestrator::new(crate::config::ChoiceOrchestration::None, 0, 0.1);
        let mut coverage = CoverageStats::new();
        let mut cache = StateCache::new();
        let mut depth = 0;
        let mut choice_depth = 0;
        let outcome =
            run_step(&mut env, &mut schedule, &mut ctx, &config, &mut orch, &mut coverage, &mut cache, &mut depth, &mut choice_depth)
                .unwrap();
        assert!(!outcome.done);
        assert_eq!(depth, 1);
        assert_eq!(choice_depth, 1);
    }

    #[test]
    fn sticky_message_does_not_advance_depth() {
        let mut env = InMemoryEnvironment::new();
        let a = env.spawn(Vec::new());
        let b = env.spawn(Vec::new());
        env.enqueue(a, Guard::true_(), Message::new(b, "create", Vec::new()).sticky());
        let mut schedule = Schedule::new();
        let mut ctx = context();
        let config = SchedulerConfig::default();
        let mut orch = ChoiceOrchestrator::new(crate::config::ChoiceOrchestration::None, 0, 0.1);
        let mut coverage = CoverageStats::new();
        let mut cache = StateCache::new();
        let mut depth = 0;
        let mut choice_depth = 0;
        let outcome =
            run_step(&mut env, &mut schedule, &mut ctx, &config, &mut orch, &mut coverage, &mut cache, &mut depth, &mut choice_depth)
                .unwrap();
        assert!(outcome.sticky_step);
        assert_eq!(depth, 0);
        assert_eq!(choice_depth, 1);
    }

    #[test]
    fn a_backtrack_set_gets_a_save_point() {
        let mut env = InMemoryEnvironment::new();
        let a = env.spawn(Vec::new());
        let b = env.spawn(Vec::new());
        let c = env.spawn(Vec::new());
        env.enqueue(a, Guard::true_(), Message::new(c, "ping", Vec::new()));
        env.enqueue(b, Guard::true_(), Message::new(c, "ping", Vec::new()));
        let mut schedule = Schedule::new();
        let mut ctx = context();
        let config = SchedulerConfig::default();
        let mut orch = ChoiceOrchestrator::new(crate::config::ChoiceOrchestration::None, 0, 0.1);
        let mut coverage = CoverageStats::new();
        let mut cache = StateCache::new();
        let mut depth = 0;
        let mut choice_depth = 0;
        run_step(&mut env, &mut schedule, &mut ctx, &config, &mut orch, &mut coverage, &mut cache, &mut depth, &mut choice_depth)
            .unwrap();
        let choice = schedule.get(0).unwrap();
        assert!(choice.has_backtrack());
        assert!(choice.saved.is_some());
        assert_eq!(choice.saved.as_ref().unwrap().machine_states.len(), 3);
    }

    #[test]
    fn use_backtrack_false_never_takes_a_save_point() {
        let mut env = InMemoryEnvironment::new();
        let a = env.spawn(Vec::new());
        let b = env.spawn(Vec::new());
        let c = env.spawn(Vec::new());
        env.enqueue(a, Guard::true_(), Message::new(c, "ping", Vec::new()));
        env.enqueue(b, Guard::true_(), Message::new(c, "ping", Vec::new()));
        let mut schedule = Schedule::new();
        let mut ctx = context();
        let mut config = SchedulerConfig::default();
        config.use_backtrack = false;
        let mut orch = ChoiceOrchestrator::new(crate::config::ChoiceOrchestration::None, 0, 0.1);
        let mut coverage = CoverageStats::new();
        let mut cache = StateCache::new();
        let mut depth = 0;
        let mut choice_depth = 0;
        run_step(&mut env, &mut schedule, &mut ctx, &config, &mut orch, &mut coverage, &mut cache, &mut depth, &mut choice_depth)
            .unwrap();
        let choice = schedule.get(0).unwrap();
        assert!(!choice.has_backtrack());
        assert!(choice.saved.is_none());
    }

    #[test]
    fn fast_state_caching_marks_a_repeated_loop_distinct_then_not() {
        let mut env = InMemoryEnvironment::new();
        let a = env.spawn(Vec::new());
        let b = env.spawn(Vec::new());
        env.enqueue(a, Guard::true_(), Message::new(b, "ping", Vec::new()).sticky());
        env.enqueue(a, Guard::true_(), Message::new(b, "ping", Vec::new()).sticky());
        let mut schedule = Schedule::new();
        let mut ctx = context();
        let mut config = SchedulerConfig::default();
        config.state_caching_mode = StateCachingMode::Fast;
        let mut orch = ChoiceOrchestrator::new(crate::config::ChoiceOrchestration::None, 0, 0.1);
        let mut coverage = CoverageStats::new();
        let mut cache = StateCache::new();
        let mut depth = 0;
        let mut choice_depth = 0;
        run_step(&mut env, &mut schedule, &mut ctx, &config, &mut orch, &mut coverage, &mut cache, &mut depth, &mut choice_depth)
            .unwrap();
        assert_eq!(cache.total_distinct_states(), 1);
        run_step(&mut env, &mut schedule, &mut ctx, &config, &mut orch, &mut coverage, &mut cache, &mut depth, &mut choice_depth)
            .unwrap();
        assert_eq!(cache.total_states(), 2);
    }

    #[test]
    fn assert_fail_effect_surfaces_as_property_violation() {
        let mut env = InMemoryEnvironment::new();
        let a = env.spawn(Vec::new());
        env.enqueue(a, Guard::true_(), Message::new(a, "assert_fail", vec![Value::Str("bad".to_string())]));
        let mut schedule = Schedule::new();
        let mut ctx = context();
        let config = SchedulerConfig::default();
        let mut orch = ChoiceOrchestrator::new(crate::config::ChoiceOrchestration::None, 0, 0.1);
        let mut coverage = CoverageStats::new();
        let mut cache = StateCache::new();
        let mut depth = 0;
        let mut choice_depth = 0;
        let result =
            run_step(&mut env, &mut schedule, &mut ctx, &config, &mut orch, &mut coverage, &mut cache, &mut depth, &mut choice_depth);
        assert!(matches!(result, Err(EngineError::PropertyViolation { .. })));
    }
}
