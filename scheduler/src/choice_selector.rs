//! `get_next` — the generic routine used to pick each choice (sender, data
//! value, ...) at the current choice depth.

use solver::{Guard, GuardedValue};

use crate::choice::{Choice, ChoiceValue, Vs};
use crate::coverage::CoverageStats;
use crate::orchestrator::{Candidate, ChoiceOrchestrator};
use crate::schedule::Schedule;

pub fn candidate_key(value: &ChoiceValue) -> String {
    value.to_string()
}

fn vs_to_candidates(vs: &Vs) -> Vec<Candidate> {
    vs.guarded_values()
        .iter()
        .map(|gv| Candidate { value: gv.clone(), key: candidate_key(&gv.value) })
        .collect()
}

fn candidates_to_vs(candidates: &[Candidate]) -> Vs {
    Vs::from_guarded(candidates.iter().map(|c| c.value.clone()).collect())
}

/// Outcome of `get_next`: the `PrimitiveVS` to drive this choice, plus
/// whether the schedule's filter collapsed to `false` — the iteration must
/// terminate when that happens.
pub struct NextChoice {
    pub value: Vs,
    pub exhausted: bool,
}

/// `produce` supplies fresh candidates when neither a repeat nor a pending
/// backtrack exists at `d`; it is only invoked then.
#[allow(clippy::too_many_arguments)]
pub fn get_next<F>(
    schedule: &mut Schedule,
    d: usize,
    is_data: bool,
    is_symbolic: bool,
    use_backtrack: bool,
    scheduler_depth: usize,
    orchestrator: &mut ChoiceOrchestrator,
    coverage: &mut CoverageStats,
    state_hash: u64,
    produce: F,
) -> NextChoice
where
    F: FnOnce() -> Vec<GuardedValue<ChoiceValue>>,
{
    // Step 1: replay a saved prefix.
    if d < schedule.size() {
        let repeat_under_filter = {
            let choice = schedule.get(d).expect("checked d < size");
            let restricted = choice.repeat.restrict(&schedule.filter);
            (!restricted.is_empty()).then_some(restricted)
        };
        if let Some(restricted) = repeat_under_filter {
            schedule.restrict_filter(&restricted.universe());
            return NextChoice { exhausted: schedule.is_exhausted(), value: restricted };
        }
    }

    // Step 2/3: consume pending backtracks, or generate fresh candidates.
    let (mut candidates, is_new_choice) = if d < schedule.size() && schedule.get(d).unwrap().has_backtrack() {
        let choice = schedule.get_mut(d).unwrap();
        let taken = std::mem::take(&mut choice.backtrack);
        let flat: Vec<Candidate> = taken.iter().flat_map(vs_to_candidates).collect();
        (flat, false)
    } else {
        let fresh: Vec<Candidate> = produce()
            .into_iter()
            .filter_map(|gv| {
                let guard = gv.guard.and(&schedule.filter);
                (!guard.is_false()).then(|| Candidate { value: GuardedValue { guard, value: gv.value }, key: String::new() })
            })
            .map(|mut c| {
                c.key = candidate_key(&c.value.value);
                c
            })
            .collect();
        (fresh, true)
    };

    if candidates.is_empty() {
        schedule.restrict_filter(&Guard::false_());
        return NextChoice { value: Vs::empty(), exhausted: true };
    }

    // Step 4: orchestrator reordering.
    orchestrator.order(&mut candidates, state_hash, coverage);

    // Step 5: split chosen / backtrack. When `use_backtrack` is false, the
    // deferred alternatives are dropped outright rather than kept around to
    // never be revisited — so `Choice::has_backtrack` stays false and no
    // save point is ever taken for this depth.
    let (chosen_candidates, backtrack_vs): (Vec<Candidate>, Vec<Vs>) = if is_symbolic {
        (candidates, Vec::new())
    } else {
        let mut iter = candidates.into_iter();
        let first = iter.next().expect("non-empty candidates checked above");
        let rest: Vec<Vs> = if use_backtrack {
            iter.map(|c| Vs::single(c.value.value, c.value.guard)).collect()
        } else {
            Vec::new()
        };
        (vec![first], rest)
    };

    // Step 6: coverage.
    coverage.record(scheduler_depth, d, chosen_candidates.len(), backtrack_vs.len(), is_data, is_new_choice);

    // Step 7: build the final value, record at depth d, restrict filter.
    let chosen_vs = candidates_to_vs(&chosen_candidates);
    let mut choice = Choice::new(chosen_vs.clone(), is_data, scheduler_depth, d);
    choice.backtrack = backtrack_vs;
    // `saved` is populated by the step function's save point before get_next
    // runs for this depth; carry forward whatever was already there (the
    // repeat/backtrack path reuses the same depth).
    if let Some(prior) = schedule.get(d) {
        choice.saved = prior.saved.clone();
    }
    schedule.set(d, choice);
    schedule.restrict_filter(&chosen_vs.universe());

    NextChoice { exhausted: schedule.is_exhausted(), value: chosen_vs }
}

#[cfg(test)]
mod tests {
    use super::*;
    use machines::Value;
    use solver::GuardFactory;

    fn factory() -> GuardFactory {
        GuardFactory::default()
    }

    #[test]
    fn fresh_candidates_produce_nonempty_chosen() {
        let f = factory();
        let mut schedule = Schedule::new();
        let mut orch = ChoiceOrchestrator::new(crate::config::ChoiceOrchestration::None, 0, 0.1);
        let mut coverage = CoverageStats::new();
        let produce = || {
            vec![
                GuardedValue { guard: f.fresh(), value: Value::Int(1) },
                GuardedValue { guard: f.fresh(), value: Value::Int(2) },
            ]
        };
        let result = get_next(&mut schedule, 0, false, false, true, 0, &mut orch, &mut coverage, 0, produce);
        assert!(!result.value.is_empty());
        assert_eq!(schedule.size(), 1);
    }

    #[test]
    fn empty_producer_exhausts_the_filter() {
        let mut schedule = Schedule::new();
        let mut orch = ChoiceOrchestrator::new(crate::config::ChoiceOrchestration::None, 0, 0.1);
        let mut coverage = CoverageStats::new();
        let result = get_next(&mut schedule, 0, false, false, true, 0, &mut orch, &mut coverage, 0, Vec::new);
        assert!(result.exhausted);
        assert!(schedule.is_exhausted());
    }

    #[test]
    fn symbolic_mode_keeps_every_candidate_in_chosen() {
        let f = factory();
        let mut schedule = Schedule::new();
        let mut orch = ChoiceOrchestrator::new(crate::config::ChoiceOrchestration::None, 0, 0.1);
        let mut coverage = CoverageStats::new();
        let produce = || {
            vec![
                GuardedValue { guard: f.fresh(), value: Value::Int(1) },
                GuardedValue { guard: f.fresh(), value: Value::Int(2) },
            ]
        };
        let result = get_next(&mut schedule, 0, false, true, true, 0, &mut orch, &mut coverage, 0, produce);
        assert_eq!(result.value.len(), 2);
        assert!(schedule.get(0).unwrap().backtrack.is_empty());
    }

    #[test]
    fn explicit_mode_defers_the_rest_to_backtrack() {
        let f = factory();
        let mut schedule = Schedule::new();
        let mut orch = ChoiceOrchestrator::new(crate::config::ChoiceOrchestration::None, 0, 0.1);
        let mut coverage = CoverageStats::new();
        let produce = || {
            vec![
                GuardedValue { guard: f.fresh(), value: Value::Int(1) },
                GuardedValue { guard: f.fresh(), value: Value::Int(2) },
            ]
        };
        get_next(&mut schedule, 0, false, false, true, 0, &mut orch, &mut coverage, 0, produce);
        assert_eq!(schedule.get(0).unwrap().backtrack.len(), 1);
    }

    #[test]
    fn use_backtrack_false_drops_deferred_alternatives() {
        let f = factory();
        let mut schedule = Schedule::new();
        let mut orch = ChoiceOrchestrator::new(crate::config::ChoiceOrchestration::None, 0, 0.1);
        let mut coverage = CoverageStats::new();
        let produce = || {
            vec![
                GuardedValue { guard: f.fresh(), value: Value::Int(1) },
                GuardedValue { guard: f.fresh(), value: Value::Int(2) },
            ]
        };
        get_next(&mut schedule, 0, false, false, false, 0, &mut orch, &mut coverage, 0, produce);
        assert!(!schedule.get(0).unwrap().has_backtrack());
    }
}
