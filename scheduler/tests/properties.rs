//! Property tests for the quantified invariants: disjoint alternatives,
//! schedule growth by exactly one choice per `get_next` call, and the
//! coverage accumulator staying within `[0, 1]`.

use machines::Value;
use proptest::prelude::*;
use scheduler::choice_selector::get_next;
use scheduler::choice::ChoiceValue;
use scheduler::config::ChoiceOrchestration;
use scheduler::coverage::CoverageStats;
use scheduler::orchestrator::ChoiceOrchestrator;
use scheduler::schedule::Schedule;
use solver::{GuardFactory, GuardedValue};

fn run_get_next(n: usize, is_symbolic: bool) -> (Schedule, scheduler::choice_selector::NextChoice) {
    let factory = GuardFactory::new();
    let mut schedule = Schedule::new();
    let mut orchestrator = ChoiceOrchestrator::new(ChoiceOrchestration::None, 0, 0.1);
    let mut coverage = CoverageStats::new();
    let produce = || {
        (0..n.max(1))
            .map(|i| GuardedValue { guard: factory.fresh(), value: Value::Int(i as i64) })
            .collect::<Vec<GuardedValue<ChoiceValue>>>()
    };
    let result =
        get_next(&mut schedule, 0, false, is_symbolic, 0, &mut orchestrator, &mut coverage, 0, produce);
    (schedule, result)
}

proptest! {
    #[test]
    fn get_next_grows_schedule_by_exactly_one(n in 1usize..8, is_symbolic in any::<bool>()) {
        let (schedule, _) = run_get_next(n, is_symbolic);
        prop_assert_eq!(schedule.size(), 1);
    }

    #[test]
    fn chosen_and_backtrack_stay_pairwise_disjoint(n in 1usize..8) {
        let (schedule, _) = run_get_next(n, false);
        let choice = schedule.get(0).unwrap();
        prop_assert!(choice.alternatives_are_disjoint());
    }

    #[test]
    fn symbolic_mode_never_produces_backtrack(n in 1usize..8) {
        let (schedule, _) = run_get_next(n, true);
        let choice = schedule.get(0).unwrap();
        prop_assert!(!choice.has_backtrack());
    }

    #[test]
    fn coverage_stays_in_unit_interval(chosen in 0u64..20, backtrack_total in 0u64..20, remaining in 0u64..20) {
        let mut coverage = CoverageStats::new();
        coverage.record(0, 0, chosen as usize, backtrack_total as usize, false, true);
        for _ in 0..remaining.min(backtrack_total) {
            coverage.note_backtrack_consumed(0, 0);
        }
        let v = coverage.coverage();
        prop_assert!((0.0..=1.0).contains(&v));
    }
}
