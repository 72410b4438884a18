//! `StateCache` — distinct-state pruning, `Fast` and `Exact` modes plus the
//! fully-symbolic path.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::fmt::Display;
use std::hash::{Hash, Hasher};

use machines::{LocalState, MachineId};
use solver::{Concretizer, Guard, PrimitiveVS};

use crate::config::StateCachingMode;

#[derive(Debug, Default)]
pub struct StateCache {
    seen: HashSet<String>,
    total_states: u64,
    total_distinct_states: u64,
}

/// Result of one enumeration pass: `(num_states, num_distinct)` plus the
/// guard identifying which paths reached a new state this step.
pub struct EnumerationResult {
    pub num_states: usize,
    pub num_distinct: usize,
    pub distinct_state_guard: Guard,
}

impl StateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Running total of states visited across every enumeration call,
    /// `Fast`, `Exact`, and symbolic alike.
    pub fn total_states(&self) -> u64 {
        self.total_states
    }

    /// Running total of states that were new the first time they were seen.
    pub fn total_distinct_states(&self) -> u64 {
        self.total_distinct_states
    }

    fn record(&mut self, result: EnumerationResult) -> EnumerationResult {
        self.total_states += result.num_states as u64;
        self.total_distinct_states += result.num_distinct as u64;
        result
    }

    fn hash_key(machine_states: &[(MachineId, String)]) -> String {
        let mut hasher = DefaultHasher::new();
        for (id, key) in machine_states {
            id.hash(&mut hasher);
            key.hash(&mut hasher);
        }
        hasher.finish().to_string()
    }

    /// Fast mode: hash each machine's `LocalState` branch count rather than
    /// concretizing. Cheap, approximate — two different concrete states that
    /// happen to have the same shape can collide, which `Exact` mode avoids.
    pub fn enumerate_fast(&mut self, machine_states: &[(MachineId, LocalState)]) -> EnumerationResult {
        let keyed: Vec<(MachineId, String)> = machine_states
            .iter()
            .map(|(id, ls)| (*id, format!("{:?}", ls.iter().map(|vs| vs.len()).collect::<Vec<_>>())))
            .collect();
        let key = Self::hash_key(&keyed);
        let result = if self.seen.contains(&key) {
            EnumerationResult { num_states: 1, num_distinct: 0, distinct_state_guard: Guard::false_() }
        } else {
            self.seen.insert(key);
            EnumerationResult { num_states: 1, num_distinct: 1, distinct_state_guard: Guard::true_() }
        };
        self.record(result)
    }

    /// Exact mode: one live branch expected per machine, concretized via
    /// `Concretizer` rather than hashed by shape.
    pub fn enumerate_concrete_states_from_explicit<T, C>(
        &mut self,
        mode: StateCachingMode,
        sticky_step: bool,
        choice_depth: usize,
        backtrack_depth: usize,
        machine_states: &[(MachineId, PrimitiveVS<T>)],
        concretizer: &C,
    ) -> EnumerationResult
    where
        T: Clone + PartialEq + Display,
        C: Concretizer,
    {
        if sticky_step || choice_depth <= backtrack_depth || matches!(mode, StateCachingMode::None) {
            return EnumerationResult { num_states: 0, num_distinct: 0, distinct_state_guard: Guard::true_() };
        }
        let keyed: Vec<(MachineId, String)> = machine_states
            .iter()
            .filter_map(|(id, vs)| concretizer.concretize(vs).map(|gv| (*id, gv.value.to_string())))
            .collect();
        let key = Self::hash_key(&keyed);
        let result = if self.seen.contains(&key) {
            EnumerationResult { num_states: 1, num_distinct: 0, distinct_state_guard: Guard::false_() }
        } else {
            self.seen.insert(key);
            EnumerationResult { num_states: 1, num_distinct: 1, distinct_state_guard: Guard::true_() }
        };
        self.record(result)
    }

    /// Iteratively concretizes under a shrinking path condition until it is
    /// exhausted, unioning the guard of every branch that turns out to be
    /// new.
    pub fn enumerate_concrete_states_from_symbolic<T, C>(
        &mut self,
        machine_states: &[(MachineId, PrimitiveVS<T>)],
        concretizer: &C,
        initial_pc: Guard,
    ) -> EnumerationResult
    where
        T: Clone + PartialEq + Display,
        C: Concretizer,
    {
        let mut iter_pc = initial_pc;
        let mut distinct_state_guard = Guard::false_();
        let mut num_states = 0usize;
        let mut num_distinct = 0usize;

        while !iter_pc.is_false() {
            let mut branch_guard = iter_pc.clone();
            let mut keyed: Vec<(MachineId, String)> = Vec::new();
            for (id, vs) in machine_states {
                let Some(gv) = concretizer.concretize_under(vs, &branch_guard) else {
                    branch_guard = Guard::false_();
                    break;
                };
                keyed.push((*id, gv.value.to_string()));
                branch_guard = gv.guard;
            }
            if branch_guard.is_false() {
                iter_pc = iter_pc.and(&branch_guard.not());
                continue;
            }
            num_states += 1;
            let key = Self::hash_key(&keyed);
            if !self.seen.contains(&key) {
                self.seen.insert(key);
                num_distinct += 1;
                distinct_state_guard = distinct_state_guard.or(&branch_guard);
            }
            iter_pc = iter_pc.and(&branch_guard.not());
        }

        self.record(EnumerationResult { num_states, num_distinct, distinct_state_guard })
    }

    /// Restricts `candidates` to `distinct_state_guard`, dropping empties —
    /// the sender-selection-boundary prune.
    pub fn filter_distinct<T: Clone + PartialEq>(
        candidates: &PrimitiveVS<T>,
        distinct_state_guard: &Guard,
    ) -> PrimitiveVS<T> {
        candidates.restrict(distinct_state_guard)
    }
}
