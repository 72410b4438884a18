//! `Choice`, one depth's scheduling decision, and the state snapshot it
//! owns while its backtrack set is non-empty.

use std::collections::HashMap;

use machines::{LocalState, MachineId, Value};
use serde::{Deserialize, Serialize};
use solver::{Guard, PrimitiveVS};

/// Every depth in a `Schedule` picks among values of this type: either a
/// `Value::Machine(id)` (a sender choice) or any other `Value` (a data
/// choice). Using one concrete value type for both keeps `Schedule`
/// homogeneous and trivially serializable; `Choice::is_data` is what tells
/// them apart.
pub type ChoiceValue = Value;
pub type Vs = PrimitiveVS<ChoiceValue>;

/// Snapshot captured when a `Choice`'s backtrack set becomes non-empty.
/// Owned by the `Choice` at which it was recorded; cleared when that
/// Choice's backtrack set empties.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchedulerStateSnapshot {
    pub machine_states: HashMap<MachineId, LocalState>,
    pub creation_counters: HashMap<String, u64>,
    pub symmetry: Option<Vec<Vec<MachineId>>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    pub chosen: Vs,
    pub backtrack: Vec<Vs>,
    pub repeat: Vs,
    pub handled_universe: Guard,
    pub saved: Option<SchedulerStateSnapshot>,
    pub scheduler_depth: usize,
    pub scheduler_choice_depth: usize,
    pub is_data: bool,
}

impl Choice {
    pub fn new(chosen: Vs, is_data: bool, scheduler_depth: usize, scheduler_choice_depth: usize) -> Self {
        let handled_universe = chosen.universe();
        Choice {
            chosen,
            backtrack: Vec::new(),
            repeat: Vs::empty(),
            handled_universe,
            saved: None,
            scheduler_depth,
            scheduler_choice_depth,
            is_data,
        }
    }

    pub fn has_backtrack(&self) -> bool {
        self.backtrack.iter().any(|vs| !vs.is_empty())
    }

    /// Testable Property 1: chosen and every backtrack alternative are
    /// pairwise disjoint.
    pub fn alternatives_are_disjoint(&self) -> bool {
        let chosen_universe = self.chosen.universe();
        self.backtrack
            .iter()
            .all(|b| chosen_universe.and(&b.universe()).is_false())
    }
}
