//! Counters for the opaque solver/guard façade.
//!
//! The guard solver and coverage accumulator are conceptually single-writer
//! state; rather than a real global (`static`), one instance is threaded
//! through via `RuntimeContext`, owned by the single search-loop thread —
//! same effect, no hidden global state.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SolverStats {
    pub guard_and_calls: u64,
    pub guard_or_calls: u64,
    pub guard_not_calls: u64,
    pub concretize_calls: u64,
    pub distinct_states_seen: u64,
    pub total_states_seen: u64,
}

impl SolverStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_state(&mut self, is_distinct: bool) {
        self.total_states_seen += 1;
        if is_distinct {
            self.distinct_states_seen += 1;
        }
    }
}
