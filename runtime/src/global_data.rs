//! Per-interface creation counters and other run-wide bookkeeping that
//! belongs to the run as a whole rather than to any one `Choice`.
//!
//! A state snapshot captures these counters alongside each machine's local
//! state; `GlobalData` is where the live counters actually accumulate
//! between snapshots.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalData {
    creation_counters: HashMap<String, u64>,
}

impl GlobalData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that one more instance of `interface` was created, returning
    /// its 0-based ordinal (used for symmetry-class bucketing).
    pub fn record_creation(&mut self, interface: &str) -> u64 {
        let counter = self.creation_counters.entry(interface.to_string()).or_insert(0);
        let ordinal = *counter;
        *counter += 1;
        ordinal
    }

    pub fn count_for(&self, interface: &str) -> u64 {
        self.creation_counters.get(interface).copied().unwrap_or(0)
    }

    pub fn snapshot(&self) -> HashMap<String, u64> {
        self.creation_counters.clone()
    }

    pub fn restore(&mut self, snapshot: HashMap<String, u64>) {
        self.creation_counters = snapshot;
    }
}
