//! Coverage accumulation — the "update coverage" step that follows every
//! choice.
//!
//! Tracked per `(depth, choice_depth)` so `post_iteration_cleanup`'s
//! per-depth reset can clear exactly the entries for a depth that's being
//! abandoned, without disturbing coverage recorded elsewhere.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DepthStats {
    pub num_chosen: u64,
    pub num_backtrack_total: u64,
    pub num_backtrack_remaining: u64,
    pub is_data: bool,
    pub is_new_choice: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoverageStats {
    per_depth: HashMap<(usize, usize), DepthStats>,
    /// QLearning's (program_state_hash, choice_key) -> Q-value table.
    learned: HashMap<(u64, String), f64>,
}

impl CoverageStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        depth: usize,
        choice_depth: usize,
        num_chosen: usize,
        num_backtrack: usize,
        is_data: bool,
        is_new_choice: bool,
    ) {
        let entry = self.per_depth.entry((depth, choice_depth)).or_default();
        entry.num_chosen += num_chosen as u64;
        entry.num_backtrack_total += num_backtrack as u64;
        entry.num_backtrack_remaining = num_backtrack as u64;
        entry.is_data = is_data;
        entry.is_new_choice = is_new_choice;
    }

    /// Reflects a backtrack consumed (one alternative moved from
    /// `backtrack` into `chosen` on resume).
    pub fn note_backtrack_consumed(&mut self, depth: usize, choice_depth: usize) {
        if let Some(entry) = self.per_depth.get_mut(&(depth, choice_depth)) {
            entry.num_backtrack_remaining = entry.num_backtrack_remaining.saturating_sub(1);
        }
    }

    pub fn reset_depth(&mut self, depth: usize, choice_depth: usize) {
        self.per_depth.remove(&(depth, choice_depth));
    }

    pub fn q_value(&self, state_hash: u64, choice_key: &str) -> f64 {
        self.learned.get(&(state_hash, choice_key.to_string())).copied().unwrap_or(0.0)
    }

    pub fn update_q_value(&mut self, state_hash: u64, choice_key: &str, value: f64) {
        self.learned.insert((state_hash, choice_key.to_string()), value);
    }

    /// Testable Property 8: `coverage ∈ [0, 1]`.
    ///
    /// `1 - (remaining backtrack alternatives / alternatives ever seen)`,
    /// accumulated over every choice depth this run has touched.
    pub fn coverage(&self) -> f64 {
        let (seen, remaining) = self.per_depth.values().fold((0u64, 0u64), |(s, r), d| {
            (s + d.num_chosen + d.num_backtrack_total, r + d.num_backtrack_remaining)
        });
        if seen == 0 {
            return 1.0;
        }
        (1.0 - (remaining as f64 / seen as f64)).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coverage_is_one_with_no_recorded_choices() {
        let c = CoverageStats::new();
        assert_eq!(c.coverage(), 1.0);
    }

    #[test]
    fn coverage_decreases_with_pending_backtracks() {
        let mut c = CoverageStats::new();
        c.record(0, 0, 1, 3, false, true);
        assert!(c.coverage() < 1.0);
        c.note_backtrack_consumed(0, 0);
        c.note_backtrack_consumed(0, 0);
        c.note_backtrack_consumed(0, 0);
        assert_eq!(c.coverage(), 1.0);
    }

    #[test]
    fn coverage_always_in_unit_interval() {
        let mut c = CoverageStats::new();
        for d in 0..5 {
            c.record(d, d, 2, 5, d % 2 == 0, true);
        }
        let v = c.coverage();
        assert!((0.0..=1.0).contains(&v));
    }
}
