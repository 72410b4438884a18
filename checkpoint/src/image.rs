//! `CheckpointImage`: the whole-engine snapshot written out as an atomic
//! file — the schedule, iteration counters, coverage stats, and global
//! creation-counter state needed to resume a search exactly where it left
//! off.

use std::collections::HashMap;

use scheduler::{CoverageStats, IterationCounters, Schedule};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointImage {
    pub schedule: Schedule,
    pub counters: IterationCounters,
    pub coverage: CoverageStats,
    pub global_creation_counters: HashMap<String, u64>,
    pub result: String,
}
