//! `RuntimeContext`: the one non-`Schedule` piece of mutable state the
//! search loop owns, handed to components by reference.
//!
//! Explicit and non-global on purpose: the loop owns exactly one instance
//! and child components borrow it for the loop's lifetime, rather than
//! reaching for process-level statics.

use crate::global_data::GlobalData;
use crate::interrupt::InterruptFlag;
use crate::solver_stats::SolverStats;
use crate::time_monitor::TimeMonitor;

pub struct RuntimeContext {
    pub time: TimeMonitor,
    pub interrupt: InterruptFlag,
    pub stats: SolverStats,
    pub global: GlobalData,
}

impl RuntimeContext {
    pub fn new(time: TimeMonitor) -> Self {
        RuntimeContext {
            time,
            interrupt: InterruptFlag::new(),
            stats: SolverStats::new(),
            global: GlobalData::new(),
        }
    }

    pub fn unbounded() -> Self {
        Self::new(TimeMonitor::unbounded())
    }
}
