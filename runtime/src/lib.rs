//! Run-wide, non-`Schedule` state: wall-clock deadline, cooperative
//! cancellation, solver counters, and per-interface creation counters.
//!
//! `GlobalData`, `TimeMonitor`, and `SolverStats` are threaded through the
//! engine explicitly via `RuntimeContext` rather than kept as process
//! globals.

pub mod context;
pub mod global_data;
pub mod interrupt;
pub mod solver_stats;
pub mod time_monitor;

pub use context::RuntimeContext;
pub use global_data::GlobalData;
pub use interrupt::{InterruptFlag, Interrupted};
pub use solver_stats::SolverStats;
pub use time_monitor::{DeadlineExceeded, TimeMonitor};
