//! The engine's error taxonomy, one `thiserror` variant each.
//!
//! Policy: halted-target message cleanup and empty-choice restrictions
//! recover locally and never reach this type; everything else propagates
//! through `?`.

use std::path::PathBuf;

use machines::MachineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// An assertion fired inside the program under test. Recorded at the
    /// triggering path condition; terminates the iteration with
    /// `result = "bug found"`; the search loop exits.
    #[error("property violated at depth {depth}: {detail}")]
    PropertyViolation { depth: usize, detail: String },

    /// `depth >= max_step_bound`. Fatal iff `fail_on_max_step_bound`;
    /// otherwise the caller records "correct up to step N" and moves on.
    #[error("step bound {bound} exceeded at depth {depth}")]
    StepBoundExceeded { depth: usize, bound: usize },

    /// `TimeMonitor` deadline passed.
    #[error("search deadline exceeded after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u128 },

    /// Cooperative cancellation between iterations.
    #[error("search interrupted")]
    Interrupted,

    /// Checkpoint read/write failure, wrapped with the file path.
    #[error("checkpoint I/O failed for {path}: {source}")]
    CheckpointIo { path: PathBuf, #[source] source: std::io::Error },

    /// Propagated unchanged from the `MachineEnvironment` boundary.
    #[error("machine environment error: {0}")]
    Machine(#[from] MachineError),
}
