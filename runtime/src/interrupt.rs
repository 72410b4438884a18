//! Cooperative cancellation flag.
//!
//! Checked during `summarize_iteration`/task resumption so an external
//! caller can abort the loop between iterations. Checked only at iteration
//! boundaries, never mid-step.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("search interrupted")]
pub struct Interrupted;

/// A flag an external caller (a signal handler, a UI "stop" button) can set
/// from anywhere; the search loop only ever reads it at iteration
/// boundaries.
#[derive(Debug, Clone, Default)]
pub struct InterruptFlag(Arc<AtomicBool>);

impl InterruptFlag {
    pub fn new() -> Self {
        InterruptFlag(Arc::new(AtomicBool::new(false)))
    }

    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn check(&self) -> Result<(), Interrupted> {
        if self.0.load(Ordering::SeqCst) { Err(Interrupted) } else { Ok(()) }
    }
}
