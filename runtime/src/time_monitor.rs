//! Wall-clock deadline tracking.
//!
//! A plain `Instant`-based deadline, not a sleeping timer — nothing here
//! spawns a thread; `check` is a synchronous comparison called between
//! steps, one of the only points where the search loop may observe an
//! external-time-triggered error.

use std::time::{Duration, Instant};

/// Raised by `TimeMonitor::check` once the deadline has passed.
#[derive(Debug, Clone, Copy, thiserror::Error)]
#[error("search deadline exceeded")]
pub struct DeadlineExceeded;

#[derive(Debug, Clone)]
pub struct TimeMonitor {
    deadline: Option<Instant>,
    started_at: Instant,
}

impl TimeMonitor {
    /// `max_duration = None` disables the deadline entirely.
    pub fn new(max_duration: Option<Duration>) -> Self {
        let started_at = Instant::now();
        TimeMonitor { deadline: max_duration.map(|d| started_at + d), started_at }
    }

    pub fn unbounded() -> Self {
        Self::new(None)
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn check(&self) -> Result<(), DeadlineExceeded> {
        match self.deadline {
            Some(d) if Instant::now() >= d => Err(DeadlineExceeded),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbounded_never_expires() {
        let tm = TimeMonitor::unbounded();
        assert!(tm.check().is_ok());
    }

    #[test]
    fn zero_duration_expires_immediately() {
        let tm = TimeMonitor::new(Some(Duration::from_secs(0)));
        std::thread::sleep(Duration::from_millis(1));
        assert!(tm.check().is_err());
    }
}
