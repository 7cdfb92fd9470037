//! Cooperative execution-time budget.
//!
//! A run gets a wall-clock ceiling minus a safety buffer. Before each series
//! the coordinator asks whether the projected work still fits; if not, the
//! series is skipped. In-flight calls are never interrupted.

use std::time::Duration;
use tokio::time::Instant;

/// Wall-clock budget for one run
#[derive(Clone, Debug)]
pub struct TimeBudget {
    started: Instant,
    ceiling: Duration,
    buffer: Duration,
}

impl TimeBudget {
    /// Start the clock with the given ceiling and safety buffer
    pub fn start(ceiling: Duration, buffer: Duration) -> Self {
        Self {
            started: Instant::now(),
            ceiling,
            buffer,
        }
    }

    /// Wall-clock time consumed so far
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Usable time left: ceiling minus buffer minus elapsed, floored at zero
    pub fn remaining(&self) -> Duration {
        self.ceiling
            .saturating_sub(self.buffer)
            .saturating_sub(self.elapsed())
    }

    /// Whether `projected` work still fits in the budget
    ///
    /// Returns a human-readable shortfall description when it does not, used
    /// verbatim in the skip report.
    pub fn admit(&self, projected: Duration) -> Result<(), String> {
        let remaining = self.remaining();
        if projected <= remaining {
            Ok(())
        } else {
            Err(format!(
                "projected {}s, {}s remaining of {}s ceiling",
                projected.as_secs(),
                remaining.as_secs(),
                self.ceiling.as_secs(),
            ))
        }
    }
}
