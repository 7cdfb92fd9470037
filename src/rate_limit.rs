//! Minimum spacing between speech-synthesis calls
//!
//! The synthesis provider enforces a requests-per-minute ceiling. Instead of
//! reacting to 429 responses, [`RateLimiter`] paces calls proactively: every
//! call waits until a minimum gap has elapsed since the previous one. The
//! first call never waits.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Enforces a minimum gap between consecutive calls
///
/// The gap is `60s / requests_per_minute` plus a safety buffer, so a burst of
/// sequential calls lands just under the provider's ceiling. State is a
/// single last-call timestamp, shared across clones and reset only at
/// construction.
#[derive(Clone)]
pub struct RateLimiter {
    /// Minimum delay between consecutive calls
    min_gap: Duration,
    /// When the previous call went out; None until the first call
    last_call: Arc<tokio::sync::Mutex<Option<Instant>>>,
}

impl RateLimiter {
    /// Create a limiter for the given requests-per-minute ceiling
    ///
    /// # Arguments
    ///
    /// * `requests_per_minute` - Provider ceiling; config validation rejects zero
    /// * `safety_buffer` - Extra spacing added on top of the computed gap
    ///
    /// # Examples
    ///
    /// ```
    /// use lessoncast::rate_limit::RateLimiter;
    /// use std::time::Duration;
    ///
    /// // 30 requests/minute plus a 2s buffer: one call every 4 seconds
    /// let limiter = RateLimiter::new(30, Duration::from_secs(2));
    /// assert_eq!(limiter.min_gap(), Duration::from_secs(4));
    /// ```
    #[must_use]
    pub fn new(requests_per_minute: u32, safety_buffer: Duration) -> Self {
        let rpm = requests_per_minute.max(1);
        let min_gap = Duration::from_secs_f64(60.0 / f64::from(rpm)) + safety_buffer;

        Self {
            min_gap,
            last_call: Arc::new(tokio::sync::Mutex::new(None)),
        }
    }

    /// The enforced minimum delay between consecutive calls
    #[must_use]
    pub fn min_gap(&self) -> Duration {
        self.min_gap
    }

    /// Block until the minimum gap since the previous call has elapsed
    ///
    /// The first call after construction returns immediately. The timestamp
    /// is taken after any sleep, so the gap is measured call-start to
    /// call-start under a single sequential caller.
    pub async fn wait_if_needed(&self) {
        let mut last = self.last_call.lock().await;

        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_gap {
                let wait = self.min_gap - elapsed;
                tracing::debug!(
                    wait_ms = wait.as_millis(),
                    gap_ms = self.min_gap.as_millis(),
                    "Pacing before next synthesis call"
                );
                tokio::time::sleep(wait).await;
            }
        }

        *last = Some(Instant::now());
    }
}
