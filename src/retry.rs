//! Retry handling for outbound provider calls
//!
//! Every external call goes through [`with_retry`], which classifies failures
//! via [`IsRetryable`] and sleeps between attempts. The schedule is a fixed
//! base delay on the first retry and three times the base delay on every
//! later retry. Rate-limit and quota errors ignore that schedule: they wait
//! for whatever the provider suggested, or [`RATE_LIMIT_FLOOR`] when the
//! response carried no hint.
//!
//! # Example
//!
//! ```no_run
//! use lessoncast::error::ProviderError;
//! use lessoncast::retry::{RetryPolicy, with_retry};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), ProviderError> {
//! let policy = RetryPolicy::new(3, Duration::from_secs(1));
//! let passage = with_retry(&policy, "text.generate", || async {
//!     // Your provider call here
//!     Ok::<_, ProviderError>("passage text".to_string())
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```

use crate::error::{Error, ProviderError, ProviderErrorKind};
use std::future::Future;
use std::time::Duration;

/// Minimum wait after a rate-limit or quota rejection that carried no
/// provider-suggested delay. Free-tier quotas typically replenish on a
/// 30-second window, so anything shorter burns an attempt for nothing.
pub const RATE_LIMIT_FLOOR: Duration = Duration::from_secs(35);

/// Attempt count and delay schedule for retried operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Number of retries after the initial attempt
    pub max_retries: u32,
    /// Delay before the first retry; later retries wait three times this
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Create a policy with the given retry count and base delay
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Delay before the given retry (1-based), ignoring provider hints
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            self.base_delay
        } else {
            self.base_delay * 3
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

/// Trait for errors that can be classified as retryable or not
///
/// Transient failures (server busy, timeouts, dropped connections) should
/// return `true`. Permanent failures (bad credentials, malformed requests,
/// unparseable responses) should return `false`.
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;

    /// Returns true when the provider rejected the call for rate or quota reasons
    fn is_rate_limited(&self) -> bool {
        false
    }

    /// Wait the provider suggested before the next attempt, when the
    /// response carried one
    fn retry_after(&self) -> Option<Duration> {
        None
    }

    /// Attach the failing operation's name to the error for reporting
    fn tag_operation(self, _operation: &str) -> Self
    where
        Self: Sized,
    {
        self
    }
}

impl IsRetryable for ProviderErrorKind {
    fn is_retryable(&self) -> bool {
        match self {
            // The provider refused the call outright; retrying repeats the refusal
            ProviderErrorKind::Unauthorized
            | ProviderErrorKind::InvalidRequest
            | ProviderErrorKind::NotFound
            | ProviderErrorKind::InvalidResponse => false,
            // Transient conditions that clear on their own
            ProviderErrorKind::RateLimited
            | ProviderErrorKind::QuotaExhausted
            | ProviderErrorKind::Unavailable
            | ProviderErrorKind::Timeout
            | ProviderErrorKind::Network => true,
        }
    }

    fn is_rate_limited(&self) -> bool {
        matches!(
            self,
            ProviderErrorKind::RateLimited | ProviderErrorKind::QuotaExhausted
        )
    }
}

impl IsRetryable for ProviderError {
    fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    fn is_rate_limited(&self) -> bool {
        self.kind.is_rate_limited()
    }

    fn retry_after(&self) -> Option<Duration> {
        self.retry_after
    }

    fn tag_operation(self, operation: &str) -> Self {
        if self.operation.is_some() {
            self
        } else {
            self.with_operation(operation)
        }
    }
}

/// Implementation of IsRetryable for the top-level Error type
impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            Error::Provider(e) => e.is_retryable(),
            // Transport failures before a status was observed
            Error::Network(e) => e.is_timeout() || e.is_connect(),
            // Everything else is an application-level failure; retrying repeats it
            _ => false,
        }
    }

    fn is_rate_limited(&self) -> bool {
        match self {
            Error::Provider(e) => e.is_rate_limited(),
            _ => false,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            Error::Provider(e) => e.retry_after,
            _ => None,
        }
    }

    fn tag_operation(self, operation: &str) -> Self {
        match self {
            Error::Provider(e) => Error::Provider(e.tag_operation(operation)),
            other => other,
        }
    }
}

/// Execute an async operation under a retry policy
///
/// Runs `op` up to `policy.max_retries + 1` times. Non-retryable errors
/// propagate immediately. Retryable errors sleep per the policy schedule,
/// except rate-limit and quota errors, which wait for the provider's
/// suggested delay or [`RATE_LIMIT_FLOOR`] without one. The last error after
/// exhaustion is returned tagged with `operation`.
///
/// # Arguments
///
/// * `policy` - Attempt count and delay schedule
/// * `operation` - Name of the call, used in logs and attached to the final error
/// * `op` - Async closure returning Result<T, E> where E implements IsRetryable
pub async fn with_retry<F, Fut, T, E>(policy: &RetryPolicy, operation: &str, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let mut attempt = 0u32;

    loop {
        match op().await {
            Ok(result) => {
                if attempt > 0 {
                    tracing::info!(
                        operation = operation,
                        attempts = attempt + 1,
                        "Operation succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(e) if e.is_retryable() && attempt < policy.max_retries => {
                attempt += 1;

                let delay = if e.is_rate_limited() {
                    e.retry_after().unwrap_or(RATE_LIMIT_FLOOR)
                } else {
                    policy.delay_for_attempt(attempt)
                };

                tracing::warn!(
                    operation = operation,
                    error = %e,
                    attempt = attempt,
                    max_retries = policy.max_retries,
                    delay_ms = delay.as_millis(),
                    "Operation failed, retrying"
                );

                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                if e.is_retryable() {
                    tracing::error!(
                        operation = operation,
                        error = %e,
                        attempts = attempt + 1,
                        "Operation failed after all retry attempts exhausted"
                    );
                } else {
                    tracing::error!(
                        operation = operation,
                        error = %e,
                        "Operation failed with non-retryable error"
                    );
                }
                return Err(e.tag_operation(operation));
            }
        }
    }
}
