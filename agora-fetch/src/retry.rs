//! Retry policy for upstream failures.

use std::time::Duration;

/// Policy for retrying requests that failed with a transient upstream status.
///
/// The delay before the first retry is `base_delay`; each subsequent retry
/// doubles it. No jitter is applied.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total number of attempts (initial try + retries).
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy with the given total attempt count.
    pub fn new(max_attempts: u32) -> Self {
        Self { max_attempts: max_attempts.max(1), base_delay: Duration::from_millis(250) }
    }

    /// Disables retries.
    pub fn no_retry() -> Self {
        Self::new(1)
    }

    /// Sets the delay before the first retry.
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Calculates the delay before the given retry (1-based).
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(1 << retry.saturating_sub(1).min(16))
    }

    /// Whether a just-classified upstream status warrants a retry.
    ///
    /// Only rate limiting (429) and server errors (>= 500) are transient;
    /// other client errors surface immediately.
    pub fn should_retry_status(&self, status: u16) -> bool {
        status == 429 || status >= 500
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_schedule_doubles_from_250ms() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for_retry(1), Duration::from_millis(250));
        assert_eq!(policy.delay_for_retry(2), Duration::from_millis(500));
        assert_eq!(policy.delay_for_retry(3), Duration::from_millis(1000));
    }

    #[test]
    fn test_retryable_statuses() {
        let policy = RetryPolicy::default();
        assert!(policy.should_retry_status(429));
        assert!(policy.should_retry_status(500));
        assert!(policy.should_retry_status(503));
        assert!(!policy.should_retry_status(404));
        assert!(!policy.should_retry_status(401));
        assert!(!policy.should_retry_status(200));
    }

    #[test]
    fn test_attempts_never_below_one() {
        assert_eq!(RetryPolicy::new(0).max_attempts, 1);
        assert_eq!(RetryPolicy::no_retry().max_attempts, 1);
    }
}
