//! Retry policy and conflict strategy configuration.

use std::time::Duration;

/// How a concurrent remote modification is resolved on write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictStrategy {
    /// Apply the local update unconditionally, without a conflict read.
    ClientWins,
    /// Detect conflicts but still apply the update with a refreshed
    /// stamp, logging a warning. Field-level arbitration is intentionally
    /// not performed.
    #[default]
    ServerWins,
    /// Field-by-field merge: update fields win over stale remote fields,
    /// remote fields absent from the update survive.
    Merge,
}

/// Configuration for one retryable operation.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt.
    pub max_retries: u32,
    /// Backoff before the first retry.
    pub initial_backoff: Duration,
    /// Upper bound on any single backoff delay (before jitter).
    pub max_backoff: Duration,
    /// Conflict handling; only consulted by the sync writer.
    pub conflict_strategy: ConflictStrategy,
}

impl RetryPolicy {
    /// Creates a policy with the given retry budget and default backoff.
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(10),
            conflict_strategy: ConflictStrategy::default(),
        }
    }

    /// A policy that never retries.
    pub fn no_retry() -> Self {
        Self::new(0)
    }

    /// Sets the initial backoff.
    #[must_use]
    pub fn with_initial_backoff(mut self, delay: Duration) -> Self {
        self.initial_backoff = delay;
        self
    }

    /// Sets the backoff cap.
    #[must_use]
    pub fn with_max_backoff(mut self, delay: Duration) -> Self {
        self.max_backoff = delay;
        self
    }

    /// Sets the conflict strategy.
    #[must_use]
    pub fn with_conflict_strategy(mut self, strategy: ConflictStrategy) -> Self {
        self.conflict_strategy = strategy;
        self
    }

    /// The non-jittered backoff for a 0-indexed attempt:
    /// `min(initial * 2^attempt, max)`.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let exponential =
            self.initial_backoff.as_secs_f64() * 2f64.powi(attempt.min(30) as i32);
        Duration::from_secs_f64(exponential.min(self.max_backoff.as_secs_f64()))
    }

    /// The backoff for a 0-indexed attempt, with up to 10% jitter added
    /// to spread out thundering-herd retries.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.base_delay(attempt).as_secs_f64();
        Duration::from_secs_f64(base + base * 0.1 * pseudo_jitter())
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(crate::classify::DEFAULT_RETRY_CEILING)
    }
}

/// Jitter in `[0, 1)` without an RNG dependency: sub-second clock noise
/// is plenty to decorrelate concurrent retry loops.
fn pseudo_jitter() -> f64 {
    use std::time::SystemTime;
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    f64::from(nanos % 1000) / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_builder() {
        let policy = RetryPolicy::new(5)
            .with_initial_backoff(Duration::from_millis(100))
            .with_max_backoff(Duration::from_secs(2))
            .with_conflict_strategy(ConflictStrategy::Merge);

        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.initial_backoff, Duration::from_millis(100));
        assert_eq!(policy.max_backoff, Duration::from_secs(2));
        assert_eq!(policy.conflict_strategy, ConflictStrategy::Merge);
    }

    #[test]
    fn base_delay_doubles_then_caps() {
        let policy = RetryPolicy::new(10)
            .with_initial_backoff(Duration::from_millis(100))
            .with_max_backoff(Duration::from_secs(1));

        assert_eq!(policy.base_delay(0), Duration::from_millis(100));
        assert_eq!(policy.base_delay(1), Duration::from_millis(200));
        assert_eq!(policy.base_delay(2), Duration::from_millis(400));
        assert_eq!(policy.base_delay(3), Duration::from_millis(800));
        // Capped from here on.
        assert_eq!(policy.base_delay(4), Duration::from_secs(1));
        assert_eq!(policy.base_delay(20), Duration::from_secs(1));
    }

    #[test]
    fn base_delay_is_monotonic() {
        let policy = RetryPolicy::default();
        for attempt in 0..32 {
            assert!(policy.base_delay(attempt + 1) >= policy.base_delay(attempt));
        }
    }

    #[test]
    fn jittered_delay_stays_within_bounds() {
        let policy = RetryPolicy::new(10)
            .with_initial_backoff(Duration::from_millis(100))
            .with_max_backoff(Duration::from_secs(1));

        for attempt in 0..16 {
            let base = policy.base_delay(attempt);
            let jittered = policy.delay_for_attempt(attempt);
            assert!(jittered >= base);
            assert!(jittered.as_secs_f64() <= base.as_secs_f64() * 1.1 + f64::EPSILON);
        }
    }

    #[test]
    fn huge_attempt_does_not_overflow() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.base_delay(u32::MAX), policy.max_backoff);
    }
}
