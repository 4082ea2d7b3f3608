//! Failure Backoff
//!
//! Exponential delay imposed before a credential check, scaled by the
//! number of consecutive failures that preceded it:
//!
//! `delay(0) = 0`, `delay(n) = (2^n - 1) * base_delay`
//!
//! With the default 500 ms base: 0, 500 ms, 1.5 s, 3.5 s, 7.5 s, ...

use std::time::Duration;

/// Default base delay
pub const BASE_DELAY: Duration = Duration::from_millis(500);

/// Backoff policy configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Delay unit multiplied by `2^n - 1`
    pub base_delay: Duration,
    /// Optional ceiling; `None` lets the delay grow without bound
    pub max_delay: Option<Duration>,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base_delay: BASE_DELAY,
            max_delay: None,
        }
    }
}

impl BackoffPolicy {
    pub fn new(base_delay: Duration, max_delay: Option<Duration>) -> Self {
        Self {
            base_delay,
            max_delay,
        }
    }

    /// Delay owed after `attempts` consecutive failures
    ///
    /// Saturates instead of overflowing for very large attempt counts.
    pub fn delay(&self, attempts: u32) -> Duration {
        if attempts == 0 {
            return Duration::ZERO;
        }

        let factor = 1u64
            .checked_shl(attempts)
            .map_or(u64::MAX, |power| power - 1);
        let base_ms = u64::try_from(self.base_delay.as_millis()).unwrap_or(u64::MAX);
        let delay = Duration::from_millis(factor.saturating_mul(base_ms));

        match self.max_delay {
            Some(max) => delay.min(max),
            None => delay,
        }
    }

    pub fn delay_ms(&self, attempts: u32) -> u64 {
        u64::try_from(self.delay(attempts).as_millis()).unwrap_or(u64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schedule() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.delay_ms(0), 0);
        assert_eq!(policy.delay_ms(1), 500);
        assert_eq!(policy.delay_ms(2), 1500);
        assert_eq!(policy.delay_ms(3), 3500);
        assert_eq!(policy.delay_ms(4), 7500);
    }

    #[test]
    fn test_custom_base() {
        let policy = BackoffPolicy::new(Duration::from_millis(10), None);
        assert_eq!(policy.delay(3), Duration::from_millis(70));
    }

    #[test]
    fn test_unbounded_by_default() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.delay_ms(20), ((1u64 << 20) - 1) * 500);
    }

    #[test]
    fn test_saturates() {
        let policy = BackoffPolicy::default();
        // 2^63 * 500 overflows u64 milliseconds
        assert_eq!(policy.delay_ms(63), u64::MAX);
        assert_eq!(policy.delay_ms(64), u64::MAX);
        assert_eq!(policy.delay_ms(u32::MAX), u64::MAX);
    }

    #[test]
    fn test_ceiling() {
        let policy = BackoffPolicy::new(BASE_DELAY, Some(Duration::from_secs(2)));
        assert_eq!(policy.delay_ms(2), 1500);
        assert_eq!(policy.delay_ms(3), 2000);
        assert_eq!(policy.delay_ms(40), 2000);
    }

    #[test]
    fn test_zero_base_means_no_delay() {
        let policy = BackoffPolicy::new(Duration::ZERO, None);
        assert_eq!(policy.delay(10), Duration::ZERO);
    }
}
