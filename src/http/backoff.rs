use std::time::Duration;

/// Bounded exponential backoff for rate-limited (HTTP 429) responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Delay before the first retry
    pub base: Duration,
    /// Upper bound for any single wait, including provider hints
    pub max_delay: Duration,
    /// Number of consecutive backoffs allowed before giving up
    pub max_attempts: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            max_attempts: 5,
        }
    }
}

impl BackoffPolicy {
    pub fn new(base: Duration, max_delay: Duration, max_attempts: u32) -> Self {
        Self {
            base,
            max_delay,
            max_attempts,
        }
    }

    /// Scheduled delay for the zero-based `attempt`: `base * 2^attempt`, capped.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        std::cmp::min(self.base.saturating_mul(factor), self.max_delay)
    }

    /// Delay to actually wait: the provider hint when present, else the schedule.
    pub fn wait_for(&self, attempt: u32, hint: Option<Duration>) -> Duration {
        match hint {
            Some(hint) => std::cmp::min(hint, self.max_delay),
            None => self.delay_for(attempt),
        }
    }

    /// Sum of the full schedule. Without provider hints this is the total wait
    /// before [`crate::Error::RateLimitExceeded`]; with hints each wait is still
    /// at most `max_delay`.
    pub fn schedule_total(&self) -> Duration {
        (0..self.max_attempts)
            .map(|attempt| self.delay_for(attempt))
            .sum()
    }
}
