//! Time source used for token expiry checks and rate-limit backoff.

use std::{future::Future, time::Duration};

use chrono::{DateTime, Utc};

/// Source of the current time and of blocking waits.
///
/// Token expiry and backoff both go through this trait so tests can observe
/// how long the fetcher would have slept without actually sleeping.
pub trait Clock: Send + Sync {
    /// Returns the current UTC timestamp.
    fn now(&self) -> DateTime<Utc>;

    /// Suspends the caller for `duration`.
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;

    /// Current time as epoch seconds.
    fn epoch(&self) -> i64 {
        self.now().timestamp()
    }
}

/// Wall clock backed by `chrono` and `tokio::time`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
