//! Per-job request pacing
//!
//! All outbound calls of one job go through a single `Throttle`, so the gap
//! between any two consecutive calls is at least the interval requested by
//! the caller of the later one. Time comes from the tokio clock, which tests
//! pause and advance deterministically.

use std::time::Duration;
use tokio::time::Instant;

/// Tracks when the last call of a job started
#[derive(Debug, Default)]
pub struct Throttle {
    /// Start time of the previous call
    last_request_time: Option<Instant>,

    /// Calls issued through this throttle
    request_count: u32,
}

impl Throttle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calculates the time until the next call may start
    ///
    /// Returns None if a call can be made now, or the duration to wait otherwise.
    pub fn time_until_next_request(&self, interval: Duration, now: Instant) -> Option<Duration> {
        let last = self.last_request_time?;
        let elapsed = now.duration_since(last);
        if elapsed < interval {
            Some(interval - elapsed)
        } else {
            None
        }
    }

    /// Records that a call started at `now`
    pub fn record_request(&mut self, now: Instant) {
        self.request_count += 1;
        self.last_request_time = Some(now);
    }

    /// Sleeps until `interval` has passed since the previous call, then
    /// records the new call
    pub async fn wait(&mut self, interval: Duration) {
        if let Some(wait) = self.time_until_next_request(interval, Instant::now()) {
            tracing::trace!("Throttling for {:?}", wait);
            tokio::time::sleep(wait).await;
        }
        self.record_request(Instant::now());
    }

    /// Number of calls issued so far
    pub fn request_count(&self) -> u32 {
        self.request_count
    }
}
