//! Request pacing shared by every worker
//!
//! Two delays apply before each request, in this order:
//! - a random jitter so requests do not land on a fixed cadence
//! - a global minimum interval, enforced by a token bucket right before the send
//!
//! Backoff after transient failures is computed here too, but slept by the
//! retry loop so cancellation can interrupt it.

use crate::config::FetcherConfig;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::fmt;
use std::time::Duration;

/// Shared pacing state owned by the fetcher
pub struct Throttle {
    limiter: Option<DefaultDirectRateLimiter>,
    jitter: (u64, u64),
    backoff: (u64, u64),
}

impl fmt::Debug for Throttle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Throttle")
            .field("rate_limited", &self.limiter.is_some())
            .field("jitter_ms", &self.jitter)
            .field("backoff_ms", &self.backoff)
            .finish()
    }
}

impl Throttle {
    pub fn new(config: &FetcherConfig) -> Self {
        // Quota::with_period rejects a zero period; no limiter in that case
        let limiter = Quota::with_period(config.min_request_interval()).map(RateLimiter::direct);

        Self {
            limiter,
            jitter: (config.jitter_min_ms, config.jitter_max_ms),
            backoff: (config.backoff_min_ms, config.backoff_max_ms),
        }
    }

    /// Waits until the next request may be sent
    ///
    /// The limiter is taken last so that the minimum interval holds between
    /// actual sends, whatever jitter each caller drew.
    pub async fn wait(&self) {
        let jitter = self.jitter_delay();
        if !jitter.is_zero() {
            tracing::trace!("Jitter delay {:?}", jitter);
            tokio::time::sleep(jitter).await;
        }

        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }

    /// Random delay applied before every request
    pub fn jitter_delay(&self) -> Duration {
        random_between(self.jitter)
    }

    /// Random wait applied after a transient failure
    pub fn backoff_delay(&self) -> Duration {
        random_between(self.backoff)
    }
}

fn random_between((min, max): (u64, u64)) -> Duration {
    if max <= min {
        return Duration::from_millis(min);
    }
    Duration::from_millis(fastrand::u64(min..=max))
}
