//! HTTP fetching with retry, backoff and proxy rotation
//!
//! This module contains everything needed to turn a URL into a complete
//! document despite unreliable egress:
//! - Per-endpoint HTTP clients (one per proxy plus a direct client)
//! - User-agent rotation and session headers
//! - Shared request pacing (minimum interval, jitter, backoff)
//! - The retry state machine and its diagnostic attempt trail

mod attempt;
mod client;
mod identity;
mod retry;
mod throttle;

pub use attempt::{AttemptOutcome, FailureReport, FetchAttempt, FetchError};
pub use client::{build_direct_client, build_proxied_client};
pub use identity::Identity;
pub use retry::{Document, RetryingFetcher};
pub use throttle::Throttle;
