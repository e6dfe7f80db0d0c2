//! Proxy pool for egress rotation
//!
//! This module owns the set of egress proxies and their health state:
//! - Round-robin selection over the proxies that are still enabled
//! - Consecutive-failure tracking and terminal disabling
//! - An optional network check of a proxy before relying on it

mod health;
mod pool;

pub use pool::{ProxyHandle, ProxyPool, ProxyRecord, DEFAULT_FAILURE_THRESHOLD};
