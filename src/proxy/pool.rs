use std::sync::{Mutex, MutexGuard, PoisonError};

/// Consecutive failures after which a proxy is disabled by default
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;

/// Health state of a single egress proxy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRecord {
    /// Proxy endpoint (e.g. "http://10.0.0.1:3128")
    pub address: String,

    /// Failures since the last success
    pub consecutive_failures: u32,

    /// Disabled proxies are never selected again by this pool
    pub disabled: bool,
}

impl ProxyRecord {
    fn new(address: String) -> Self {
        Self {
            address,
            consecutive_failures: 0,
            disabled: false,
        }
    }
}

/// A proxy selected for one attempt
///
/// Handed back to the pool to report the outcome of that attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyHandle {
    pub(crate) index: usize,
    address: String,
}

impl ProxyHandle {
    /// The proxy endpoint address
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Position of the proxy in the pool
    pub fn index(&self) -> usize {
        self.index
    }
}

#[derive(Debug)]
struct PoolState {
    records: Vec<ProxyRecord>,
    /// Index the next round-robin scan starts from
    cursor: usize,
}

/// Pool of egress proxies with round-robin selection and failure tracking
///
/// All state sits behind a single mutex and every operation is one critical
/// section, so concurrent workers can select and report without corrupting
/// the cursor or double counting a failure.
#[derive(Debug)]
pub struct ProxyPool {
    state: Mutex<PoolState>,
    failure_threshold: u32,
}

impl ProxyPool {
    /// Creates a pool from a list of proxy addresses
    ///
    /// # Arguments
    ///
    /// * `addresses` - Proxy endpoints, in rotation order
    /// * `failure_threshold` - Consecutive failures before a proxy is disabled (minimum 1)
    pub fn new<I, S>(addresses: I, failure_threshold: u32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let records = addresses
            .into_iter()
            .map(|a| ProxyRecord::new(a.into()))
            .collect();

        Self {
            state: Mutex::new(PoolState { records, cursor: 0 }),
            failure_threshold: failure_threshold.max(1),
        }
    }

    /// Creates a pool with no proxies; every selection falls back to a direct connection
    pub fn empty() -> Self {
        Self::new(Vec::<String>::new(), DEFAULT_FAILURE_THRESHOLD)
    }

    fn state(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Selects the next enabled proxy in round-robin order
    ///
    /// # Returns
    ///
    /// * `Some(ProxyHandle)` - The proxy to use for the next attempt
    /// * `None` - No proxy is enabled; use a direct connection
    pub fn next(&self) -> Option<ProxyHandle> {
        let mut state = self.state();
        let len = state.records.len();

        for offset in 0..len {
            let index = (state.cursor + offset) % len;
            if !state.records[index].disabled {
                state.cursor = (index + 1) % len;
                return Some(ProxyHandle {
                    index,
                    address: state.records[index].address.clone(),
                });
            }
        }

        None
    }

    /// Records a successful request through a proxy
    ///
    /// Resets its failure counter. A disabled proxy stays disabled.
    pub fn report_success(&self, handle: &ProxyHandle) {
        let mut state = self.state();
        if let Some(record) = state.records.get_mut(handle.index) {
            record.consecutive_failures = 0;
        }
    }

    /// Records a failed request through a proxy
    ///
    /// # Returns
    ///
    /// `true` only on the call that disabled the proxy. Failures reported
    /// against an already-disabled proxy are ignored.
    pub fn report_failure(&self, handle: &ProxyHandle) -> bool {
        let mut state = self.state();
        let threshold = self.failure_threshold;

        let Some(record) = state.records.get_mut(handle.index) else {
            return false;
        };

        if record.disabled {
            return false;
        }

        record.consecutive_failures += 1;
        if record.consecutive_failures >= threshold {
            record.disabled = true;
            tracing::warn!(
                "Disabling proxy {} after {} consecutive failures",
                record.address,
                record.consecutive_failures
            );
            return true;
        }

        tracing::debug!(
            "Proxy {} failure {}/{}",
            record.address,
            record.consecutive_failures,
            threshold
        );
        false
    }

    /// Re-enables every proxy and clears all failure counters
    pub fn reset(&self) {
        let mut state = self.state();
        for record in state.records.iter_mut() {
            record.consecutive_failures = 0;
            record.disabled = false;
        }
        state.cursor = 0;
    }

    /// Total number of proxies, enabled or not
    pub fn len(&self) -> usize {
        self.state().records.len()
    }

    /// Returns whether the pool was built without proxies
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of proxies still eligible for selection
    pub fn enabled_count(&self) -> usize {
        self.state().records.iter().filter(|r| !r.disabled).count()
    }

    /// Handles to every enabled proxy, in pool order
    ///
    /// Does not move the round-robin cursor.
    pub fn enabled(&self) -> Vec<ProxyHandle> {
        self.state()
            .records
            .iter()
            .enumerate()
            .filter(|(_, r)| !r.disabled)
            .map(|(index, r)| ProxyHandle {
                index,
                address: r.address.clone(),
            })
            .collect()
    }

    /// Snapshot of every proxy record, for diagnostics
    pub fn records(&self) -> Vec<ProxyRecord> {
        self.state().records.clone()
    }

    /// The configured failure threshold
    pub fn failure_threshold(&self) -> u32 {
        self.failure_threshold
    }
}
