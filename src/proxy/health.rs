//! Optional network check for proxy health

use crate::proxy::{ProxyHandle, ProxyPool};
use reqwest::RequestBuilder;

impl ProxyPool {
    /// Checks a proxy by sending a prepared request through it
    ///
    /// This is the only operation of the pool that performs I/O. The request
    /// must already be bound to the proxy's client and carry the session
    /// identity, so the target sees the same traffic a crawl would send. The
    /// outcome is reported back to the pool exactly like a regular fetch, so a
    /// failed check counts towards disabling the proxy.
    ///
    /// # Arguments
    ///
    /// * `handle` - The proxy being checked
    /// * `request` - A GET expected to answer with a 2xx status
    ///
    /// # Returns
    ///
    /// `true` if the request answered with a success status
    pub async fn health_check(&self, handle: &ProxyHandle, request: RequestBuilder) -> bool {
        let healthy = match request.send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                tracing::debug!(
                    "Health check via {} answered HTTP {}",
                    handle.address(),
                    response.status().as_u16()
                );
                false
            }
            Err(e) => {
                tracing::debug!("Health check via {} failed: {}", handle.address(), e);
                false
            }
        };

        if healthy {
            self.report_success(handle);
        } else {
            self.report_failure(handle);
        }

        healthy
    }
}
