//! HTTP client construction per egress endpoint

use crate::config::FetcherConfig;
use crate::HarvestError;
use reqwest::{redirect::Policy, Client, ClientBuilder, Proxy};

fn base_builder(config: &FetcherConfig) -> ClientBuilder {
    Client::builder()
        .timeout(config.request_timeout())
        .connect_timeout(config.connect_timeout())
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
}

/// Builds a client that connects directly, ignoring any system proxy settings
pub fn build_direct_client(config: &FetcherConfig) -> Result<Client, HarvestError> {
    Ok(base_builder(config).no_proxy().build()?)
}

/// Builds a client that routes every request through `proxy`
///
/// # Returns
///
/// * `Ok(Client)` - Client bound to the proxy
/// * `Err(HarvestError::InvalidProxy)` - The address is not a usable proxy URL
pub fn build_proxied_client(config: &FetcherConfig, proxy: &str) -> Result<Client, HarvestError> {
    let proxy_conf = Proxy::all(proxy).map_err(|source| HarvestError::InvalidProxy {
        address: proxy.to_string(),
        source,
    })?;

    Ok(base_builder(config).proxy(proxy_conf).build()?)
}
