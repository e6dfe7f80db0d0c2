use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Main configuration structure for Job-Harvest
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Egress proxy endpoints (e.g. "http://10.0.0.1:3128"), tried round-robin
    pub proxies: Vec<String>,
    pub fetcher: FetcherConfig,
    pub crawler: CrawlerConfig,
    pub session: SessionConfig,
    pub judge: JudgeConfig,
}

/// Retry, backoff and throttling tunables for the fetcher
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// Attempts per logical fetch, excluding the final direct fallback
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Consecutive failures after which a proxy is disabled
    #[serde(rename = "proxy-failure-threshold")]
    pub proxy_failure_threshold: u32,

    /// Whole-request timeout (milliseconds)
    #[serde(rename = "request-timeout-ms")]
    pub request_timeout_ms: u64,

    /// Connection establishment timeout (milliseconds)
    #[serde(rename = "connect-timeout-ms")]
    pub connect_timeout_ms: u64,

    /// Lower bound of the random delay before every request (milliseconds)
    #[serde(rename = "jitter-min-ms")]
    pub jitter_min_ms: u64,

    /// Upper bound of the random delay before every request (milliseconds)
    #[serde(rename = "jitter-max-ms")]
    pub jitter_max_ms: u64,

    /// Lower bound of the wait after a transient failure (milliseconds)
    #[serde(rename = "backoff-min-ms")]
    pub backoff_min_ms: u64,

    /// Upper bound of the wait after a transient failure (milliseconds)
    #[serde(rename = "backoff-max-ms")]
    pub backoff_max_ms: u64,

    /// Minimum time between any two requests across all workers (milliseconds, 0 disables)
    #[serde(rename = "min-request-interval-ms")]
    pub min_request_interval_ms: u64,
}

impl FetcherConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn min_request_interval(&self) -> Duration {
        Duration::from_millis(self.min_request_interval_ms)
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            proxy_failure_threshold: 3,
            request_timeout_ms: 30_000,
            connect_timeout_ms: 10_000,
            jitter_min_ms: 2_000,
            jitter_max_ms: 5_000,
            backoff_min_ms: 5_000,
            backoff_max_ms: 10_000,
            min_request_interval_ms: 2_000,
        }
    }
}

/// Crawl shape configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of listings to return (negative means unbounded)
    #[serde(rename = "max-num")]
    pub max_num: i64,

    /// Number of detail pages resolved concurrently
    pub concurrency: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_num: 25,
            concurrency: 1,
        }
    }
}

/// Outbound identity: cookies, user agents and extra headers
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Raw `Cookie` header value sent with every request
    pub cookie: Option<String>,

    /// User agents rotated per attempt
    #[serde(rename = "user-agents")]
    pub user_agents: Vec<String>,

    /// Extra headers sent with every request
    pub headers: BTreeMap<String, String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie: None,
            user_agents: default_user_agents(),
            headers: BTreeMap::new(),
        }
    }
}

fn default_user_agents() -> Vec<String> {
    [
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:121.0) Gecko/20100101 Firefox/121.0",
    ]
    .iter()
    .map(|ua| ua.to_string())
    .collect()
}

/// Judge post-processing configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JudgeConfig {
    /// Score at or above which a listing is recommended
    pub threshold: f64,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            threshold: crate::judge::DEFAULT_THRESHOLD,
        }
    }
}
