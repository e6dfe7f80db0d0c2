//! Job-Harvest: resilient job-listing retrieval
//!
//! This crate turns a job search-results URL into a bounded, ordered set of
//! structured listing records. It survives flaky proxies, rate limiting and
//! transient network errors by rotating egress endpoints, backing off and
//! degrading individual records instead of failing the batch.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod fetcher;
pub mod format;
pub mod judge;
pub mod matcher;
pub mod output;
pub mod proxy;

use thiserror::Error;

/// Main error type for Job-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Crawl failed: {0}")]
    Crawl(#[from] CrawlError),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Invalid proxy address {address}: {source}")]
    InvalidProxy {
        address: String,
        source: reqwest::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Terminal failures of a crawl
///
/// Only the search-results page can fail a crawl; every per-listing problem
/// degrades that listing instead.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Search page could not be fetched: {0}")]
    SearchPage(#[source] fetcher::FetchError),

    #[error("Invalid search URL {url}: {source}")]
    InvalidUrl {
        url: String,
        source: ::url::ParseError,
    },
}

impl CrawlError {
    /// Returns the attempt trail of the failed search fetch, if any
    pub fn report(&self) -> Option<&fetcher::FailureReport> {
        match self {
            CrawlError::SearchPage(e) => e.report(),
            CrawlError::InvalidUrl { .. } => None,
        }
    }
}

/// Result type alias for Job-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlOrchestrator, CrawlResult};
pub use extract::{LinkedInExtractor, ListingExtractor, ListingRecord, RecordStatus};
pub use fetcher::{Document, FetchError, RetryingFetcher};
pub use format::describe;
pub use proxy::{ProxyHandle, ProxyPool};
