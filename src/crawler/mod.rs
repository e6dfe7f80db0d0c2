//! Crawler module for search-page and detail-page retrieval
//!
//! This module contains the crawl orchestration logic, including:
//! - Search page retrieval and card enumeration
//! - Bounded-concurrency detail fetching
//! - Order-preserving result assembly and cancellation

mod coordinator;

pub use coordinator::{CrawlOrchestrator, CrawlResult};

use crate::config::Config;
use crate::HarvestError;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the proxy pool and per-endpoint HTTP clients
/// 2. Fetch the search page and enumerate its cards
/// 3. Fetch every detail page with bounded concurrency
/// 4. Return the records in source order
///
/// # Arguments
///
/// * `config` - The harvester configuration
/// * `search_url` - The search-results page to crawl
/// * `max_num` - Maximum number of records; negative means unbounded
///
/// # Returns
///
/// * `Ok(CrawlResult)` - Crawl completed
/// * `Err(HarvestError)` - Setup failed or the search page could not be fetched
pub async fn crawl(
    config: &Config,
    search_url: &str,
    max_num: i64,
) -> Result<CrawlResult, HarvestError> {
    let orchestrator = CrawlOrchestrator::from_config(config)?;
    Ok(orchestrator.crawl(search_url, max_num).await?)
}
