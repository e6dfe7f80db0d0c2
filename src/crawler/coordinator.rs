//! Crawl orchestrator - two-phase listing retrieval
//!
//! This module drives a crawl from a search-results URL to finished records:
//! - Fetching the search page (the only failure that aborts a crawl)
//! - Enumerating and truncating the listing cards
//! - Resolving detail pages with a bounded worker pool
//! - Reassembling results in source order and honoring cancellation

use crate::config::{Config, CrawlerConfig};
use crate::extract::{LinkedInExtractor, ListingExtractor, ListingRecord, RecordStatus};
use crate::fetcher::RetryingFetcher;
use crate::{CrawlError, HarvestError};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Records produced by one crawl, in source-page order
#[derive(Debug, Clone, Default)]
pub struct CrawlResult {
    pub records: Vec<ListingRecord>,

    /// Set when the crawl was cut short by its cancellation token
    pub cancelled: bool,
}

impl CrawlResult {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records in the given state
    pub fn count_by_status(&self, status: RecordStatus) -> usize {
        self.records.iter().filter(|r| r.status == status).count()
    }
}

type DetailOutcome = (usize, Option<ListingRecord>);

/// Main crawl orchestrator structure
pub struct CrawlOrchestrator {
    fetcher: Arc<RetryingFetcher>,
    extractor: Arc<dyn ListingExtractor>,
    concurrency: usize,
}

impl CrawlOrchestrator {
    /// Creates a new orchestrator
    ///
    /// # Arguments
    ///
    /// * `fetcher` - The fetcher used for every request; owned by the orchestrator
    /// * `extractor` - Source-specific extraction
    /// * `config` - Crawl shape settings (detail-phase concurrency)
    pub fn new(
        fetcher: RetryingFetcher,
        extractor: Arc<dyn ListingExtractor>,
        config: &CrawlerConfig,
    ) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            extractor,
            concurrency: config.concurrency.max(1),
        }
    }

    /// Builds an orchestrator for LinkedIn search pages from a full configuration
    pub fn from_config(config: &Config) -> Result<Self, HarvestError> {
        let fetcher = RetryingFetcher::from_config(config)?;
        Ok(Self::new(
            fetcher,
            Arc::new(LinkedInExtractor::new()),
            &config.crawler,
        ))
    }

    /// The fetcher, for inspecting proxy health after a crawl
    pub fn fetcher(&self) -> &RetryingFetcher {
        &self.fetcher
    }

    /// Crawls a search-results URL
    ///
    /// # Arguments
    ///
    /// * `search_url` - The search-results page
    /// * `max_num` - Maximum number of records; negative means unbounded
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlResult)` - Records in source order; per-item failures are degraded, not dropped
    /// * `Err(CrawlError)` - The search page itself could not be retrieved
    pub async fn crawl(&self, search_url: &str, max_num: i64) -> Result<CrawlResult, CrawlError> {
        self.crawl_with_cancel(search_url, max_num, CancellationToken::new())
            .await
    }

    /// Crawls a search-results URL until done or until `cancel` fires
    ///
    /// On cancellation, in-flight fetches are aborted and the records finished
    /// so far are returned (in source order) with `cancelled` set.
    pub async fn crawl_with_cancel(
        &self,
        search_url: &str,
        max_num: i64,
        cancel: CancellationToken,
    ) -> Result<CrawlResult, CrawlError> {
        if max_num == 0 {
            tracing::info!("max_num is 0, nothing to crawl");
            return Ok(CrawlResult::default());
        }

        let base = Url::parse(search_url).map_err(|source| CrawlError::InvalidUrl {
            url: search_url.to_string(),
            source,
        })?;

        let start_time = Instant::now();
        tracing::info!("Fetching search page {}", search_url);

        let document = match self.fetcher.fetch_with_cancel(search_url, &cancel).await {
            Ok(document) => document,
            Err(e) if e.is_cancelled() => {
                tracing::info!("Crawl cancelled while fetching the search page");
                return Ok(CrawlResult {
                    records: Vec::new(),
                    cancelled: true,
                });
            }
            Err(e) => {
                tracing::error!("Search page fetch failed: {}", e);
                return Err(CrawlError::SearchPage(e));
            }
        };

        // Resolve relative links against where redirects actually landed
        let base = Url::parse(&document.url).unwrap_or(base);

        let mut cards = self.extractor.extract_cards(&document.body);
        tracing::info!("Found {} listing cards", cards.len());

        if max_num > 0 {
            cards.truncate(usize::try_from(max_num).unwrap_or(usize::MAX));
        }

        let summaries: Vec<ListingRecord> = cards
            .iter()
            .map(|card| self.extractor.extract_summary(card, &base))
            .collect();

        let failed = summaries
            .iter()
            .filter(|r| r.status == RecordStatus::ExtractionFailed)
            .count();
        if failed > 0 {
            tracing::warn!("{} of {} cards could not be read", failed, summaries.len());
        }

        let result = self.resolve_details(summaries, &cancel).await;

        tracing::info!(
            "Crawl finished: {} records ({} complete) in {:?}{}",
            result.len(),
            result.count_by_status(RecordStatus::Complete),
            start_time.elapsed(),
            if result.cancelled { ", cancelled" } else { "" }
        );

        Ok(result)
    }

    /// Fetches every detail page with at most `concurrency` requests in flight
    ///
    /// Workers are dispatched in source order and their results are slotted
    /// by index, so completion order never affects the output order.
    async fn resolve_details(
        &self,
        summaries: Vec<ListingRecord>,
        cancel: &CancellationToken,
    ) -> CrawlResult {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks: JoinSet<DetailOutcome> = JoinSet::new();
        let mut slots: Vec<Option<ListingRecord>> = vec![None; summaries.len()];
        let mut cancelled = false;

        for (index, summary) in summaries.iter().cloned().enumerate() {
            let permit = tokio::select! {
                permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
                _ = cancel.cancelled() => {
                    cancelled = true;
                    break;
                }
            };

            let fetcher = Arc::clone(&self.fetcher);
            let extractor = Arc::clone(&self.extractor);
            let cancel = cancel.clone();

            tasks.spawn(async move {
                let _permit = permit;
                let record = resolve_detail(&fetcher, extractor.as_ref(), summary, &cancel).await;
                (index, record)
            });
        }

        if !cancelled {
            tokio::select! {
                _ = drain(&mut tasks, &mut slots) => {},
                _ = cancel.cancelled() => cancelled = true,
            }
        }

        if cancelled {
            tasks.abort_all();
        }
        drain(&mut tasks, &mut slots).await;

        if cancelled || cancel.is_cancelled() {
            return CrawlResult {
                records: slots.into_iter().flatten().collect(),
                cancelled: true,
            };
        }

        // A worker that died without reporting still yields its summary
        let records = slots
            .into_iter()
            .zip(summaries)
            .map(|(slot, summary)| slot.unwrap_or(summary))
            .collect();

        CrawlResult {
            records,
            cancelled: false,
        }
    }
}

/// Collects finished worker results into their slots
async fn drain(tasks: &mut JoinSet<DetailOutcome>, slots: &mut [Option<ListingRecord>]) {
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, Some(record))) => slots[index] = Some(record),
            Ok((_, None)) => {}
            Err(e) if e.is_cancelled() => {}
            Err(e) => tracing::error!("Detail worker failed: {}", e),
        }
    }
}

/// Runs the detail phase for one record
///
/// Returns `None` only when cancelled. A failed fetch keeps the record
/// `Partial` with the sentinel description.
async fn resolve_detail(
    fetcher: &RetryingFetcher,
    extractor: &dyn ListingExtractor,
    summary: ListingRecord,
    cancel: &CancellationToken,
) -> Option<ListingRecord> {
    if !summary.has_detail_link() {
        return Some(summary);
    }

    match fetcher.fetch_with_cancel(&summary.job_link, cancel).await {
        Ok(document) => {
            let description = extractor.extract_detail(&document.body);
            Some(summary.complete(description))
        }
        Err(e) if e.is_cancelled() => None,
        Err(e) => {
            tracing::warn!(
                "Detail fetch failed for {}, keeping summary only: {}",
                summary.job_link,
                e
            );
            Some(summary)
        }
    }
}
