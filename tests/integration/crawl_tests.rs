//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end: search page, cards, detail pages,
//! proxy failover and cancellation.

use job_harvest::config::{load_config, Config, CrawlerConfig, FetcherConfig};
use job_harvest::crawler::{crawl, CrawlOrchestrator};
use job_harvest::extract::{
    LinkedInExtractor, ListingExtractor, ListingRecord, RecordStatus, EXTRACTION_ERROR,
    NOT_SPECIFIED,
};
use job_harvest::fetcher::{AttemptOutcome, FetchError, RetryingFetcher};
use job_harvest::CrawlError;
use std::io::Write;
use std::net::TcpListener;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration with no pacing delays
fn create_test_config(proxies: Vec<String>, max_retries: u32, concurrency: usize) -> Config {
    Config {
        proxies,
        fetcher: FetcherConfig {
            max_retries,
            proxy_failure_threshold: 1,
            request_timeout_ms: 5_000,
            connect_timeout_ms: 1_000,
            jitter_min_ms: 0,
            jitter_max_ms: 0,
            backoff_min_ms: 0,
            backoff_max_ms: 0,
            min_request_interval_ms: 0,
        },
        crawler: CrawlerConfig {
            max_num: -1,
            concurrency,
        },
        ..Config::default()
    }
}

/// An address nothing listens on
fn dead_proxy() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
    let port = listener.local_addr().expect("No local address").port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

fn card(id: u32) -> String {
    format!(
        r#"<li><div class="base-card" data-entity-urn="urn:li:jobPosting:{id}" data-tracking-id="trk-{id}">
             <a class="base-card__full-link" href="/jobs/view/{id}"></a>
             <h3 class="base-search-card__title">Job {id}</h3>
             <h4 class="base-search-card__subtitle"><a href="/company/acme-{id}">Acme {id}</a></h4>
             <span class="job-search-card__location">City {id}</span>
             <time datetime="2024-05-0{id}">{id} days ago</time>
           </div></li>"#
    )
}

fn search_page(ids: &[u32]) -> String {
    let cards: String = ids.iter().map(|id| card(*id)).collect();
    format!("<html><body><ul class=\"jobs-search__results-list\">{}</ul></body></html>", cards)
}

fn detail_page(id: u32) -> String {
    format!(
        r#"<html><body><div class="show-more-less-html__markup"><p>Description of job {}</p></div></body></html>"#,
        id
    )
}

async fn mount_search(server: &MockServer, ids: &[u32]) {
    Mock::given(method("GET"))
        .and(path("/jobs/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string(search_page(ids)))
        .mount(server)
        .await;
}

async fn mount_detail(server: &MockServer, id: u32, delay: Duration) {
    Mock::given(method("GET"))
        .and(path(format!("/jobs/view/{}", id)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(detail_page(id))
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

fn search_url(server: &MockServer) -> String {
    format!("{}/jobs/search", server.uri())
}

#[tokio::test]
async fn test_full_crawl_bounded_by_max_num() {
    let server = MockServer::start().await;
    mount_search(&server, &[1, 2, 3]).await;
    mount_detail(&server, 1, Duration::ZERO).await;
    mount_detail(&server, 2, Duration::ZERO).await;

    // The third listing is beyond max_num and must never be requested
    Mock::given(method("GET"))
        .and(path("/jobs/view/3"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = create_test_config(vec![], 3, 1);
    let result = crawl(&config, &search_url(&server), 2)
        .await
        .expect("Crawl failed");

    assert!(!result.cancelled);
    assert_eq!(result.len(), 2);

    let first = &result.records[0];
    assert_eq!(first.title, "Job 1");
    assert_eq!(first.company, "Acme 1");
    assert_eq!(first.company_link, format!("{}/company/acme-1", server.uri()));
    assert_eq!(first.job_link, format!("{}/jobs/view/1", server.uri()));
    assert_eq!(first.location, "City 1");
    assert_eq!(first.posted_on, "2024-05-01");
    assert_eq!(first.job_id, "1");
    assert_eq!(first.tracking_id, "trk-1");
    assert_eq!(first.full_description, "Description of job 1");
    assert_eq!(first.status, RecordStatus::Complete);

    assert_eq!(result.records[1].title, "Job 2");
    assert_eq!(result.count_by_status(RecordStatus::Complete), 2);
}

#[tokio::test]
async fn test_order_preserved_under_concurrency() {
    let server = MockServer::start().await;
    mount_search(&server, &[1, 2, 3]).await;

    // Later listings finish first
    mount_detail(&server, 1, Duration::from_millis(400)).await;
    mount_detail(&server, 2, Duration::from_millis(200)).await;
    mount_detail(&server, 3, Duration::ZERO).await;

    let config = create_test_config(vec![], 3, 3);
    let orchestrator = CrawlOrchestrator::from_config(&config).expect("Failed to build");
    let result = orchestrator
        .crawl(&search_url(&server), -1)
        .await
        .expect("Crawl failed");

    let titles: Vec<&str> = result.records.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Job 1", "Job 2", "Job 3"]);
    assert!(result
        .records
        .iter()
        .all(|r| r.status == RecordStatus::Complete));
}

#[tokio::test]
async fn test_failed_detail_page_degrades_single_record() {
    let server = MockServer::start().await;
    mount_search(&server, &[1, 2, 3]).await;
    mount_detail(&server, 1, Duration::ZERO).await;
    mount_detail(&server, 3, Duration::ZERO).await;

    Mock::given(method("GET"))
        .and(path("/jobs/view/2"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let config = create_test_config(vec![], 2, 1);
    let result = crawl(&config, &search_url(&server), 25)
        .await
        .expect("Crawl failed");

    assert_eq!(result.len(), 3);
    assert_eq!(result.records[0].status, RecordStatus::Complete);
    assert_eq!(result.records[2].status, RecordStatus::Complete);

    let degraded = &result.records[1];
    assert_eq!(degraded.title, "Job 2");
    assert_eq!(degraded.status, RecordStatus::Partial);
    assert_eq!(degraded.full_description, NOT_SPECIFIED);
}

#[tokio::test]
async fn test_missing_detail_page_is_not_retried() {
    let server = MockServer::start().await;
    mount_search(&server, &[1]).await;

    Mock::given(method("GET"))
        .and(path("/jobs/view/1"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(vec![], 3, 1);
    let result = crawl(&config, &search_url(&server), 5)
        .await
        .expect("Crawl failed");

    assert_eq!(result.len(), 1);
    assert_eq!(result.records[0].status, RecordStatus::Partial);
    assert_eq!(result.records[0].full_description, NOT_SPECIFIED);
}

/// Delegates to the LinkedIn extractor but blanks out the second card
struct BlankSecondCard(LinkedInExtractor);

impl ListingExtractor for BlankSecondCard {
    fn extract_cards(&self, document: &str) -> Vec<String> {
        let mut cards = self.0.extract_cards(document);
        if let Some(card) = cards.get_mut(1) {
            card.clear();
        }
        cards
    }

    fn extract_summary(&self, card: &str, base: &Url) -> ListingRecord {
        self.0.extract_summary(card, base)
    }

    fn extract_detail(&self, document: &str) -> String {
        self.0.extract_detail(document)
    }
}

#[tokio::test]
async fn test_unreadable_card_is_kept_in_position() {
    let server = MockServer::start().await;
    mount_search(&server, &[1, 2, 3]).await;
    mount_detail(&server, 1, Duration::ZERO).await;
    mount_detail(&server, 3, Duration::ZERO).await;

    Mock::given(method("GET"))
        .and(path("/jobs/view/2"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = create_test_config(vec![], 1, 1);
    let fetcher = RetryingFetcher::from_config(&config).expect("Failed to build");
    let orchestrator = CrawlOrchestrator::new(
        fetcher,
        Arc::new(BlankSecondCard(LinkedInExtractor::new())),
        &config.crawler,
    );
    let result = orchestrator
        .crawl(&search_url(&server), -1)
        .await
        .expect("Crawl failed");

    assert_eq!(result.len(), 3);
    assert_eq!(result.records[0].status, RecordStatus::Complete);
    assert_eq!(result.records[1].status, RecordStatus::ExtractionFailed);
    assert_eq!(result.records[1].title, EXTRACTION_ERROR);
    assert_eq!(result.records[1].full_description, NOT_SPECIFIED);
    assert_eq!(result.records[2].title, "Job 3");
}

#[tokio::test]
async fn test_card_without_link_skips_detail_phase() {
    let server = MockServer::start().await;
    let page = format!(
        "<html><body>{}<div class=\"base-card\"><h3 class=\"base-search-card__title\">No link</h3></div></body></html>",
        card(1)
    );
    Mock::given(method("GET"))
        .and(path("/jobs/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page))
        .mount(&server)
        .await;
    mount_detail(&server, 1, Duration::ZERO).await;

    let config = create_test_config(vec![], 1, 1);
    let result = crawl(&config, &search_url(&server), -1)
        .await
        .expect("Crawl failed");

    assert_eq!(result.len(), 2);
    let unlinked = &result.records[1];
    assert_eq!(unlinked.title, "No link");
    assert_eq!(unlinked.job_link, NOT_SPECIFIED);
    assert_eq!(unlinked.status, RecordStatus::Partial);

    // Search page plus one detail page
    let requests = server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 2);
}

#[tokio::test]
async fn test_dead_proxies_fall_back_to_direct() {
    let server = MockServer::start().await;
    mount_search(&server, &[1]).await;
    mount_detail(&server, 1, Duration::ZERO).await;

    let config = create_test_config(vec![dead_proxy(), dead_proxy()], 2, 1);
    let orchestrator = CrawlOrchestrator::from_config(&config).expect("Failed to build");
    let result = orchestrator
        .crawl(&search_url(&server), 1)
        .await
        .expect("Crawl failed");

    assert_eq!(result.len(), 1);
    assert_eq!(result.records[0].status, RecordStatus::Complete);

    let pool = orchestrator.fetcher().proxy_pool();
    assert_eq!(pool.enabled_count(), 0);
    assert!(pool.records().iter().all(|r| r.disabled));
}

#[tokio::test]
async fn test_search_page_exhaustion_reports_every_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jobs/search"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let max_retries = 2;
    let config = create_test_config(vec![dead_proxy()], max_retries, 1);
    let err = crawl(&config, &search_url(&server), 5)
        .await
        .expect_err("Crawl should fail");

    let crawl_err = match err {
        job_harvest::HarvestError::Crawl(e) => e,
        other => panic!("Expected a crawl error, got {:?}", other),
    };
    assert!(matches!(
        crawl_err,
        CrawlError::SearchPage(FetchError::Exhausted { .. })
    ));

    let report = crawl_err.report().expect("Missing failure report");
    assert_eq!(report.attempt_count(), max_retries as usize + 1);
    assert_eq!(report.attempts[0].outcome, AttemptOutcome::ProxyError);
    let last = report.last().expect("No attempts");
    assert!(last.proxy.is_none());
    assert_eq!(last.outcome, AttemptOutcome::TransientError);
    assert_eq!(last.status, Some(503));
}

#[tokio::test]
async fn test_search_page_not_found_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jobs/search"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(vec![], 3, 1);
    let orchestrator = CrawlOrchestrator::from_config(&config).expect("Failed to build");
    let err = orchestrator
        .crawl(&search_url(&server), 5)
        .await
        .expect_err("Crawl should fail");

    assert!(matches!(
        err,
        CrawlError::SearchPage(FetchError::Fatal { .. })
    ));
    assert_eq!(err.report().map(|r| r.attempt_count()), Some(1));
}

#[tokio::test]
async fn test_empty_search_page() {
    let server = MockServer::start().await;
    mount_search(&server, &[]).await;

    let config = create_test_config(vec![], 3, 1);
    let result = crawl(&config, &search_url(&server), 25)
        .await
        .expect("Crawl failed");

    assert!(result.is_empty());
    assert!(!result.cancelled);
}

#[tokio::test]
async fn test_zero_max_num_makes_no_requests() {
    let server = MockServer::start().await;
    mount_search(&server, &[1]).await;

    let config = create_test_config(vec![], 3, 1);
    let result = crawl(&config, &search_url(&server), 0)
        .await
        .expect("Crawl failed");

    assert!(result.is_empty());
    let requests = server.received_requests().await.unwrap_or_default();
    assert!(requests.is_empty());
}

#[tokio::test]
async fn test_cancellation_returns_finished_records() {
    let server = MockServer::start().await;
    mount_search(&server, &[1, 2]).await;
    mount_detail(&server, 1, Duration::ZERO).await;
    mount_detail(&server, 2, Duration::from_secs(10)).await;

    let config = create_test_config(vec![], 1, 2);
    let orchestrator = CrawlOrchestrator::from_config(&config).expect("Failed to build");

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let result = orchestrator
        .crawl_with_cancel(&search_url(&server), -1, cancel)
        .await
        .expect("Crawl failed");

    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(result.cancelled);
    assert_eq!(result.len(), 1);
    assert_eq!(result.records[0].title, "Job 1");
    assert_eq!(result.records[0].status, RecordStatus::Complete);
}

#[tokio::test]
async fn test_crawl_from_config_file() {
    let server = MockServer::start().await;
    // Only answers when the configured identity is sent
    Mock::given(method("GET"))
        .and(path("/jobs/search"))
        .and(header("user-agent", "HarvestTest/1.0"))
        .and(header("cookie", "li_at=test"))
        .respond_with(ResponseTemplate::new(200).set_body_string(search_page(&[1, 2])))
        .mount(&server)
        .await;
    mount_detail(&server, 1, Duration::ZERO).await;
    Mock::given(method("GET"))
        .and(path("/jobs/view/2"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    write!(
        file,
        r#"
[fetcher]
max-retries = 2
jitter-min-ms = 0
jitter-max-ms = 0
backoff-min-ms = 0
backoff-max-ms = 0
min-request-interval-ms = 0

[crawler]
max-num = 1

[session]
cookie = "li_at=test"
user-agents = ["HarvestTest/1.0"]
"#
    )
    .expect("Failed to write config");

    let config = load_config(file.path()).expect("Failed to load config");
    let result = crawl(&config, &search_url(&server), config.crawler.max_num)
        .await
        .expect("Crawl failed");
    assert_eq!(result.len(), 1);
    assert_eq!(result.records[0].status, RecordStatus::Complete);
}
