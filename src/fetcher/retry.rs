//! Retrying fetcher implementation
//!
//! One logical fetch runs the state machine
//! `SELECT_ENDPOINT -> SEND -> (SUCCESS | PROXY_FAIL | TRANSIENT_FAIL | FATAL_FAIL)`
//! until it succeeds, hits a fatal response, or runs out of attempts.
//!
//! # Retry Logic
//!
//! | Condition | Action |
//! |-----------|--------|
//! | HTTP 2xx, body read | Return document, report proxy success |
//! | Connect error via proxy, HTTP 407 | Report proxy failure, retry immediately |
//! | HTTP 408 / 429 / 5xx, timeout | Report proxy failure, back off, retry |
//! | Direct connect error, body read error | Back off, retry |
//! | Other HTTP 4xx, redirect loop | Abort |
//! | Attempts exhausted with proxies configured | One final direct attempt |

use crate::config::{Config, FetcherConfig, SessionConfig};
use crate::fetcher::attempt::{AttemptOutcome, FailureReport, FetchError};
use crate::fetcher::client::{build_direct_client, build_proxied_client};
use crate::fetcher::identity::Identity;
use crate::fetcher::throttle::Throttle;
use crate::proxy::{ProxyHandle, ProxyPool};
use crate::HarvestError;
use reqwest::header::USER_AGENT;
use reqwest::{Client, RequestBuilder, StatusCode};
use tokio_util::sync::CancellationToken;
use url::Url;

/// A fully retrieved response body
#[derive(Debug, Clone)]
pub struct Document {
    /// Final URL after redirects
    pub url: String,

    /// HTTP status code
    pub status: u16,

    /// Complete response body
    pub body: String,
}

/// Result of sending one request
enum Sent {
    Success(Document),
    Failed {
        outcome: AttemptOutcome,
        status: Option<u16>,
        detail: String,
    },
}

/// What the retry loop should do after an attempt
enum Step {
    Done(Document),
    Retry { backoff: bool },
}

/// HTTP fetcher with retry, backoff, proxy rotation and header rotation
///
/// Owns the proxy pool and the shared throttle; wrap it in an `Arc` to share
/// it between concurrent workers.
#[derive(Debug)]
pub struct RetryingFetcher {
    pool: ProxyPool,
    /// One client per proxy, indexed like the pool
    proxy_clients: Vec<Client>,
    direct: Client,
    identity: Identity,
    throttle: Throttle,
    max_retries: u32,
}

impl RetryingFetcher {
    /// Creates a fetcher
    ///
    /// # Arguments
    ///
    /// * `config` - Retry, timeout and pacing settings
    /// * `session` - Cookie, user agents and extra headers
    /// * `proxies` - Proxy endpoints; empty for direct connections only
    ///
    /// # Returns
    ///
    /// * `Ok(RetryingFetcher)` - Fetcher ready to use
    /// * `Err(HarvestError)` - A proxy address was invalid or a client failed to build
    pub fn new(
        config: &FetcherConfig,
        session: &SessionConfig,
        proxies: &[String],
    ) -> Result<Self, HarvestError> {
        let proxy_clients = proxies
            .iter()
            .map(|p| build_proxied_client(config, p))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            pool: ProxyPool::new(proxies.iter().cloned(), config.proxy_failure_threshold),
            proxy_clients,
            direct: build_direct_client(config)?,
            identity: Identity::new(session),
            throttle: Throttle::new(config),
            max_retries: config.max_retries.max(1),
        })
    }

    /// Creates a fetcher from a full configuration
    pub fn from_config(config: &Config) -> Result<Self, HarvestError> {
        Self::new(&config.fetcher, &config.session, &config.proxies)
    }

    /// The proxy pool and its health state
    pub fn proxy_pool(&self) -> &ProxyPool {
        &self.pool
    }

    /// Attempts per fetch, excluding the direct fallback
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Checks one proxy with the session identity and records the outcome
    ///
    /// Uses the proxy's own client, so the check shares the crawl's timeouts,
    /// cookie, headers and user-agent rotation.
    pub async fn check_proxy(&self, handle: &ProxyHandle, check_url: &str) -> bool {
        let Some(client) = self.proxy_clients.get(handle.index) else {
            return false;
        };
        self.pool
            .health_check(handle, self.request(client, check_url))
            .await
    }

    /// Fetches a URL, retrying until success, a fatal response, or exhaustion
    pub async fn fetch(&self, url: &str) -> Result<Document, FetchError> {
        self.fetch_with_cancel(url, &CancellationToken::new()).await
    }

    /// Fetches a URL, aborting as soon as `cancel` fires
    ///
    /// Either a complete document or an error is returned; a partially read
    /// body is never exposed.
    pub async fn fetch_with_cancel(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<Document, FetchError> {
        let target = Url::parse(url).map_err(|source| FetchError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        let mut report = FailureReport::new(url);
        let has_fallback = !self.pool.is_empty();

        for attempt in 1..=self.max_retries {
            let proxy = self.pool.next();

            match self.attempt(&target, proxy.as_ref(), cancel, &mut report).await? {
                Step::Done(document) => return Ok(document),
                Step::Retry { backoff } => {
                    let more_attempts = attempt < self.max_retries || has_fallback;
                    if backoff && more_attempts {
                        self.backoff(url, cancel, &mut report).await?;
                    }
                }
            }
        }

        if has_fallback {
            tracing::info!(
                "Retries exhausted for {}, trying one direct connection",
                url
            );
            if let Step::Done(document) = self.attempt(&target, None, cancel, &mut report).await? {
                return Ok(document);
            }
        }

        tracing::warn!("Giving up on {}: {}", url, report);
        Err(FetchError::Exhausted { report })
    }

    /// Runs one attempt and maps its outcome onto the next step
    async fn attempt(
        &self,
        url: &Url,
        proxy: Option<&ProxyHandle>,
        cancel: &CancellationToken,
        report: &mut FailureReport,
    ) -> Result<Step, FetchError> {
        let endpoint = proxy.map(ProxyHandle::address);

        if cancel.is_cancelled() {
            return Err(cancelled(report));
        }

        tokio::select! {
            _ = self.throttle.wait() => {},
            _ = cancel.cancelled() => return Err(cancelled(report)),
        }

        let sent = tokio::select! {
            sent = self.send(url, proxy) => sent,
            _ = cancel.cancelled() => return Err(cancelled(report)),
        };

        match sent {
            Sent::Success(document) => {
                if let Some(handle) = proxy {
                    self.pool.report_success(handle);
                }
                report.push(endpoint, AttemptOutcome::Success, Some(document.status), "ok");
                tracing::debug!(
                    "Fetched {} via {} (attempt {})",
                    url,
                    endpoint.unwrap_or("direct"),
                    report.attempt_count()
                );
                Ok(Step::Done(document))
            }
            Sent::Failed {
                outcome,
                status,
                detail,
            } => {
                tracing::debug!(
                    "Attempt {} for {} via {} failed: {} ({})",
                    report.attempt_count() + 1,
                    url,
                    endpoint.unwrap_or("direct"),
                    outcome,
                    detail
                );
                report.push(endpoint, outcome, status, detail.clone());

                match outcome {
                    AttemptOutcome::FatalError => Err(FetchError::Fatal {
                        url: report.url.clone(),
                        reason: detail,
                        report: std::mem::take(report),
                    }),
                    AttemptOutcome::ProxyError => {
                        if let Some(handle) = proxy {
                            self.pool.report_failure(handle);
                        }
                        Ok(Step::Retry { backoff: false })
                    }
                    _ => {
                        if let Some(handle) = proxy {
                            self.pool.report_failure(handle);
                        }
                        Ok(Step::Retry { backoff: true })
                    }
                }
            }
        }
    }

    async fn backoff(
        &self,
        url: &str,
        cancel: &CancellationToken,
        report: &mut FailureReport,
    ) -> Result<(), FetchError> {
        let delay = self.throttle.backoff_delay();
        if delay.is_zero() {
            return Ok(());
        }

        tracing::info!("Backing off {:?} before retrying {}", delay, url);
        tokio::select! {
            _ = tokio::time::sleep(delay) => Ok(()),
            _ = cancel.cancelled() => Err(cancelled(report)),
        }
    }

    /// Sends one GET request and reads the whole body
    async fn send(&self, url: &Url, proxy: Option<&ProxyHandle>) -> Sent {
        let client = match proxy {
            Some(handle) => &self.proxy_clients[handle.index],
            None => &self.direct,
        };

        let response = match self.request(client, url.as_str()).send().await {
            Ok(response) => response,
            Err(e) => return classify_error(&e, proxy.is_some()),
        };

        let status = response.status();
        if !status.is_success() {
            return classify_status(status, proxy.is_some());
        }

        let final_url = response.url().to_string();
        match response.text().await {
            Ok(body) => Sent::Success(Document {
                url: final_url,
                status: status.as_u16(),
                body,
            }),
            Err(e) => Sent::Failed {
                outcome: AttemptOutcome::TransientError,
                status: Some(status.as_u16()),
                detail: format!("Body read failed: {}", e),
            },
        }
    }

    /// Builds a GET carrying the session headers and the next user agent
    fn request(&self, client: &Client, url: &str) -> RequestBuilder {
        let request = client.get(url).headers(self.identity.headers().clone());
        match self.identity.next_user_agent() {
            Some(user_agent) => request.header(USER_AGENT, user_agent),
            None => request,
        }
    }
}

fn cancelled(report: &mut FailureReport) -> FetchError {
    FetchError::Cancelled {
        url: report.url.clone(),
        report: std::mem::take(report),
    }
}

/// Maps a non-success HTTP status onto an attempt outcome
fn classify_status(status: StatusCode, proxied: bool) -> Sent {
    let outcome = match status {
        StatusCode::PROXY_AUTHENTICATION_REQUIRED if proxied => AttemptOutcome::ProxyError,
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
            AttemptOutcome::TransientError
        }
        s if s.is_server_error() => AttemptOutcome::TransientError,
        _ => AttemptOutcome::FatalError,
    };

    Sent::Failed {
        outcome,
        status: Some(status.as_u16()),
        detail: format!("HTTP {}", status.as_u16()),
    }
}

/// Maps a transport error onto an attempt outcome
fn classify_error(error: &reqwest::Error, proxied: bool) -> Sent {
    let outcome = if error.is_timeout() {
        AttemptOutcome::TransientError
    } else if error.is_redirect() {
        AttemptOutcome::FatalError
    } else if proxied && (error.is_connect() || error.is_request()) {
        AttemptOutcome::ProxyError
    } else {
        AttemptOutcome::TransientError
    };

    let detail = if error.is_timeout() {
        "Request timeout".to_string()
    } else if error.is_connect() {
        format!("Connection failed: {}", error)
    } else {
        error.to_string()
    };

    Sent::Failed {
        outcome,
        status: error.status().map(|s| s.as_u16()),
        detail,
    }
}
