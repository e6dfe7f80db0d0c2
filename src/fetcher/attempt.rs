//! Attempt bookkeeping and fetch errors

use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;

/// Classified outcome of one request attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// A complete 2xx body was received
    Success,

    /// Connection-level failure attributable to the proxy used
    ProxyError,

    /// Rate limiting, server error or timeout; worth retrying after a pause
    TransientError,

    /// Non-retryable HTTP response
    FatalError,
}

impl AttemptOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptOutcome::Success => "success",
            AttemptOutcome::ProxyError => "proxy_error",
            AttemptOutcome::TransientError => "transient_error",
            AttemptOutcome::FatalError => "fatal_error",
        }
    }
}

impl fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record of a single request attempt within one logical fetch
#[derive(Debug, Clone)]
pub struct FetchAttempt {
    /// 1-based attempt number
    pub attempt_number: u32,

    /// Proxy address used, `None` for a direct connection
    pub proxy: Option<String>,

    /// How the attempt ended
    pub outcome: AttemptOutcome,

    /// HTTP status, when a response was received
    pub status: Option<u16>,

    /// Human-readable detail (error message or status line)
    pub detail: String,

    /// When the attempt finished
    pub timestamp: DateTime<Utc>,
}

impl FetchAttempt {
    /// Endpoint label for logs and reports
    pub fn endpoint(&self) -> &str {
        self.proxy.as_deref().unwrap_or("direct")
    }
}

/// Diagnostic trail of every attempt made for one URL
#[derive(Debug, Clone, Default)]
pub struct FailureReport {
    pub url: String,
    pub attempts: Vec<FetchAttempt>,
}

impl FailureReport {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            attempts: Vec::new(),
        }
    }

    /// Number of attempts made
    pub fn attempt_count(&self) -> usize {
        self.attempts.len()
    }

    /// The last attempt, if any
    pub fn last(&self) -> Option<&FetchAttempt> {
        self.attempts.last()
    }

    pub(crate) fn push(
        &mut self,
        proxy: Option<&str>,
        outcome: AttemptOutcome,
        status: Option<u16>,
        detail: impl Into<String>,
    ) {
        let attempt = FetchAttempt {
            attempt_number: self.attempts.len() as u32 + 1,
            proxy: proxy.map(str::to_string),
            outcome,
            status,
            detail: detail.into(),
            timestamp: Utc::now(),
        };
        self.attempts.push(attempt);
    }
}

impl fmt::Display for FailureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} attempt(s) for {}", self.attempts.len(), self.url)?;
        for attempt in &self.attempts {
            write!(
                f,
                "\n  #{} [{}] via {}: {} ({})",
                attempt.attempt_number,
                attempt.timestamp.to_rfc3339(),
                attempt.endpoint(),
                attempt.outcome,
                attempt.detail
            )?;
        }
        Ok(())
    }
}

/// Failure of one logical fetch
///
/// Every variant that made network attempts carries the full attempt trail.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Non-retryable response for {url}: {reason}")]
    Fatal {
        url: String,
        reason: String,
        report: FailureReport,
    },

    #[error("All attempts exhausted: {report}")]
    Exhausted { report: FailureReport },

    #[error("Fetch of {url} cancelled")]
    Cancelled { url: String, report: FailureReport },

    #[error("Invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
}

impl FetchError {
    /// The attempt trail, if any attempts were made
    pub fn report(&self) -> Option<&FailureReport> {
        match self {
            FetchError::Fatal { report, .. }
            | FetchError::Exhausted { report }
            | FetchError::Cancelled { report, .. } => Some(report),
            FetchError::InvalidUrl { .. } => None,
        }
    }

    /// HTTP status of the last response received, if any
    pub fn status(&self) -> Option<u16> {
        self.report().and_then(|r| r.last()).and_then(|a| a.status)
    }

    /// Returns whether the fetch was aborted by a cancellation signal
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FetchError::Cancelled { .. })
    }
}
