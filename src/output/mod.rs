//! Output module for crawl reports
//!
//! This module handles rendering finished crawls for people: a markdown
//! report with run information, status counts and the listings themselves.

mod markdown;

pub use markdown::{format_markdown_report, write_markdown_report};

use crate::crawler::CrawlResult;
use chrono::{DateTime, Utc};

/// A finished crawl together with the run information shown in reports
#[derive(Debug, Clone)]
pub struct CrawlReport<'a> {
    pub search_url: &'a str,
    pub generated_at: DateTime<Utc>,
    pub config_hash: Option<&'a str>,
    pub result: &'a CrawlResult,
}

impl<'a> CrawlReport<'a> {
    /// A report stamped with the current time
    pub fn new(search_url: &'a str, result: &'a CrawlResult) -> Self {
        Self {
            search_url,
            generated_at: Utc::now(),
            config_hash: None,
            result,
        }
    }

    pub fn with_config_hash(mut self, hash: &'a str) -> Self {
        self.config_hash = Some(hash);
        self
    }
}
