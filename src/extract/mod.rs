//! Listing extraction from raw HTML
//!
//! Extraction is a pure function of its input: it never performs I/O and never
//! fails. Missing data degrades to sentinel values field by field, and a card
//! that cannot be read at all still yields a record so positions stay aligned
//! with the source page.

mod linkedin;
mod record;

pub use linkedin::LinkedInExtractor;
pub use record::{is_value, ListingRecord, RecordStatus, EXTRACTION_ERROR, NOT_SPECIFIED};

use url::Url;

/// Capability to turn a job source's markup into listing records
///
/// Implementations are source-specific (selectors are brittle and change per
/// site); callers depend only on this trait.
pub trait ListingExtractor: Send + Sync {
    /// Splits a search-results document into raw cards, in page order
    fn extract_cards(&self, document: &str) -> Vec<String>;

    /// Extracts the summary fields of one card
    ///
    /// # Arguments
    ///
    /// * `card` - Raw markup of one card, as returned by `extract_cards`
    /// * `base` - Final URL of the search page, for resolving relative links
    ///
    /// # Returns
    ///
    /// A `Partial` record, or an `ExtractionFailed` record if the card is unreadable
    fn extract_summary(&self, card: &str, base: &Url) -> ListingRecord;

    /// Extracts the full description from a detail page
    ///
    /// Returns [`NOT_SPECIFIED`] when no description can be found.
    fn extract_detail(&self, document: &str) -> String;
}
